use std::sync::atomic::{AtomicBool, Ordering};

use client_logging::client_warn;
use mediadash_client::{ApiError, SessionObserver};

pub const SESSION_EXPIRED_NOTICE: &str =
    "Session expired. Run `mediadash login` to sign in again.";

/// Tells the user, once per run, that the stored session is gone.
#[derive(Default)]
pub struct ExpiryNotice {
    shown: AtomicBool,
}

impl SessionObserver for ExpiryNotice {
    fn session_expired(&self, error: &ApiError) {
        client_warn!("Session expired: {}", error);
        if !self.shown.swap(true, Ordering::SeqCst) {
            eprintln!("{SESSION_EXPIRED_NOTICE}");
        }
    }
}
