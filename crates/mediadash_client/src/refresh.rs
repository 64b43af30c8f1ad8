//! Single-flight coordination for access-token refreshes.
//!
//! The first request to hit a 401 becomes the leader and performs the refresh.
//! Requests that hit a 401 while the leader is working are parked as
//! [`PendingRequest`]s and resumed, in arrival order, with the leader's outcome.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use client_logging::{client_debug, client_warn};
use tokio::sync::oneshot;

use crate::{ApiError, FailureKind};

/// New access token, or the error every parked request fails with.
pub(crate) type RefreshOutcome = Result<String, ApiError>;

/// A caller suspended until the in-flight refresh settles.
pub(crate) struct PendingRequest {
    resume: Box<dyn FnOnce(RefreshOutcome) + Send>,
}

impl PendingRequest {
    pub(crate) fn new(resume: impl FnOnce(RefreshOutcome) + Send + 'static) -> Self {
        Self {
            resume: Box::new(resume),
        }
    }

    fn resume(self, outcome: RefreshOutcome) {
        (self.resume)(outcome)
    }
}

#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: VecDeque<PendingRequest>,
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

pub(crate) enum Ticket<'a> {
    /// This caller performs the refresh and must settle the lease.
    Lead(RefreshLease<'a>),
    /// A refresh is already running; await its outcome.
    Wait(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn join(&self) -> Ticket<'_> {
        let mut state = self.lock();
        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(PendingRequest::new(move |outcome| {
                // The receiver is gone if the caller was dropped meanwhile.
                let _ = tx.send(outcome);
            }));
            client_debug!(
                "Token refresh in flight; parked request (queue={})",
                state.waiters.len()
            );
            Ticket::Wait(rx)
        } else {
            state.refreshing = true;
            Ticket::Lead(RefreshLease {
                coordinator: self,
                settled: false,
            })
        }
    }

    #[cfg(test)]
    fn is_refreshing(&self) -> bool {
        self.lock().refreshing
    }

    /// Parks `pending` behind the running refresh. Hands it back when none is running.
    #[cfg(test)]
    fn park(&self, pending: PendingRequest) -> Result<(), PendingRequest> {
        let mut state = self.lock();
        if !state.refreshing {
            return Err(pending);
        }
        state.waiters.push_back(pending);
        Ok(())
    }

    fn settle(&self, outcome: RefreshOutcome) -> usize {
        let waiters = {
            let mut state = self.lock();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        let released = waiters.len();
        for waiter in waiters {
            waiter.resume(outcome.clone());
        }
        released
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Leadership of one refresh attempt.
///
/// Dropping an unsettled lease (the leader's future was cancelled) rejects the
/// parked requests instead of leaving them suspended forever.
pub(crate) struct RefreshLease<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshLease<'_> {
    /// Ends the refresh, resuming every parked request in order. Returns how many were resumed.
    pub(crate) fn settle(mut self, outcome: RefreshOutcome) -> usize {
        self.settled = true;
        self.coordinator.settle(outcome)
    }
}

impl Drop for RefreshLease<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let released = self.coordinator.settle(Err(ApiError::new(
            FailureKind::SessionExpired,
            "token refresh was abandoned",
        )));
        client_warn!("Token refresh abandoned; rejected {} parked request(s)", released);
    }
}
