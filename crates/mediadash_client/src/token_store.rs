use std::sync::Arc;

use client_logging::client_warn;

use crate::storage::{MemoryStorage, Storage, StorageError};
use crate::{Credentials, User, UserPatch};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Stored credentials; either half may be missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl std::fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |token: &Option<String>| token.as_deref().map(client_logging::redact_token);
        f.debug_struct("StoredCredentials")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Session persistence: the token pair and the signed-in user.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn set_credentials(&self, credentials: &Credentials) -> Result<(), StorageError> {
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, Some(credentials.access_token.as_str())),
            (REFRESH_TOKEN_KEY, Some(credentials.refresh_token.as_str())),
        ])
    }

    /// Stores credentials and user together, as after a login.
    pub fn set_session(&self, credentials: &Credentials, user: &User) -> Result<(), StorageError> {
        let user_json = encode_user(user)?;
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, Some(credentials.access_token.as_str())),
            (REFRESH_TOKEN_KEY, Some(credentials.refresh_token.as_str())),
            (USER_KEY, Some(user_json.as_str())),
        ])
    }

    pub fn credentials(&self) -> StoredCredentials {
        StoredCredentials {
            access_token: self.access_token(),
            refresh_token: self.refresh_token(),
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_user(&self, user: &User) -> Result<(), StorageError> {
        let user_json = encode_user(user)?;
        self.storage.set(USER_KEY, &user_json)
    }

    /// The stored user, or `None` when absent or unreadable.
    pub fn user(&self) -> Option<User> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                client_warn!("Ignoring unreadable stored user record: {}", err);
                None
            }
        }
    }

    /// Merges `patch` into the stored user. Returns `None` when no user is stored.
    pub fn update_user(&self, patch: UserPatch) -> Result<Option<User>, StorageError> {
        let Some(mut user) = self.user() else {
            return Ok(None);
        };
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(user_name) = patch.user_name {
            user.user_name = user_name;
        }
        self.set_user(&user)?;
        Ok(Some(user))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.apply(&[
            (ACCESS_TOKEN_KEY, None),
            (REFRESH_TOKEN_KEY, None),
            (USER_KEY, None),
        ])
    }
}

fn encode_user(user: &User) -> Result<String, StorageError> {
    serde_json::to_string(user).map_err(|err| StorageError::Encode(err.to_string()))
}
