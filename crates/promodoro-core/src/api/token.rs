//! Bearer-token storage in the OS keyring.
//!
//! The server issues a JWT on login; it lives in the platform credential
//! store, never in the config file.

use keyring::Entry;

use crate::error::ApiError;

const SERVICE: &str = "promodoro";
const ACCOUNT: &str = "api_token";

fn entry() -> Result<Entry, ApiError> {
    Entry::new(SERVICE, ACCOUNT).map_err(|e| ApiError::Keyring(e.to_string()))
}

pub fn store_token(token: &str) -> Result<(), ApiError> {
    entry()?
        .set_password(token)
        .map_err(|e| ApiError::Keyring(e.to_string()))
}

/// Load the stored token. `None` when not logged in or when the keyring is
/// unavailable -- callers treat both the same way.
pub fn load_token() -> Option<String> {
    entry().ok()?.get_password().ok()
}

pub fn clear_token() -> Result<(), ApiError> {
    match entry()?.delete_credential() {
        Ok(()) => Ok(()),
        // Logging out twice is fine.
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(ApiError::Keyring(e.to_string())),
    }
}
