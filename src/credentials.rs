//! API key lookup and storage.
//!
//! The key is looked up, in order, from the `DILLY_API_KEY` and
//! `OPENAI_API_KEY` environment variables, the system credential store
//! (service `dilly-ai`), and finally the `api_key` field of the settings file.
//! Empty values count as absent.

use crate::config::Settings;
use thiserror::Error;

pub const KEYRING_SERVICE: &str = "dilly-ai";
const KEYRING_USER: &str = "apiKey";

/// Environment variables checked for an API key, highest priority first.
pub const API_KEY_ENV_VARS: &[&str] = &["DILLY_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("API key is empty")]
    EmptyKey,
    #[error("credential store error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Find the API key from environment, keyring or settings.
pub fn lookup_api_key(settings: &Settings) -> Option<String> {
    lookup_api_key_with(|name| std::env::var(name).ok(), read_from_keyring, settings)
}

/// Lookup with injectable sources.
fn lookup_api_key_with(
    env: impl Fn(&str) -> Option<String>,
    keyring: impl FnOnce() -> Option<String>,
    settings: &Settings,
) -> Option<String> {
    let non_empty = |v: String| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    for &name in API_KEY_ENV_VARS {
        if let Some(key) = env(name).and_then(non_empty) {
            tracing::debug!(source = name, "using API key from environment");
            return Some(key);
        }
    }

    if let Some(key) = keyring().and_then(non_empty) {
        tracing::debug!(source = "keyring", "using API key from credential store");
        return Some(key);
    }

    let key = settings.api_key.clone().and_then(non_empty);
    if key.is_some() {
        tracing::debug!(source = "settings", "using API key from settings file");
    }
    key
}

fn keyring_entry() -> Result<keyring::Entry, CredentialError> {
    Ok(keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?)
}

/// Read the key from the credential store. Missing entries and store
/// failures both read as "no key"; failures are logged.
fn read_from_keyring() -> Option<String> {
    let entry = match keyring_entry() {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!("credential store unavailable: {e}");
            return None;
        }
    };
    match entry.get_password() {
        Ok(key) => Some(key),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            tracing::warn!("failed to read API key from credential store: {e}");
            None
        }
    }
}

/// Save the key in the system credential store.
pub fn store_api_key(key: &str) -> Result<(), CredentialError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CredentialError::EmptyKey);
    }
    keyring_entry()?.set_password(key)?;
    Ok(())
}

/// Remove the key from the credential store. Missing entry is not an error.
pub fn delete_api_key() -> Result<(), CredentialError> {
    match keyring_entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
