pub mod prompt;

use keyring::Entry;
use std::fmt;

const SERVICE_NAME: &str = "scorebook";
const TOKEN_KEY: &str = "api-token";

/// Environment variable name for providing an API token without keyring
pub const ENV_TOKEN_VAR: &str = "SCOREBOOK_TOKEN";

pub use prompt::prompt_for_login;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Check for an API token in the SCOREBOOK_TOKEN environment variable.
/// Returns Some(token) if the env var is set and non-empty, None otherwise.
pub fn get_token_from_env() -> Option<String> {
    non_empty(std::env::var(ENV_TOKEN_VAR).ok())
}

#[derive(Debug)]
pub enum CredentialError {
    KeyringUnavailable(String),
    TokenNotFound,
    StoreFailed(String),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::KeyringUnavailable(msg) => write!(f, "Keyring unavailable: {}", msg),
            CredentialError::TokenNotFound => write!(f, "Token not found in keyring"),
            CredentialError::StoreFailed(msg) => write!(f, "Failed to store token: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

fn entry() -> Result<Entry, CredentialError> {
    Entry::new(SERVICE_NAME, TOKEN_KEY).map_err(|e| CredentialError::KeyringUnavailable(e.to_string()))
}

fn get_token_sync() -> Result<String, CredentialError> {
    entry()?.get_password().map_err(|e| match e {
        keyring::Error::NoEntry => CredentialError::TokenNotFound,
        _ => CredentialError::KeyringUnavailable(e.to_string()),
    })
}

fn store_token_sync(token: &str) -> Result<(), CredentialError> {
    entry()?
        .set_password(token)
        .map_err(|e| CredentialError::StoreFailed(e.to_string()))
}

fn delete_token_sync() -> Result<(), CredentialError> {
    match entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(CredentialError::KeyringUnavailable(e.to_string())),
    }
}

/// Retrieve the token from the system keyring.
/// Uses spawn_blocking to prevent blocking the async runtime
pub async fn get_token() -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(get_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

pub async fn store_token(token: String) -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(move || store_token_sync(&token))
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Remove the stored token. A missing token is not an error.
pub async fn delete_token() -> Result<(), CredentialError> {
    tokio::task::spawn_blocking(delete_token_sync)
        .await
        .map_err(|e| CredentialError::KeyringUnavailable(format!("Task join error: {}", e)))?
}

/// Resolve the token for API calls: the environment variable wins over the
/// keyring. An unreachable keyring is logged and treated as no token.
pub async fn resolve_token() -> Option<String> {
    if let Some(token) = get_token_from_env() {
        tracing::debug!("Using API token from {}", ENV_TOKEN_VAR);
        return Some(token);
    }
    match get_token().await {
        Ok(token) => Some(token),
        Err(CredentialError::TokenNotFound) => None,
        Err(e) => {
            tracing::warn!("{}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_trims_and_filters() {
        assert_eq!(non_empty(Some("  abc \n".to_string())), Some("abc".to_string()));
        assert_eq!(non_empty(Some("   ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn test_credential_error_display() {
        assert_eq!(
            CredentialError::TokenNotFound.to_string(),
            "Token not found in keyring"
        );
        assert_eq!(
            CredentialError::StoreFailed("locked".to_string()).to_string(),
            "Failed to store token: locked"
        );
    }

    #[tokio::test]
    async fn test_keyring_roundtrip() {
        // Headless CI machines often have no secret service; skip there.
        if store_token("test_token_12345".to_string()).await.is_err() {
            return;
        }
        if let Ok(token) = get_token().await {
            assert_eq!(token, "test_token_12345");
        }
        assert!(delete_token().await.is_ok());
        assert!(matches!(get_token().await, Err(CredentialError::TokenNotFound) | Err(CredentialError::KeyringUnavailable(_))));
    }
}
