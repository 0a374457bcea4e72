use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::types::{Role, User};

pub const SESSION_VERSION: u32 = 1;

/// Who is logged in, against which server. The token itself lives in the
/// keyring, never in this file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub username: String,
    pub role: Role,
    pub api_url: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(username: String, role: Role, api_url: String) -> Self {
        Self {
            version: SESSION_VERSION,
            username,
            role,
            api_url,
            logged_in_at: Utc::now(),
        }
    }

    pub fn from_user(user: User, api_url: &str) -> Self {
        Self::new(user.username, user.role, api_url.to_string())
    }

    /// Sessions are tied to the server they were created against; a config
    /// pointing elsewhere needs a new login.
    pub fn is_for(&self, api_url: &str) -> bool {
        self.api_url.trim_end_matches('/') == api_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let s = Session::new("ana".to_string(), Role::Admin, "http://x/api".to_string());
        assert_eq!(s.version, SESSION_VERSION);
        assert_eq!(s.role, Role::Admin);
    }

    #[test]
    fn test_is_for_ignores_trailing_slash() {
        let s = Session::new("ana".to_string(), Role::Admin, "http://x/api/".to_string());
        assert!(s.is_for("http://x/api"));
        assert!(!s.is_for("http://y/api"));
    }

    #[test]
    fn test_from_user() {
        let user = User {
            username: "bo".to_string(),
            role: Role::Reporter,
        };
        let s = Session::from_user(user, "http://x/api");
        assert_eq!(s.username, "bo");
        assert_eq!(s.api_url, "http://x/api");
    }
}
