use http::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{LoginRequest, LoginResponse, User};

impl ApiClient {
    /// Exchange credentials for a bearer token.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.send_json(
            Method::POST,
            "/auth/login",
            &LoginRequest { username, password },
        )
        .await
    }

    /// The user the current token belongs to.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get("/auth/me").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Role;

    #[test]
    fn test_login_request_body() {
        let body = serde_json::to_string(&LoginRequest {
            username: "ana",
            password: "s3cret",
        })
        .unwrap();
        assert_eq!(body, r#"{"username":"ana","password":"s3cret"}"#);
    }

    #[test]
    fn test_login_response_decodes() {
        let json = r#"{"token":"abc","user":{"username":"ana","role":"admin"}}"#;
        let response: LoginResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token, "abc");
        assert_eq!(response.user.role, Role::Admin);
    }
}
