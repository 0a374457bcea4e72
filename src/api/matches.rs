use http::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{Match, MatchInput, Score};
use crate::access::{Capability, Permit};

impl ApiClient {
    pub async fn list_matches(&self) -> Result<Vec<Match>, ApiError> {
        self.get("/matches").await
    }

    /// A match with its match type configurations.
    pub async fn get_match(&self, id: u64) -> Result<Match, ApiError> {
        self.get(&format!("/matches/{}", id)).await
    }

    pub async fn list_match_scores(&self, match_id: u64) -> Result<Vec<Score>, ApiError> {
        self.get(&format!("/matches/{}/scores", match_id)).await
    }

    pub async fn create_match(&self, permit: &Permit, input: &MatchInput) -> Result<Match, ApiError> {
        permit.require(Capability::ManageMatches)?;
        self.send_json(Method::POST, "/matches", input).await
    }

    pub async fn update_match(&self, permit: &Permit, id: u64, input: &MatchInput) -> Result<Match, ApiError> {
        permit.require(Capability::ManageMatches)?;
        self.send_json(Method::PUT, &format!("/matches/{}", id), input).await
    }

    pub async fn delete_match(&self, permit: &Permit, id: u64) -> Result<(), ApiError> {
        permit.require(Capability::ManageMatches)?;
        self.delete(&format!("/matches/{}", id)).await
    }
}
