use http::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::Score;
use crate::access::{Capability, Permit};

impl ApiClient {
    pub async fn get_score(&self, id: u64) -> Result<Score, ApiError> {
        self.get(&format!("/scores/{}", id)).await
    }

    pub async fn create_score(&self, permit: &Permit, score: &Score) -> Result<Score, ApiError> {
        permit.require(Capability::RecordScores)?;
        self.send_json(Method::POST, "/scores", score).await
    }

    pub async fn update_score(&self, permit: &Permit, id: u64, score: &Score) -> Result<Score, ApiError> {
        permit.require(Capability::RecordScores)?;
        self.send_json(Method::PUT, &format!("/scores/{}", id), score).await
    }

    /// Deleting a score is a match-management action.
    pub async fn delete_score(&self, permit: &Permit, id: u64) -> Result<(), ApiError> {
        permit.require(Capability::ManageMatches)?;
        self.delete(&format!("/scores/{}", id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessError;
    use crate::api::client::offline_client_and_permit;
    use crate::api::types::{Role, Stage};

    fn score() -> Score {
        Score {
            id: None,
            shooter_id: 9,
            match_id: 3,
            match_type_instance: "NMC .22".to_string(),
            caliber: "TWENTYTWO".to_string(),
            stages: vec![Stage::fired("SF", 95, 2)],
        }
    }

    #[tokio::test]
    async fn test_reporter_records_but_cannot_delete() {
        let (client, permit) = offline_client_and_permit(Role::Reporter, Capability::RecordScores);
        let created = client.create_score(&permit, &score()).await;
        assert!(matches!(created, Err(ApiError::Network(_))));
        let deleted = client.delete_score(&permit, 40).await;
        assert!(matches!(
            deleted,
            Err(ApiError::Access(AccessError::Denied {
                capability: Capability::ManageMatches,
                ..
            }))
        ));
    }
}
