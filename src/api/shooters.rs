use http::Method;

use super::client::ApiClient;
use super::error::ApiError;
use super::types::{Score, Shooter, ShooterInput};
use crate::access::{Capability, Permit};

impl ApiClient {
    pub async fn list_shooters(&self) -> Result<Vec<Shooter>, ApiError> {
        self.get("/shooters").await
    }

    pub async fn get_shooter(&self, id: u64) -> Result<Shooter, ApiError> {
        self.get(&format!("/shooters/{}", id)).await
    }

    /// Every score recorded for a shooter, across all matches.
    pub async fn list_shooter_scores(&self, shooter_id: u64) -> Result<Vec<Score>, ApiError> {
        self.get(&format!("/shooters/{}/scores", shooter_id)).await
    }

    pub async fn create_shooter(&self, permit: &Permit, input: &ShooterInput) -> Result<Shooter, ApiError> {
        permit.require(Capability::ManageShooters)?;
        self.send_json(Method::POST, "/shooters", input).await
    }

    pub async fn update_shooter(
        &self,
        permit: &Permit,
        id: u64,
        input: &ShooterInput,
    ) -> Result<Shooter, ApiError> {
        permit.require(Capability::ManageShooters)?;
        self.send_json(Method::PUT, &format!("/shooters/{}", id), input).await
    }

    pub async fn delete_shooter(&self, permit: &Permit, id: u64) -> Result<(), ApiError> {
        permit.require(Capability::ManageShooters)?;
        self.delete(&format!("/shooters/{}", id)).await
    }
}
