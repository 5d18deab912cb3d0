//! REST collaborators backed by reqwest

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    Farm, FarmCreate, FarmsSummary, FeedbackAnswers, Field, HarvestHistoryEntry, HarvestRecord,
    Seed, UserProfile,
};

use super::{FarmCollaborator, UserCollaborator};
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Map a non-success response to the error taxonomy
async fn error_for(response: Response) -> AppError {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AppError::Unauthorized;
    }
    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return AppError::NotFound(body);
    }
    AppError::Persistence(format!("{status}: {body}"))
}

async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
    if !response.status().is_success() {
        return Err(error_for(response).await);
    }
    Ok(response.json().await?)
}

async fn expect_success(response: Response) -> AppResult<()> {
    if !response.status().is_success() {
        return Err(error_for(response).await);
    }
    Ok(())
}

/// REST client for the farm and user endpoints
pub struct HttpBackend {
    client: reqwest::Client,
    base_uri: String,
}

impl HttpBackend {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_uri: base_uri.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend.base_uri.clone())
    }
}

impl FarmCollaborator for HttpBackend {
    async fn list_farms(&self, user_id: &str) -> AppResult<Vec<Farm>> {
        let url = format!("{}/farms", self.base_uri);
        let response = self
            .client
            .get(&url)
            .query(&[("user", user_id)])
            .send()
            .await?;
        read_json(response).await
    }

    async fn create_farm(&self, farm: &FarmCreate) -> AppResult<Farm> {
        let url = format!("{}/farms", self.base_uri);
        let response = self.client.post(&url).json(farm).send().await?;
        read_json(response).await
    }

    async fn update_field(&self, farm_id: &str, field: &Field) -> AppResult<Farm> {
        let url = format!("{}/farms/{}/fields/{}", self.base_uri, farm_id, field.id);
        let response = self.client.put(&url).json(field).send().await?;
        read_json(response).await
    }

    async fn list_seeds(&self) -> AppResult<Vec<Seed>> {
        let url = format!("{}/seeds", self.base_uri);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    async fn record_harvest(
        &self,
        farm_id: &str,
        field_id: u32,
        record: &HarvestRecord,
    ) -> AppResult<()> {
        let url = format!(
            "{}/farms/{}/fields/{}/harvest",
            self.base_uri, farm_id, field_id
        );
        let response = self.client.post(&url).json(record).send().await?;
        expect_success(response).await
    }

    async fn get_harvest_history(&self, farm_id: &str) -> AppResult<Vec<HarvestHistoryEntry>> {
        let url = format!("{}/farms/{}/harvests", self.base_uri, farm_id);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    async fn submit_feedback(
        &self,
        history_id: &str,
        answers: &FeedbackAnswers,
    ) -> AppResult<()> {
        let url = format!("{}/harvests/{}/feedback", self.base_uri, history_id);
        let response = self.client.put(&url).json(answers).send().await?;
        expect_success(response).await
    }

    async fn check_has_farms(&self, user_id: &str) -> AppResult<FarmsSummary> {
        let url = format!("{}/farms/summary", self.base_uri);
        let response = self
            .client
            .get(&url)
            .query(&[("user", user_id)])
            .send()
            .await?;
        read_json(response).await
    }
}

impl UserCollaborator for HttpBackend {
    async fn get_profile(&self) -> AppResult<UserProfile> {
        let url = format!("{}/users/me", self.base_uri);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }
}

/// REST client for the notification endpoints used by the feed gateway
pub struct NotificationApi {
    client: reqwest::Client,
    base_uri: String,
}

impl NotificationApi {
    /// `base_uri` is the backend API root; `/notifications` is appended here
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_uri: format!("{}/notifications", base_uri.into()),
        }
    }

    /// Unread alert/recommendation events for a farm, newest first
    pub async fn alert_history<E: DeserializeOwned>(&self, farm_id: &str) -> AppResult<Vec<E>> {
        let url = format!("{}/alerts/{}", self.base_uri, farm_id);
        let response = self
            .client
            .get(&url)
            .query(&[("unreadOnly", "true")])
            .send()
            .await?;
        read_json(response).await
    }

    /// Latest stored weather reading for a farm, if any
    pub async fn latest_weather<E: DeserializeOwned>(
        &self,
        farm_id: &str,
    ) -> AppResult<Option<E>> {
        let url = format!("{}/weather/latest/{}", self.base_uri, farm_id);
        let response = self.client.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        read_json(response).await.map(Some)
    }

    pub async fn mark_read(&self, entry_id: &str) -> AppResult<()> {
        let url = format!("{}/alerts/{}/read", self.base_uri, entry_id);
        let response = self.client.put(&url).send().await?;
        expect_success(response).await
    }
}
