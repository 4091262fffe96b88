//! HTTP client for the Promodoro REST backend.
//!
//! The timer core treats these calls as external collaborators: the
//! preference fetch is one-shot with a local fallback, the task list is
//! advisory, and the productive-time upload is fire-and-forget. None of
//! their failures ever re-enter the state machine.

mod token;
mod types;

pub use token::{clear_token, load_token, store_token};
pub use types::{LoginResponse, PreferencesDto, Task};

use serde_json::json;
use url::Url;

use crate::error::ApiError;
use crate::preferences::Preferences;

/// Client for the Promodoro server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            message: e.to_string(),
        })
    }

    fn bearer(&self) -> Result<&str, ApiError> {
        self.token.as_deref().ok_or(ApiError::NotAuthenticated)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let url = self.endpoint("/api/auth/login")?;
        let response = self
            .http
            .post(url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: LoginResponse = response.json().await?;
        Ok(body.token)
    }

    /// Fetch the user's timer preferences. Called once per engine startup;
    /// on failure the caller falls back to local defaults.
    pub async fn fetch_preferences(&self) -> Result<Preferences, ApiError> {
        let url = self.endpoint("/api/preferences")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        let response = check_status(response).await?;
        let dto: PreferencesDto = response.json().await?;
        Ok(dto.into())
    }

    /// Fetch the user's tasks, used to validate the stored task selection.
    pub async fn fetch_tasks(&self) -> Result<Vec<Task>, ApiError> {
        let url = self.endpoint("/api/tasks")?;
        let response = self
            .http
            .get(url)
            .bearer_auth(self.bearer()?)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Accumulate productive seconds into a project's tracked time.
    /// Dispatched fire-and-forget; the caller logs and drops any error.
    pub async fn log_project_time(&self, project_id: &str, seconds: u64) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/projects/{project_id}/time"))?;
        let response = self
            .http
            .patch(url)
            .bearer_auth(self.bearer()?)
            .json(&json!({ "seconds": seconds }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}
