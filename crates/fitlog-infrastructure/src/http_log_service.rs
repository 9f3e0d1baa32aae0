//! HTTP client for the remote exercise-log service.
//!
//! Implements the four verbs of `ExerciseLogService` against a
//! JSON-over-REST backend. The engine never sees reqwest types; every
//! failure is mapped to `FitlogError` here.

use async_trait::async_trait;
use fitlog_core::error::{FitlogError, Result};
use fitlog_core::log::{ExerciseLog, ExerciseLogPatch, ExerciseLogService, NewExerciseLog};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

/// Remote log service client.
#[derive(Clone)]
pub struct HttpLogService {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct CreatedLog {
    id: u64,
}

impl HttpLogService {
    /// Creates a client against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn user_logs_url(&self, user_id: &str) -> String {
        format!("{}/users/{}/exercise-logs", self.base_url, user_id)
    }

    fn logs_url(&self) -> String {
        format!("{}/exercise-logs", self.base_url)
    }

    fn log_url(&self, id: u64) -> String {
        format!("{}/exercise-logs/{}", self.base_url, id)
    }
}

#[async_trait]
impl ExerciseLogService for HttpLogService {
    async fn fetch_for_user(&self, user_id: &str) -> Result<Vec<ExerciseLog>> {
        let response = self
            .client
            .get(self.user_logs_url(user_id))
            .send()
            .await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    async fn create(&self, log: &NewExerciseLog) -> Result<u64> {
        let response = self.client.post(self.logs_url()).json(log).send().await?;
        let response = check_status(response, None).await?;
        let created: CreatedLog = response.json().await?;
        tracing::debug!("[HttpLogService] created log {}", created.id);
        Ok(created.id)
    }

    async fn update(&self, id: u64, patch: &ExerciseLogPatch) -> Result<()> {
        let response = self
            .client
            .patch(self.log_url(id))
            .json(patch)
            .send()
            .await?;
        check_status(response, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        let response = self.client.delete(self.log_url(id)).send().await?;
        check_status(response, Some(id)).await?;
        Ok(())
    }
}

/// Maps a non-success response to a `FitlogError`, consuming the body
/// for its error message. A 404 on an id-addressed route becomes
/// `NotFound` so callers can apply idempotent-delete semantics.
async fn check_status(
    response: reqwest::Response,
    id: Option<u64>,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    Err(status_error(status, &body, id))
}

fn status_error(status: StatusCode, body: &str, id: Option<u64>) -> FitlogError {
    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return FitlogError::not_found("ExerciseLog", id);
        }
    }
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .or_else(|| json.get("error"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.to_string());
    FitlogError::remote(status.as_u16(), message)
}
