//! Client for the on-page crawling/auditing service.
//!
//! Submission creates a remote crawl task and hands back its id; the status
//! endpoint is then read once per poll by [`crate::poller::TaskPoller`].

use crate::error::{AuditError, Result};
use crate::http_client::build_http_client;
use crate::models::{AnalysisMode, AnalysisTask, OnPageSummary};
use crate::poller::TaskStatusSource;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// API-level success code carried in every response envelope
pub const STATUS_OK: u64 = 20000;

/// Task-level codes at or above this value mean the task was rejected
const TASK_ERROR_THRESHOLD: u64 = 40000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPostRequest {
    pub target: String,
    pub max_crawl_pages: u64,
    pub load_resources: bool,
    pub enable_javascript: bool,
}

impl TaskPostRequest {
    pub fn new(target: &str, max_crawl_pages: u64, mode: AnalysisMode) -> Self {
        let advanced = mode == AnalysisMode::Advanced;
        Self {
            target: target.to_string(),
            max_crawl_pages,
            load_resources: advanced,
            enable_javascript: advanced,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status_code: u64,
    status_message: Option<String>,
    tasks: Option<Vec<ApiTask<T>>>,
}

#[derive(Debug, Deserialize)]
struct ApiTask<T> {
    id: Option<String>,
    status_code: Option<u64>,
    status_message: Option<String>,
    result: Option<Vec<T>>,
}

pub struct OnPageClient {
    client: reqwest::Client,
    base_url: String,
    login: String,
    password: String,
}

impl OnPageClient {
    pub fn new(base_url: &str, login: &str, password: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            login: login.to_string(),
            password: password.to_string(),
        })
    }

    /// Submits one crawl task. Never retried: any failure is returned as
    /// [`AuditError::TaskCreation`] straight away.
    pub async fn submit_task(
        &self,
        target: &str,
        max_crawl_pages: u64,
        mode: AnalysisMode,
    ) -> Result<AnalysisTask> {
        let url = format!("{}/on_page/task_post", self.base_url);
        let body = vec![TaskPostRequest::new(target, max_crawl_pages, mode)];

        let creation_error = |status_code: Option<u64>, message: String| AuditError::TaskCreation {
            status_code,
            message,
        };

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.login, Some(&self.password))
            .json(&body)
            .send()
            .await
            .map_err(|e| creation_error(None, e.to_string()))?;

        let api_resp: ApiResponse<serde_json::Value> = read_envelope(resp)
            .await
            .map_err(|message| creation_error(None, message))?;

        if api_resp.status_code != STATUS_OK {
            return Err(creation_error(
                Some(api_resp.status_code),
                api_resp
                    .status_message
                    .unwrap_or_else(|| format!("status code {}", api_resp.status_code)),
            ));
        }

        let task = api_resp
            .tasks
            .and_then(|tasks| tasks.into_iter().next())
            .ok_or_else(|| {
                creation_error(
                    Some(api_resp.status_code),
                    "response did not include a task".to_string(),
                )
            })?;

        if let Some(code) = task.status_code
            && code >= TASK_ERROR_THRESHOLD
        {
            return Err(creation_error(
                Some(code),
                task.status_message
                    .unwrap_or_else(|| format!("task status code {}", code)),
            ));
        }

        let id = task.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            creation_error(
                Some(api_resp.status_code),
                "response did not include a task id".to_string(),
            )
        })?;

        tracing::info!(task_id = %id, crawl_target = target, max_crawl_pages, "On-page task created");

        Ok(AnalysisTask::new(id, target, max_crawl_pages))
    }

    /// Reads the task summary once. `Ok(None)` means the service has no
    /// result for the task yet.
    pub async fn read_summary(&self, task_id: &str) -> Result<Option<OnPageSummary>> {
        let url = format!("{}/on_page/summary/{}", self.base_url, task_id);

        let poll_error = |message: String| AuditError::TaskPoll {
            task_id: task_id.to_string(),
            message,
        };

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.login, Some(&self.password))
            .send()
            .await
            .map_err(|e| poll_error(e.to_string()))?;

        let api_resp: ApiResponse<OnPageSummary> = read_envelope(resp).await.map_err(poll_error)?;

        if api_resp.status_code != STATUS_OK {
            return Err(poll_error(
                api_resp
                    .status_message
                    .unwrap_or_else(|| format!("status code {}", api_resp.status_code)),
            ));
        }

        let summary = api_resp
            .tasks
            .and_then(|tasks| tasks.into_iter().next())
            .and_then(|task| task.result)
            .and_then(|result| result.into_iter().next());

        Ok(summary)
    }
}

impl TaskStatusSource for OnPageClient {
    async fn fetch_status(&self, task_id: &str) -> Result<Option<OnPageSummary>> {
        self.read_summary(task_id).await
    }
}

/// Decodes the JSON envelope, turning HTTP failures into a readable message.
/// Error bodies that are themselves envelopes contribute their status message.
async fn read_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> std::result::Result<ApiResponse<T>, String> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| e.to_string())?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.status_message)
            .unwrap_or(body);
        return Err(format!("HTTP {}: {}", status.as_u16(), detail));
    }

    serde_json::from_str(&body).map_err(|e| format!("malformed response: {}", e))
}
