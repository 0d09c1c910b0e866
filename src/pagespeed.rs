use crate::error::{AuditError, Result};
use crate::http_client::build_http_client;
use crate::models::{Category, LighthouseResult, Strategy};
use futures::future::try_join_all;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PageSpeedResponse {
    #[serde(rename = "lighthouseResult")]
    lighthouse_result: Option<LighthouseResult>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Client for the page-speed auditing service. One request is issued per
/// category and the answers are merged into a single lighthouse result.
pub struct SpeedAuditClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SpeedAuditClient {
    pub fn new(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(timeout_secs)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(|k| k.to_string()),
        })
    }

    /// Audits `url` for one strategy across every category. The category
    /// requests run concurrently and the first failure wins.
    pub async fn audit(&self, url: &str, strategy: Strategy) -> Result<LighthouseResult> {
        tracing::debug!(url, %strategy, "Starting speed audit");

        let results = try_join_all(
            Category::ALL
                .iter()
                .map(|category| self.audit_category(url, strategy, *category)),
        )
        .await?;

        let mut merged = LighthouseResult::default();
        for result in results {
            merged.merge(result);
        }

        tracing::info!(
            url,
            %strategy,
            categories = merged.categories.len(),
            audits = merged.audits.len(),
            "Speed audit complete"
        );

        Ok(merged)
    }

    async fn audit_category(
        &self,
        url: &str,
        strategy: Strategy,
        category: Category,
    ) -> Result<LighthouseResult> {
        let endpoint = format!("{}/runPagespeed", self.base_url);
        let audit_error = |message: String| AuditError::SpeedAudit {
            strategy,
            category,
            message,
        };

        let mut query = vec![
            ("url", url),
            ("strategy", strategy.as_str()),
            ("category", category.api_name()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("key", key.as_str()));
        }

        let resp = self
            .client
            .get(&endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| audit_error(e.to_string()))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| audit_error(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            return Err(audit_error(format!("HTTP {}: {}", status.as_u16(), detail)));
        }

        let parsed: PageSpeedResponse = serde_json::from_str(&body)
            .map_err(|e| audit_error(format!("malformed response: {}", e)))?;

        parsed
            .lighthouse_result
            .ok_or_else(|| audit_error("response did not include a lighthouse result".to_string()))
    }
}
