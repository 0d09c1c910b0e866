use crate::config::Settings;
use crate::error::Result;
use crate::models::{AggregatedReport, AnalysisMode, ProgressEvent, Strategy};
use crate::onpage::OnPageClient;
use crate::pagespeed::SpeedAuditClient;
use crate::poller::{PollerConfig, TaskPoller};
use std::time::Duration;

/// Poll cadence per analysis mode. The two attempt ceilings are configured
/// separately and never collapsed into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollProfiles {
    pub interval: Duration,
    pub free_max_attempts: u64,
    pub advanced_max_attempts: u64,
}

impl PollProfiles {
    pub fn for_mode(&self, mode: AnalysisMode) -> PollerConfig {
        let max_attempts = match mode {
            AnalysisMode::Free => self.free_max_attempts,
            AnalysisMode::Advanced => self.advanced_max_attempts,
        };

        PollerConfig {
            interval: self.interval,
            max_attempts,
        }
    }
}

/// Runs one complete analysis: task submission and both speed audits side
/// by side, then polling, then the combined report.
pub struct Analyzer {
    onpage: OnPageClient,
    speed: SpeedAuditClient,
    profiles: PollProfiles,
}

impl Analyzer {
    pub fn new(onpage: OnPageClient, speed: SpeedAuditClient, profiles: PollProfiles) -> Self {
        Self {
            onpage,
            speed,
            profiles,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let onpage = OnPageClient::new(
            &settings.api_base_url,
            &settings.api_login,
            &settings.api_password,
            settings.request_timeout_secs,
        )?;
        let speed = SpeedAuditClient::new(
            &settings.pagespeed_base_url,
            settings.pagespeed_api_key.as_deref(),
            settings.request_timeout_secs,
        )?;

        Ok(Self::new(onpage, speed, settings.poll_profiles()))
    }

    /// Any failure aborts the whole run; there is no partial report.
    pub async fn run<F>(
        &self,
        url: &str,
        max_pages: u64,
        mode: AnalysisMode,
        on_progress: F,
    ) -> Result<AggregatedReport>
    where
        F: FnMut(ProgressEvent),
    {
        tracing::info!(url, max_pages, ?mode, "Starting analysis");

        let (mut task, mobile, desktop) = tokio::try_join!(
            self.onpage.submit_task(url, max_pages, mode),
            self.speed.audit(url, Strategy::Mobile),
            self.speed.audit(url, Strategy::Desktop),
        )?;

        let poller = TaskPoller::new(self.profiles.for_mode(mode));
        let onpage = poller
            .poll(&self.onpage, &mut task, max_pages, on_progress)
            .await?;

        Ok(AggregatedReport {
            url: url.to_string(),
            task_id: task.id,
            mobile,
            desktop,
            onpage,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}
