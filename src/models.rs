use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Terminal value of the remote crawl progress marker
pub const CRAWL_FINISHED: &str = "finished";

/// Lifecycle of a remote on-page task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Polling,
    Finished,
    TimedOut,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTask {
    pub id: String,
    pub target: String,
    pub max_crawl_pages: u64,
    pub state: TaskState,
}

impl AnalysisTask {
    pub fn new(id: impl Into<String>, target: impl Into<String>, max_crawl_pages: u64) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            max_crawl_pages,
            state: TaskState::Submitted,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            TaskState::Finished | TaskState::TimedOut | TaskState::Failed
        )
    }
}

/// Reads an explicit `null` the same way as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which polling profile (and submission flags) an analysis runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    #[default]
    Free,
    Advanced,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Free => "free",
            AnalysisMode::Advanced => "advanced",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStatus {
    #[serde(default)]
    pub max_crawl_pages: Option<u64>,
    #[serde(default)]
    pub pages_in_queue: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages_crawled: u64,
}

/// Aggregate counters the on-page service computes over the crawled pages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetrics {
    pub onpage_score: Option<f64>,
    pub links_external: Option<u64>,
    pub links_internal: Option<u64>,
    pub broken_links: Option<u64>,
    pub broken_resources: Option<u64>,
    pub duplicate_title: Option<u64>,
    pub duplicate_description: Option<u64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub checks: BTreeMap<String, u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of the on-page status result. Fields the report does not
/// interpret are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnPageSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub crawl_progress: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub crawl_status: CrawlStatus,
    #[serde(default)]
    pub domain_info: Option<Value>,
    #[serde(default)]
    pub page_metrics: Option<PageMetrics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OnPageSummary {
    pub fn is_finished(&self) -> bool {
        self.crawl_progress == CRAWL_FINISHED
    }

    pub fn pages_crawled(&self) -> u64 {
        self.crawl_status.pages_crawled
    }
}

/// Progress snapshot handed to the caller after every poll that carried a
/// result body
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub pages_crawled: u64,
    pub total_pages: u64,
    pub percent: f64,
}

impl ProgressEvent {
    pub fn new(pages_crawled: u64, total_pages: u64) -> Self {
        let percent = if total_pages == 0 {
            100.0
        } else {
            pages_crawled as f64 * 100.0 / total_pages as f64
        };

        Self {
            pages_crawled,
            total_pages,
            percent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
        }
    }

    /// Query parameter value expected by the speed-audit API
    pub fn api_name(&self) -> &'static str {
        match self {
            Category::Performance => "PERFORMANCE",
            Category::Accessibility => "ACCESSIBILITY",
            Category::BestPractices => "BEST_PRACTICES",
            Category::Seo => "SEO",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Lighthouse-style result: category scores plus the raw audit map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryScore>,
    #[serde(default)]
    pub audits: BTreeMap<String, Value>,
}

impl LighthouseResult {
    /// Folds another per-category result into this one. Later entries win.
    pub fn merge(&mut self, other: LighthouseResult) {
        self.categories.extend(other.categories);
        self.audits.extend(other.audits);
    }
}

/// Speed results for both strategies plus the on-page result, for one URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedReport {
    pub url: String,
    pub task_id: String,
    pub mobile: LighthouseResult,
    pub desktop: LighthouseResult,
    pub onpage: OnPageSummary,
    pub generated_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRating {
    pub category: String,
    pub title: String,
    pub score: Option<u8>,
    pub rating: Rating,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub mobile: Vec<CategoryRating>,
    pub desktop: Vec<CategoryRating>,
    pub crawl_progress: String,
    pub pages_crawled: u64,
    pub onpage_score: Option<f64>,
    pub broken_links: u64,
    pub failed_checks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub summary: ReportSummary,
    #[serde(flatten)]
    pub analysis: AggregatedReport,
}
