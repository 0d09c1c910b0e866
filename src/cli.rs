use crate::models::AnalysisMode;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "siteaudit")]
#[command(about = "Runs page-speed and on-page SEO audits for a website", long_about = None)]
pub struct Cli {
    /// The URL to analyze
    #[arg(value_name = "URL")]
    pub url: String,

    /// Maximum number of pages the on-page crawl may visit (default: 10)
    #[arg(short, long)]
    pub max_pages: Option<u64>,

    /// Analysis mode: free or advanced (advanced renders JavaScript and waits longer; default: free)
    #[arg(long, value_enum)]
    pub mode: Option<AnalysisMode>,

    /// Output format: text or json (default: text)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Save the JSON report to a file
    #[arg(short, long)]
    pub save: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not draw a progress bar while waiting for the crawl
    #[arg(long)]
    pub no_progress: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}
