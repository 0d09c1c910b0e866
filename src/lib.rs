pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod http_client;
pub mod models;
pub mod onpage;
pub mod pagespeed;
pub mod poller;
pub mod reporter;

use analysis::Analyzer;
use anyhow::{Context, Result};
use cli::Cli;
use colored::*;
use config::{Config, Settings};
use indicatif::{ProgressBar, ProgressStyle};
use reporter::Reporter;
use std::path::Path;
use url::Url;

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb.set_message("waiting for crawl");
    pb
}

/// Loads the file layer (explicit path or default locations), then applies
/// the environment on top
pub fn load_config(explicit_path: Option<&str>) -> Result<Config> {
    let file_config = match explicit_path {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::from_default_paths()?.unwrap_or_default(),
    };

    Ok(file_config.overlay(Config::from_env()?))
}

pub async fn run(args: Cli) -> Result<()> {
    // Validate URL
    if !args.url.starts_with("http://") && !args.url.starts_with("https://") {
        anyhow::bail!("URL must start with http:// or https://");
    }
    Url::parse(&args.url).context("Invalid URL")?;

    let config = load_config(args.config.as_deref())?;
    let args = config.merge_with_cli(&args);
    let settings = Settings::from_config(&config)?;
    let json_output = args.output == "json";

    if !json_output {
        println!("{}", "Site Audit - Speed & On-Page SEO".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!();
        println!("{} {}", "Analyzing:".bright_white().bold(), args.url);
        println!("{} {}", "Max pages:".bright_white().bold(), args.max_pages);
        println!("{} {}", "Mode:".bright_white().bold(), args.mode);
        println!();
    }

    if args.verbose {
        eprintln!(
            "{}",
            "Submitting crawl task and running speed audits...".bright_yellow()
        );
    }

    let analyzer = Analyzer::from_settings(&settings)?;
    let pb = (!args.no_progress).then(progress_bar);

    let result = analyzer
        .run(&args.url, args.max_pages, args.mode, |event| {
            if let Some(pb) = &pb {
                pb.set_position(event.percent.clamp(0.0, 100.0) as u64);
                pb.set_message(format!(
                    "{}/{} pages crawled",
                    event.pages_crawled, event.total_pages
                ));
            }
        })
        .await;

    let analysis = match result {
        Ok(analysis) => {
            if let Some(pb) = &pb {
                pb.finish_with_message(format!(
                    "{} pages crawled",
                    analysis.onpage.pages_crawled()
                ));
            }
            analysis
        }
        Err(e) => {
            if let Some(pb) = &pb {
                pb.finish_and_clear();
            }
            return Err(e.into());
        }
    };

    if args.verbose {
        eprintln!("{}", "Analysis complete".bright_green());
    }

    let report = Reporter::generate_report(&analysis);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{}", json);
        }
        _ => {
            Reporter::print_text_report(&report);
        }
    }

    if let Some(filename) = args.save {
        Reporter::save_json_report(&report, &filename)?;
    }

    Ok(())
}
