use crate::models::{
    AggregatedReport, AuditReport, Category, CategoryRating, LighthouseResult, Rating,
    ReportSummary,
};
use anyhow::{Context, Result};
use colored::*;
use std::fs::File;
use std::io::Write;

pub struct Reporter;

impl Reporter {
    pub fn generate_report(analysis: &AggregatedReport) -> AuditReport {
        AuditReport {
            summary: Self::calculate_summary(analysis),
            analysis: analysis.clone(),
        }
    }

    /// Converts a 0..1 lighthouse score into a 0..100 integer
    pub fn percent_score(score: Option<f64>) -> Option<u8> {
        score.map(|s| (s.clamp(0.0, 1.0) * 100.0).round() as u8)
    }

    pub fn rate(score: Option<u8>) -> Rating {
        match score {
            Some(s) if s >= 90 => Rating::Good,
            Some(s) if s >= 50 => Rating::NeedsImprovement,
            Some(_) => Rating::Poor,
            None => Rating::Unknown,
        }
    }

    fn rate_categories(result: &LighthouseResult) -> Vec<CategoryRating> {
        Category::ALL
            .iter()
            .map(|category| {
                let entry = result.categories.get(category.as_str());
                let score = Self::percent_score(entry.and_then(|c| c.score));
                CategoryRating {
                    category: category.as_str().to_string(),
                    title: entry
                        .map(|c| c.title.clone())
                        .filter(|t| !t.is_empty())
                        .unwrap_or_else(|| category.as_str().to_string()),
                    score,
                    rating: Self::rate(score),
                }
            })
            .collect()
    }

    fn calculate_summary(analysis: &AggregatedReport) -> ReportSummary {
        let metrics = analysis.onpage.page_metrics.as_ref();

        ReportSummary {
            mobile: Self::rate_categories(&analysis.mobile),
            desktop: Self::rate_categories(&analysis.desktop),
            crawl_progress: analysis.onpage.crawl_progress.clone(),
            pages_crawled: analysis.onpage.pages_crawled(),
            onpage_score: metrics.and_then(|m| m.onpage_score),
            broken_links: metrics.and_then(|m| m.broken_links).unwrap_or(0),
            failed_checks: metrics
                .map(|m| m.checks.values().filter(|count| **count > 0).count())
                .unwrap_or(0),
        }
    }

    fn colored_score(rating: &CategoryRating) -> ColoredString {
        let text = rating
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        match rating.rating {
            Rating::Good => text.bright_green(),
            Rating::NeedsImprovement => text.yellow(),
            Rating::Poor => text.bright_red(),
            Rating::Unknown => text.dimmed(),
        }
    }

    pub fn print_text_report(report: &AuditReport) {
        println!("\n{}", "=".repeat(80).bright_blue());
        println!("{}", "Site Audit Report".bright_cyan().bold());
        println!("{}", "=".repeat(80).bright_blue());
        println!();

        println!("{}: {}", "URL".bright_white().bold(), report.analysis.url);
        println!(
            "{}: {}",
            "Generated".bright_white().bold(),
            report.analysis.generated_at
        );
        println!(
            "{}: {}",
            "Task".bright_white().bold(),
            report.analysis.task_id
        );
        println!();

        println!("{}", "Speed Audit".bright_yellow().bold().underline());
        println!("  {:<20} {:>8} {:>8}", "", "Mobile", "Desktop");
        for (mobile, desktop) in report.summary.mobile.iter().zip(&report.summary.desktop) {
            println!(
                "  {:<20} {:>8} {:>8}",
                mobile.title,
                Self::colored_score(mobile),
                Self::colored_score(desktop)
            );
        }
        println!();

        let summary = &report.summary;
        println!("{}", "On-Page Audit".bright_yellow().bold().underline());
        println!("  Crawl Progress:  {}", summary.crawl_progress);
        println!(
            "  Pages Crawled:   {}",
            summary.pages_crawled.to_string().bright_green()
        );
        println!(
            "  On-Page Score:   {}",
            summary
                .onpage_score
                .map(|s| format!("{:.1}", s).bright_green())
                .unwrap_or_else(|| "N/A".dimmed())
        );
        println!(
            "  Broken Links:    {}",
            if summary.broken_links > 0 {
                summary.broken_links.to_string().bright_red()
            } else {
                summary.broken_links.to_string().bright_green()
            }
        );
        println!(
            "  Failed Checks:   {}",
            if summary.failed_checks > 0 {
                summary.failed_checks.to_string().yellow()
            } else {
                summary.failed_checks.to_string().bright_green()
            }
        );

        if let Some(metrics) = &report.analysis.onpage.page_metrics {
            let failing: Vec<_> = metrics.checks.iter().filter(|(_, count)| **count > 0).collect();
            if !failing.is_empty() {
                println!();
                println!("{}", "Checks with Findings".bright_yellow().bold().underline());
                for (check, count) in failing {
                    println!("  [{}] {} ({})", "WARN ".yellow(), check, count);
                }
            }
        }

        println!();
        println!("{}", "=".repeat(80).bright_blue());
    }

    pub fn save_json_report(report: &AuditReport, filename: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(filename)
            .with_context(|| format!("Failed to create report file: {}", filename))?;
        file.write_all(json.as_bytes())?;
        eprintln!("Report saved to: {}", filename.bright_green());
        Ok(())
    }
}
