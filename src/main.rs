use anyhow::Result;
use clap::Parser;
use colored::*;
use siteaudit::cli::Cli;
use siteaudit::run;
use tracing_subscriber::EnvFilter;

fn setup_logging(verbose: bool) {
    let default_filter = if verbose {
        "siteaudit=debug,info"
    } else {
        "siteaudit=info,warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();
    setup_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("{} {}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
