mod server;

use actix_web::web;
use serde_json::json;
use serial_test::serial;
use server::{MockState, onpage_base, pagespeed_base, start_mock_server, summary};
use siteaudit::cli::Cli;
use siteaudit::run;
use std::fs;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "SITEAUDIT_API_BASE_URL",
    "SITEAUDIT_API_LOGIN",
    "SITEAUDIT_API_PASSWORD",
    "SITEAUDIT_PAGESPEED_BASE_URL",
    "SITEAUDIT_PAGESPEED_API_KEY",
    "SITEAUDIT_MAX_PAGES",
    "SITEAUDIT_POLL_INTERVAL_MS",
    "SITEAUDIT_MAX_POLL_ATTEMPTS",
    "SITEAUDIT_ADVANCED_MAX_POLL_ATTEMPTS",
    "SITEAUDIT_REQUEST_TIMEOUT_SECS",
];

fn clear_env() {
    for name in ENV_VARS {
        unsafe {
            std::env::remove_var(name);
        }
    }
}

fn args(url: &str, config: Option<String>) -> Cli {
    Cli {
        url: url.to_string(),
        max_pages: None,
        mode: None,
        output: None,
        save: None,
        verbose: false,
        no_progress: true,
        config,
    }
}

/// Writes a config file pointing both APIs at the mock server
fn write_config(dir: &TempDir, server_url: &str, max_poll_attempts: u64) -> String {
    let path = dir.path().join("siteaudit.json");
    let config = json!({
        "api_base_url": onpage_base(server_url),
        "api_login": "login",
        "api_password": "password",
        "pagespeed_base_url": pagespeed_base(server_url),
        "poll_interval_ms": 5,
        "max_poll_attempts": max_poll_attempts,
        "request_timeout_secs": 10
    });
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

#[tokio::test]
async fn test_invalid_url_no_protocol() {
    let result = run(args("example.com", None)).await;
    assert!(
        result.is_err(),
        "Should return error for URL without protocol"
    );
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("URL must start with http:// or https://"),
        "Error message should mention URL protocol requirement"
    );
}

#[tokio::test]
async fn test_invalid_url_other_protocol() {
    let result = run(args("ftp://example.com", None)).await;
    assert!(result.is_err(), "Should return error for non-HTTP(S) protocol");
}

#[tokio::test]
#[serial]
async fn test_missing_credentials() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("siteaudit.toml");
    fs::write(&path, "max_pages = 5").unwrap();

    let result = run(args(
        "https://example.com",
        Some(path.to_string_lossy().to_string()),
    ))
    .await;

    let message = result.expect_err("missing credentials should fail").to_string();
    assert!(message.contains("login is missing"));
}

#[tokio::test]
#[serial]
async fn test_missing_config_file() {
    clear_env();
    let result = run(args(
        "https://example.com",
        Some("/nonexistent/siteaudit.json".to_string()),
    ))
    .await;

    assert!(result.is_err());
    assert!(
        result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file")
    );
}

#[tokio::test]
#[serial]
async fn test_full_analysis_with_text_output() {
    clear_env();
    let state = web::Data::new(MockState::default());
    state.push_status(200, summary("finished", 6));
    let server_url = start_mock_server(state.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server_url, 30);

    let result = run(args("https://example.com", Some(config))).await;
    assert!(result.is_ok(), "Should complete the analysis: {:?}", result.err());
    assert_eq!(state.status_calls(), 1);
}

#[tokio::test]
#[serial]
async fn test_full_analysis_with_json_output_and_save() {
    clear_env();
    let state = web::Data::new(MockState::default());
    state.push_status(200, summary("in_progress", 4));
    let server_url = start_mock_server(state.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server_url, 30);
    let report_path = dir.path().join("report.json");

    let cli = Cli {
        max_pages: Some(4),
        output: Some("json".to_string()),
        save: Some(report_path.to_string_lossy().to_string()),
        ..args("https://example.com", Some(config))
    };

    run(cli).await.expect("analysis should succeed");

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(saved["url"], json!("https://example.com"));
    assert_eq!(saved["summary"]["pages_crawled"], json!(4));
    assert_eq!(saved["summary"]["mobile"][0]["score"], json!(45));

    let bodies = state.submit_bodies.lock().unwrap();
    assert_eq!(bodies[0][0]["max_crawl_pages"], json!(4));
}

#[tokio::test]
#[serial]
async fn test_environment_overrides_config_file() {
    clear_env();
    let state = web::Data::new(MockState::default());
    let server_url = start_mock_server(state.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server_url, 30);

    unsafe {
        std::env::set_var("SITEAUDIT_MAX_POLL_ATTEMPTS", "2");
    }

    let result = run(args("https://example.com", Some(config))).await;
    clear_env();

    let message = result.expect_err("analysis should time out").to_string();
    assert!(message.contains("did not finish after 2 poll attempts"));
    assert_eq!(state.status_calls(), 2);
}

#[tokio::test]
#[serial]
async fn test_failed_submission_surfaces_message() {
    clear_env();
    let state = web::Data::new(MockState::default());
    state.set_submit_response(
        200,
        json!({ "status_code": 40200, "status_message": "Payment Required." }),
    );
    let server_url = start_mock_server(state.clone()).await;
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir, &server_url, 30);
    let report_path = dir.path().join("report.json");

    let cli = Cli {
        save: Some(report_path.to_string_lossy().to_string()),
        ..args("https://example.com", Some(config))
    };

    let message = run(cli)
        .await
        .expect_err("submission should fail")
        .to_string();
    assert!(message.contains("Payment Required."));
    assert!(!report_path.exists(), "no partial report should be written");
}
