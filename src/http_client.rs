use reqwest::{Client, ClientBuilder, header};
use std::time::Duration;

/// Common HTTP headers used for all API requests
const USER_AGENT: &str = concat!("siteaudit/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/json";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Creates a reqwest client configured for the JSON audit APIs
pub fn build_http_client(timeout_secs: u64) -> reqwest::Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        header::HeaderValue::from_static(ACCEPT_LANGUAGE),
    );

    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
}
