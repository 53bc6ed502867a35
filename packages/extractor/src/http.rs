//! HTTP client for fetching genealogy pages.

use std::io::Read;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::config::HTTP_TIMEOUT_SECS;
use crate::error::{ExtractorError, Result};

/// User agent string identifying this extractor.
const USER_AGENT: &str = concat!("lignage-extractor/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// A fetched page: body bytes and the declared content type.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Create a configured HTTP client.
///
/// # Returns
/// A `reqwest::blocking::Client` configured with timeout and user agent.
pub fn create_client() -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Fetch a page with retry logic and a size cap.
///
/// Uses exponential backoff for transient failures (connection errors,
/// timeouts, 5xx responses). Client errors are returned immediately.
///
/// # Arguments
/// * `client` - HTTP client to use
/// * `url` - URL to fetch
/// * `max_size` - Maximum accepted body size in bytes
///
/// # Returns
/// The body bytes plus the `Content-Type` header, if any
pub fn fetch_page(client: &Client, url: &str, max_size: u64) -> Result<FetchedPage> {
    let mut last_error: Option<String> = None;

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            // Exponential backoff: 500ms, 1000ms
            let delay = RETRY_BASE_DELAY_MS * (1 << (attempt - 1));
            tracing::debug!(attempt, delay_ms = delay, "Retrying after delay");
            thread::sleep(Duration::from_millis(delay));
        }

        match client.get(url).send() {
            Ok(response) => {
                let status = response.status();

                if status.is_server_error() {
                    tracing::warn!(
                        status = %status,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Server error, will retry"
                    );
                    last_error = Some(format!("Server error: {status}"));
                    continue;
                }

                // 4xx won't succeed on retry
                let response = response.error_for_status()?;
                return read_limited(response, url, max_size);
            }
            Err(e) => {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        max_retries = MAX_RETRIES,
                        "Connection error, will retry"
                    );
                    last_error = Some(e.to_string());
                    continue;
                }
                return Err(ExtractorError::Http(e));
            }
        }
    }

    Err(ExtractorError::RetriesExhausted {
        attempts: MAX_RETRIES,
        message: last_error.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

fn read_limited(
    response: reqwest::blocking::Response,
    url: &str,
    max_size: u64,
) -> Result<FetchedPage> {
    let limit = usize::try_from(max_size).unwrap_or(usize::MAX);

    if let Some(length) = response.content_length() {
        if length > max_size {
            return Err(ExtractorError::PayloadTooLarge {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                limit,
            });
        }
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    // Read one byte past the cap so an oversized body without a
    // Content-Length header is still detected.
    let mut body = Vec::new();
    response.take(max_size.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() > limit {
        return Err(ExtractorError::PayloadTooLarge {
            size: body.len(),
            limit,
        });
    }

    tracing::debug!(url, bytes = body.len(), "Fetched page");
    Ok(FetchedPage {
        url: url.to_string(),
        content_type,
        body,
    })
}
