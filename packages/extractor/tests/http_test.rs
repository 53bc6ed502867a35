//! Page fetching against a mock server.
//!
//! The extractor uses the blocking client, so every fetch runs on a
//! blocking thread next to the async mock server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lignage_extractor::http::{create_client, fetch_page, FetchedPage};
use lignage_extractor::{validate_html_payload, ExtractorError, Result};

async fn fetch(url: String, max_size: u64) -> Result<FetchedPage> {
    tokio::task::spawn_blocking(move || {
        let client = create_client()?;
        fetch_page(&client, &url, max_size)
    })
    .await
    .expect("fetch task")
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_page_returns_body_and_content_type() {
    let mock_server = MockServer::start().await;
    let html = "<h1>Jean Dupont</h1><p>He was born in 1850.</p>";

    Mock::given(method("GET"))
        .and(path("/p/42"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&mock_server)
        .await;

    let page = fetch(format!("{}/p/42", mock_server.uri()), 1024)
        .await
        .expect("page");
    assert_eq!(page.body, html.as_bytes());
    assert_eq!(page.content_type.as_deref(), Some("text/html; charset=utf-8"));

    let validated = validate_html_payload(&page.body, page.content_type.as_deref(), 1024).expect("valid html");
    assert_eq!(validated, html);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_page_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = fetch(format!("{}/missing", mock_server.uri()), 1024).await;
    assert!(matches!(result, Err(ExtractorError::Http(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_page_server_error_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = fetch(format!("{}/flaky", mock_server.uri()), 1024).await;
    let Err(ExtractorError::RetriesExhausted { attempts, message }) = result else {
        panic!("expected exhausted retries, got {result:?}");
    };
    assert_eq!(attempts, 3);
    assert!(message.contains("503"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fetch_page_size_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("x".repeat(4096), "text/html"))
        .mount(&mock_server)
        .await;

    let result = fetch(format!("{}/big", mock_server.uri()), 1024).await;
    assert!(matches!(
        result,
        Err(ExtractorError::PayloadTooLarge { limit: 1024, .. })
    ));
}
