use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::payload::{parse_category_payload, PayloadError, MAX_PAYLOAD_SIZE};
use crate::tree::{Category, CategoryId};

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Errors talking to the catalogue backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error("Invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Insecure API base URL: HTTPS required (except localhost)")]
    InsecureBaseUrl,
}

impl ApiError {
    /// Transient failures worth another attempt.
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout => true,
            ApiError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ApiError::HttpStatus(status) => *status >= 500,
            ApiError::ResponseTooLarge(_)
            | ApiError::InvalidUtf8
            | ApiError::Payload(_)
            | ApiError::InvalidBaseUrl(_)
            | ApiError::InsecureBaseUrl => false,
        }
    }
}

/// Bulk operations the admin table can run over a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Delete,
    Activate,
    Deactivate,
}

impl BulkAction {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Delete => "Deleted",
            Self::Activate => "Activated",
            Self::Deactivate => "Deactivated",
        }
    }
}

/// Result of a bulk request as acknowledged by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub action: BulkAction,
    pub requested: usize,
    pub affected: usize,
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    action: BulkAction,
    ids: &'a [CategoryId],
}

#[derive(Deserialize)]
struct BulkResponse {
    #[serde(default, alias = "modifiedCount", alias = "deletedCount")]
    affected: Option<usize>,
}

/// Build the shared HTTP client: pooled connections, bounded redirects.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::limited(3))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Check that `raw` is an http(s) URL, requiring HTTPS unless the host is
/// the local machine. The returned URL always ends with `/` so relative
/// endpoints join under its path.
pub fn validate_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;

    match url.scheme() {
        "https" => {}
        "http" => {
            let local = matches!(
                url.host_str(),
                Some("localhost") | Some("127.0.0.1") | Some("[::1]")
            );
            if !local {
                tracing::error!(base_url = %url, "Rejecting non-HTTPS API base URL");
                return Err(ApiError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %url, "Using non-HTTPS API base URL (localhost only)");
        }
        scheme => {
            return Err(ApiError::InvalidBaseUrl(format!(
                "unsupported scheme '{}'",
                scheme
            )))
        }
    }

    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidBaseUrl("URL cannot be a base".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Client for the category endpoints of the shop backend.
pub struct CategoryClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
    retry_base_delay: Duration,
}

impl std::fmt::Debug for CategoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CategoryClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        token: Option<SecretString>,
    ) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        tracing::info!(base_url = %base_url, authenticated = token.is_some(), "Configured catalogue API");
        Ok(Self {
            http,
            base_url,
            token,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        })
    }

    /// Override the first backoff delay (doubled on every retry).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    /// `GET {base}/categories`: the full flat list.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let url = self.endpoint("categories")?;
        let body = self.execute_with_retry(|| self.http.get(url.clone())).await?;
        let categories = parse_category_payload(&body)?;
        tracing::info!(count = categories.len(), "Fetched categories");
        Ok(categories)
    }

    /// `POST {base}/categories/bulk` with `{ action, ids }`.
    ///
    /// When the backend does not report a count, every requested id is
    /// assumed affected.
    pub async fn bulk_action(
        &self,
        action: BulkAction,
        ids: &[CategoryId],
    ) -> Result<BulkOutcome, ApiError> {
        let url = self.endpoint("categories/bulk")?;
        let request = BulkRequest { action, ids };
        let body = self
            .execute_with_retry(|| self.http.post(url.clone()).json(&request))
            .await?;

        let affected = if body.trim().is_empty() {
            None
        } else {
            serde_json::from_str::<BulkResponse>(&body)
                .map_err(PayloadError::from)?
                .affected
        };

        let outcome = BulkOutcome {
            action,
            requested: ids.len(),
            affected: affected.unwrap_or(ids.len()),
        };
        tracing::info!(
            action = action.verb(),
            requested = outcome.requested,
            affected = outcome.affected,
            "Bulk action acknowledged"
        );
        Ok(outcome)
    }

    /// Send with exponential backoff on transient failures (base, 2x, 4x).
    async fn execute_with_retry<F>(&self, build: F) -> Result<String, ApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut retry_count = 0;
        loop {
            match self.execute_once(build()).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay = self.retry_base_delay * (1u32 << retry_count);
                    tracing::debug!(
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying catalogue request after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn execute_once(&self, mut request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = tokio::time::timeout(REQUEST_TIMEOUT, request.send())
            .await
            .map_err(|_| ApiError::Timeout)??;

        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status().as_u16()));
        }

        read_limited_text(response, MAX_PAYLOAD_SIZE).await
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CATEGORIES: &str = r#"[
        {"_id":"1","parent":null,"name":"Electronics","slug":"electronics","level":0},
        {"_id":"2","parent":"1","name":"Phones","slug":"phones","level":1}
    ]"#;

    fn client_for(server: &MockServer, token: Option<&str>) -> CategoryClient {
        CategoryClient::new(
            reqwest::Client::new(),
            &format!("{}/api", server.uri()),
            token.map(|t| SecretString::from(t.to_string())),
        )
        .unwrap()
        .with_retry_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_validate_base_url() {
        let url = validate_base_url("https://shop.example.com/api").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/api/");
        assert_eq!(
            url.join("categories").unwrap().path(),
            "/api/categories"
        );

        assert!(validate_base_url("http://localhost:3000").is_ok());
        assert!(matches!(
            validate_base_url("http://shop.example.com"),
            Err(ApiError::InsecureBaseUrl)
        ));
        assert!(matches!(
            validate_base_url("ftp://shop.example.com"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            validate_base_url("not a url"),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_debug_masks_token() {
        let client = CategoryClient::new(
            reqwest::Client::new(),
            "https://shop.example.com",
            Some(SecretString::from("hunter2".to_string())),
        )
        .unwrap();
        let out = format!("{:?}", client);
        assert!(!out.contains("hunter2"));
        assert!(out.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_list_categories_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CATEGORIES))
            .mount(&server)
            .await;

        let cats = client_for(&server, None).list_categories().await.unwrap();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[1].parent_id.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_list_categories_sends_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Authorization", "Bearer s3cret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("{{\"data\":{}}}", CATEGORIES)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cats = client_for(&server, Some("s3cret"))
            .list_categories()
            .await
            .unwrap();
        assert_eq!(cats.len(), 2);
    }

    #[tokio::test]
    async fn test_list_categories_404_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        match client_for(&server, None).list_categories().await {
            Err(ApiError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_categories_500_retries_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4) // Initial request + 3 retries
            .mount(&server)
            .await;

        match client_for(&server, None).list_categories().await {
            Err(ApiError::HttpStatus(500)) => {}
            other => panic!("Expected HttpStatus(500), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_categories_503_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CATEGORIES))
            .mount(&server)
            .await;

        let cats = client_for(&server, None).list_categories().await.unwrap();
        assert_eq!(cats.len(), 2);
    }

    #[tokio::test]
    async fn test_list_categories_bad_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, None).list_categories().await.unwrap_err();
        assert!(matches!(err, ApiError::Payload(_)));
    }

    #[tokio::test]
    async fn test_bulk_action_posts_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/categories/bulk"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "action": "deactivate",
                "ids": ["1", "2"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"affected":1}"#))
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["1".to_string(), "2".to_string()];
        let outcome = client_for(&server, None)
            .bulk_action(BulkAction::Deactivate, &ids)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            BulkOutcome {
                action: BulkAction::Deactivate,
                requested: 2,
                affected: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_bulk_action_empty_body_assumes_all_affected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let ids = vec!["1".to_string(), "2".to_string(), "3".to_string()];
        let outcome = client_for(&server, None)
            .bulk_action(BulkAction::Delete, &ids)
            .await
            .unwrap();
        assert_eq!(outcome.affected, 3);
    }

    #[tokio::test]
    async fn test_read_limited_text_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
            .mount(&server)
            .await;

        let response = reqwest::get(server.uri()).await.unwrap();
        let err = read_limited_text(response, 16).await.unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(16)));
    }
}
