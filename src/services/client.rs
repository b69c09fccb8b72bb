// src/services/client.rs

//! Resilient issue-tracker API client.
//!
//! Issues single paced GET requests with retry and backoff. Knows nothing
//! about pagination state or record semantics; those live in the pipeline.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{ClientConfig, Comment};
use crate::utils::http;

/// Server-side page size for search requests.
pub const PAGE_SIZE: u64 = 50;

/// Fields requested per issue in search responses.
const SEARCH_FIELDS: &str = "summary,description,status,priority,issuetype,reporter,\
                             assignee,created,updated,resolutiondate,labels,components";

/// Wait applied on 429 when Retry-After is absent or unparseable.
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// One page of raw issues from a search call.
#[derive(Debug, Default)]
pub struct SearchPage {
    /// Raw issue objects, in server order
    pub issues: Vec<Value>,
    /// Total matching issues reported by the server
    pub total: u64,
}

/// Outcome of a single request attempt.
///
/// The retry policy lives entirely in the match over this type inside
/// [`JiraClient::get`].
enum Attempt {
    /// 200 with a parseable JSON body
    Success(Value),
    /// 429; wait taken from Retry-After, does not consume the retry budget
    Throttled(Duration),
    /// 5xx or transport/timeout failure; counted against the retry budget
    Retryable(String),
    /// Non-retryable failure (4xx other than 429, unparseable 200 body)
    Fatal(AppError),
}

/// Rate-limited, retrying API client.
#[derive(Debug)]
pub struct JiraClient {
    client: reqwest::Client,
    config: ClientConfig,
    /// End time of the most recent request, shared across callers
    last_request: Mutex<Option<Instant>>,
}

impl JiraClient {
    /// Create a new client from configuration.
    ///
    /// Fails when the configured base URL does not parse.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)?;
        let client = http::create_client(config)?;
        Ok(Self {
            client,
            config: config.clone(),
            last_request: Mutex::new(None),
        })
    }

    /// Fetch one page of issues for a project, ordered by creation date.
    pub async fn search(&self, project: &str, start_at: u64) -> Result<SearchPage> {
        let url = self.endpoint("search");
        let params = [
            ("jql", format!("project={project} ORDER BY created ASC")),
            ("startAt", start_at.to_string()),
            ("maxResults", PAGE_SIZE.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        let body = self.get(&url, &params).await?;

        let issues = body
            .get("issues")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let total = body.get("total").and_then(Value::as_u64).unwrap_or(0);

        Ok(SearchPage { issues, total })
    }

    /// Fetch all comments for an issue.
    ///
    /// An absent or malformed comment collection yields an empty list,
    /// not an error.
    pub async fn comments(&self, issue_key: &str) -> Result<Vec<Comment>> {
        let url = self.endpoint(&format!("issue/{issue_key}/comment"));
        let body = self.get(&url, &[]).await?;

        let Some(raw) = body.get("comments").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };
        Ok(raw.iter().map(parse_comment).collect())
    }

    /// Perform a GET with rate limiting, retry and backoff.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Value> {
        let mut failures: u32 = 0;
        loop {
            self.pace().await;
            let outcome = self.attempt(url, params).await;
            self.mark_request_end().await;

            match outcome {
                Attempt::Success(body) => return Ok(body),
                Attempt::Throttled(wait) => {
                    log::warn!("Rate limited on {url}. Waiting {}s", wait.as_secs());
                    tokio::time::sleep(wait).await;
                }
                Attempt::Retryable(reason) => {
                    failures += 1;
                    if failures >= self.config.max_retries {
                        log::error!("Max retries reached for {url}: {reason}");
                        return Err(AppError::RetriesExhausted {
                            url: url.to_string(),
                            attempts: failures,
                        });
                    }
                    let wait = self.backoff(failures - 1);
                    log::warn!(
                        "{reason}. Retry {failures}/{} in {}ms",
                        self.config.max_retries,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
                Attempt::Fatal(error) => {
                    log::error!("Request to {url} failed: {error}");
                    return Err(error);
                }
            }
        }
    }

    /// Classify a single request attempt.
    async fn attempt(&self, url: &str, params: &[(&str, String)]) -> Attempt {
        let response = match self.client.get(url).query(params).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retryable(format!("Request failed: {e}")),
        };

        let status = response.status();
        if status.as_u16() == 429 {
            let wait = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_AFTER);
            return Attempt::Throttled(wait);
        }
        if status.is_server_error() {
            return Attempt::Retryable(format!("Server error {}", status.as_u16()));
        }
        if status.as_u16() == 200 {
            return match response.json::<Value>().await {
                Ok(body) => Attempt::Success(body),
                Err(e) => Attempt::Fatal(AppError::Http(e)),
            };
        }

        Attempt::Fatal(AppError::ClientError {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }

    /// Sleep so that at least the configured interval has passed since the
    /// end of the previous request. Runs before every attempt.
    async fn pace(&self) {
        let delay = Duration::from_millis(self.config.rate_limit_delay_ms);
        if delay.is_zero() {
            return;
        }
        let last = *self.last_request.lock().await;
        if let Some(previous) = last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
    }

    /// Record the end of a request for rate limiting.
    async fn mark_request_end(&self) {
        *self.last_request.lock().await = Some(Instant::now());
    }

    /// Exponential backoff: base * 2^exponent.
    fn backoff(&self, exponent: u32) -> Duration {
        let factor = 1u64 << exponent.min(16);
        Duration::from_millis(self.config.backoff_base_ms.saturating_mul(factor))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Parse a raw comment object, defaulting each field independently.
fn parse_comment(raw: &Value) -> Comment {
    Comment {
        author: raw
            .pointer("/author/displayName")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        created: raw
            .get("created")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
        body: raw
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client wired to a mock server, with pacing and backoff shrunk so
    /// tests run fast.
    fn test_client(server: &MockServer) -> JiraClient {
        let config = ClientConfig {
            base_url: server.uri(),
            rate_limit_delay_ms: 0,
            backoff_base_ms: 10,
            max_retries: 3,
            ..ClientConfig::default()
        };
        JiraClient::new(&config).unwrap()
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let config = ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(
            JiraClient::new(&config).unwrap_err(),
            AppError::Url(_)
        ));
    }

    #[tokio::test]
    async fn get_returns_parsed_body_on_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/ping", server.uri());
        let body = client.get(&url, &[]).await.unwrap();

        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn throttled_request_waits_and_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": 1})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/busy", server.uri());
        let started = std::time::Instant::now();
        let body = client.get(&url, &[]).await.unwrap();

        assert_eq!(body, json!({"done": 1}));
        // Honors the server-specified 1s wait.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn server_errors_back_off_then_succeed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"v": 2})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/flaky", server.uri());
        let started = std::time::Instant::now();
        let body = client.get(&url, &[]).await.unwrap();

        assert_eq!(body, json!({"v": 2}));
        // Two failures cost two backoff delays: 10ms + 20ms.
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn retries_exhausted_after_max_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/down", server.uri());
        let error = client.get(&url, &[]).await.unwrap_err();

        assert!(matches!(
            error,
            AppError::RetriesExhausted { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn client_error_fails_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let url = format!("{}/missing", server.uri());
        let error = client.get(&url, &[]).await.unwrap_err();

        assert!(matches!(error, AppError::ClientError { status: 404, .. }));
    }

    #[tokio::test]
    async fn pacing_spaces_consecutive_requests() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let config = ClientConfig {
            base_url: server.uri(),
            rate_limit_delay_ms: 100,
            ..ClientConfig::default()
        };
        let client = JiraClient::new(&config).unwrap();
        let url = format!("{}/a", server.uri());

        client.get(&url, &[]).await.unwrap();
        let started = std::time::Instant::now();
        client.get(&url, &[]).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn search_parses_issues_and_total() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "issues": [{"key": "KAFKA-1"}, {"key": "KAFKA-2"}],
                "total": 7
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let page = client.search("KAFKA", 0).await.unwrap();

        assert_eq!(page.issues.len(), 2);
        assert_eq!(page.total, 7);
    }

    #[tokio::test]
    async fn comments_parses_entries_with_defaults() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/issue/KAFKA-1/comment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "comments": [
                    {"author": {"displayName": "Ana"}, "created": "2020", "body": "hi"},
                    {"body": "orphan"}
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let comments = client.comments("KAFKA-1").await.unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "Ana");
        assert_eq!(comments[1].author, "Unknown");
        assert_eq!(comments[1].created, "");
    }

    #[tokio::test]
    async fn comments_empty_when_collection_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/issue/KAFKA-2/comment"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": 1})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let comments = client.comments("KAFKA-2").await.unwrap();
        assert!(comments.is_empty());
    }
}
