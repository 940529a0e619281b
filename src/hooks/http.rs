//! HTTP request hook: issues a single request described by mapped context
//! values and streams the response body to standard output

use std::fmt;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::context::{ExecutionContext, StepData};
use crate::error::{HookError, HookResult};
use crate::hook::Hook;

const KEY_METHOD: &str = "method";
const KEY_URL: &str = "url";
const KEY_USER: &str = "user";
const KEY_PASSWORD: &str = "password";
/// Headers are numbered `header1`, `header2`, ... and probed in order.
const KEY_HEADER: &str = "header";

/// HTTP methods the hook understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Delete,
    Get,
    Post,
    Put,
}

impl HttpMethod {
    /// Parse a raw method value, case-insensitively.
    fn parse(raw: &str) -> HookResult<Self> {
        let upper = raw.to_ascii_uppercase();
        match upper.as_str() {
            "DELETE" => Ok(HttpMethod::Delete),
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            _ => Err(HookError::failure(format!(
                "Could not parse '{upper}' as a HTTP method. \
                 Supported methods are: DELETE, GET, POST, PUT"
            ))),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Delete => "DELETE",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
        }
    }

    /// POST and PUT carry the (empty) form-encoded body.
    fn sends_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
        }
    }
}

/// Request description derived from one data channel, assembled fresh per
/// invocation and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    /// Header name/value pairs, in probe order
    pub headers: Vec<(String, String)>,
    /// Basic-auth user; the request carries no credentials without it
    pub user: Option<String>,
    pub password: Option<String>,
}

impl RequestSpec {
    /// Derive a request from a data channel's mapped values.
    fn from_step_data(data: &StepData, step_id: &str, rollback: bool) -> HookResult<Self> {
        let url = data.get(KEY_URL).ok_or_else(|| {
            HookError::failure(if rollback {
                format!("No rollback connection URL specified for hook '{step_id}'.")
            } else {
                format!("No connection URL specified for hook '{step_id}'.")
            })
        })?;

        let method = match data.get(KEY_METHOD) {
            Some(raw) => HttpMethod::parse(raw)?,
            None => HttpMethod::Get,
        };

        // Probe header1, header2, ... until the first gap.
        let mut headers = Vec::new();
        for index in 1.. {
            match data.get(&format!("{KEY_HEADER}{index}")) {
                Some(raw) => headers.push(split_header(raw)),
                None => break,
            }
        }

        Ok(RequestSpec {
            method,
            url: url.to_string(),
            headers,
            user: data.get(KEY_USER).map(str::to_string),
            password: data.get(KEY_PASSWORD).map(str::to_string),
        })
    }
}

/// Split a raw header on the first `:`. A raw value without a colon becomes
/// a header with an empty value.
fn split_header(raw: &str) -> (String, String) {
    match raw.split_once(':') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (raw.to_string(), String::new()),
    }
}

/// Issues a single HTTP request per invocation, described entirely by the
/// mapped context values.
///
/// Recognized keys: `url` (required), `method` (DELETE/GET/POST/PUT,
/// defaults to GET), `user` and `password` for Basic authentication, and
/// `header1`..`headerN` probed in order, each split on the first `:`.
///
/// POST and PUT requests always send an empty
/// `application/x-www-form-urlencoded` body; request parameters and bodies
/// are not supported. A 2xx response has its body streamed to standard
/// output followed by a line break, any other status is a recoverable
/// failure.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestHook {
    client: reqwest::Client,
}

impl HttpRequestHook {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn run(&self, step_id: &str, data: &StepData, rollback: bool) -> HookResult<()> {
        let spec = RequestSpec::from_step_data(data, step_id, rollback)?;

        info!(
            "{} hook '{}' with the following setup:",
            if rollback { "Rolling back" } else { "Executing" },
            step_id
        );
        info!("\t\tMETHOD: {}", spec.method);
        info!("\t\tURL: {}", spec.url);

        let response = self.send(&spec).await.map_err(|e| {
            HookError::unexpected(
                format!(
                    "An unexpected error was caught during the {} request to '{}': {}",
                    spec.method, spec.url, e
                ),
                e,
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HookError::failure(format!(
                "The {} request to '{}' was not successful. Status code: {} Message: {}",
                spec.method,
                spec.url,
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        debug!("Received status {} from '{}'", status.as_u16(), spec.url);
        stream_body(response, &mut tokio::io::stdout()).await
    }

    async fn send(&self, spec: &RequestSpec) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self.client.request(spec.method.into(), spec.url.as_str());
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(user) = &spec.user {
            request = request.basic_auth(user, spec.password.as_deref());
        }
        if spec.method.sends_body() {
            request = request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("");
        }
        request.send().await
    }
}

/// Copy the response body verbatim to the sink, then terminate the line.
async fn stream_body<W>(mut response: reqwest::Response, out: &mut W) -> HookResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(chunk) = response.chunk().await.map_err(stream_error)? {
        out.write_all(&chunk).await.map_err(stream_error)?;
    }
    out.write_all(b"\n").await.map_err(stream_error)?;
    out.flush().await.map_err(stream_error)?;
    Ok(())
}

fn stream_error(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> HookError {
    HookError::unexpected("Problem reading and printing the response content.", e)
}

#[async_trait]
impl Hook for HttpRequestHook {
    fn id(&self) -> &'static str {
        "http-request"
    }

    fn description(&self) -> &'static str {
        "Issues a single HTTP request described by mapped context values."
    }

    async fn execute(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.data().has_mapped() {
            warn!(
                "No request data specified! Skipping the execution of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run(context.step_id(), context.data(), false).await
    }

    async fn rollback(&self, context: &ExecutionContext) -> HookResult<()> {
        if !context.rollback_data().has_mapped() {
            debug!(
                "No rollback request data specified! Skipping the rollback of hook '{}'.",
                context.step_id()
            );
            return Ok(());
        }
        self.run(context.step_id(), context.rollback_data(), true).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context_with(data: StepData) -> ExecutionContext {
        ExecutionContext::new("http[0]").with_data(data)
    }

    #[test]
    fn test_split_header_on_first_colon() {
        assert_eq!(
            split_header("X-Trace:abc:123"),
            ("X-Trace".to_string(), "abc:123".to_string())
        );
        assert_eq!(split_header("X-Empty"), ("X-Empty".to_string(), String::new()));
        assert_eq!(split_header("X-Blank:"), ("X-Blank".to_string(), String::new()));
    }

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post").unwrap(), HttpMethod::Post);
        assert_eq!(HttpMethod::parse("Delete").unwrap(), HttpMethod::Delete);

        let err = HttpMethod::parse("patch").unwrap_err();
        assert!(err.is_failure());
        assert!(err.to_string().contains("'PATCH'"));
        assert!(err.to_string().contains("DELETE, GET, POST, PUT"));
    }

    #[tokio::test]
    async fn test_execute_skips_without_request_data() {
        let hook = HttpRequestHook::new();
        let context = context_with(StepData::new().with_unmapped("not a request"));
        assert!(hook.execute(&context).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_is_the_default_method() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let context = context_with(
            StepData::new().with_mapped("url", format!("{}/ping", server.uri())),
        );
        HttpRequestHook::new().execute(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method.as_str(), "GET");
    }

    #[tokio::test]
    async fn test_stream_body_copies_body_verbatim_with_line_break() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/ping", server.uri())).await.unwrap();
        let mut out = Vec::new();
        stream_body(response, &mut out).await.unwrap();
        assert_eq!(out, b"pong\n");
    }

    #[tokio::test]
    async fn test_stream_body_adds_exactly_one_line_break() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lines"))
            .respond_with(ResponseTemplate::new(200).set_body_string("one\ntwo\n"))
            .mount(&server)
            .await;

        let response = reqwest::get(format!("{}/lines", server.uri())).await.unwrap();
        let mut out = Vec::new();
        stream_body(response, &mut out).await.unwrap();
        assert_eq!(out, b"one\ntwo\n\n");
    }

    #[tokio::test]
    async fn test_post_sends_empty_form_encoded_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/submit"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let context = context_with(
            StepData::new()
                .with_mapped("method", "POST")
                .with_mapped("url", format!("{}/submit", server.uri())),
        );
        HttpRequestHook::new().execute(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert!(request.body.is_empty());
        assert_eq!(
            request.headers.get("content-type").unwrap().to_str().unwrap(),
            "application/x-www-form-urlencoded"
        );
    }

    #[tokio::test]
    async fn test_unknown_method_fails_without_sending() {
        let server = MockServer::start().await;

        let context = context_with(
            StepData::new()
                .with_mapped("method", "PATCH")
                .with_mapped("url", server.uri()),
        );
        let err = HttpRequestHook::new().execute(&context).await.unwrap_err();

        assert!(err.is_failure());
        assert!(err.to_string().contains("Supported methods are"));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_headers_probed_in_order_and_split_on_first_colon() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        // header3 is missing, so probing stops before header4.
        let context = context_with(
            StepData::new()
                .with_mapped("url", server.uri())
                .with_mapped("header1", "X-Trace:abc:123")
                .with_mapped("header2", "X-Empty")
                .with_mapped("header4", "X-Skipped:nope"),
        );
        HttpRequestHook::new().execute(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        assert_eq!(headers.get("x-trace").unwrap().to_str().unwrap(), "abc:123");
        assert_eq!(headers.get("x-empty").unwrap().to_str().unwrap(), "");
        assert!(headers.get("x-skipped").is_none());
    }

    #[tokio::test]
    async fn test_basic_auth_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let context = context_with(
            StepData::new()
                .with_mapped("url", server.uri())
                .with_mapped("user", "bob")
                .with_mapped("password", "secret"),
        );
        HttpRequestHook::new().execute(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0].headers.get("authorization").unwrap();
        // base64("bob:secret")
        assert_eq!(authorization.to_str().unwrap(), "Basic Ym9iOnNlY3JldA==");
    }

    #[tokio::test]
    async fn test_basic_auth_allows_missing_password() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let context = context_with(
            StepData::new()
                .with_mapped("url", server.uri())
                .with_mapped("user", "bob"),
        );
        HttpRequestHook::new().execute(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let authorization = requests[0].headers.get("authorization").unwrap();
        // base64("bob:")
        assert_eq!(authorization.to_str().unwrap(), "Basic Ym9iOg==");
    }

    #[tokio::test]
    async fn test_non_success_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/missing", server.uri());
        let context = context_with(StepData::new().with_mapped("url", &url));
        let err = HttpRequestHook::new().execute(&context).await.unwrap_err();

        assert!(err.is_failure());
        let message = err.to_string();
        assert!(message.contains(&format!("The GET request to '{url}'")));
        assert!(message.contains("Status code: 404"));
        assert!(message.contains("Not Found"));
    }

    #[tokio::test]
    async fn test_missing_url_is_failure() {
        let context = context_with(StepData::new().with_mapped("method", "GET"));
        let err = HttpRequestHook::new().execute(&context).await.unwrap_err();

        assert!(err.is_failure());
        assert_eq!(
            err.to_string(),
            "No connection URL specified for hook 'http[0]'."
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_unexpected() {
        // Nothing listens on this port.
        let context = context_with(
            StepData::new().with_mapped("url", "http://127.0.0.1:9/down"),
        );
        let err = HttpRequestHook::new().execute(&context).await.unwrap_err();
        assert!(!err.is_failure());
        assert!(err.to_string().contains("unexpected error"));
    }

    #[tokio::test]
    async fn test_rollback_uses_rollback_channel() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/undo"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let context = ExecutionContext::new("http[0]")
            .with_data(StepData::new().with_mapped("url", "http://unused.invalid"))
            .with_rollback_data(
                StepData::new()
                    .with_mapped("method", "DELETE")
                    .with_mapped("url", format!("{}/undo", server.uri())),
            );
        HttpRequestHook::new().rollback(&context).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method.as_str(), "DELETE");
    }

    #[tokio::test]
    async fn test_rollback_requires_its_own_url() {
        let context = ExecutionContext::new("http[0]")
            .with_data(StepData::new().with_mapped("url", "http://unused.invalid"))
            .with_rollback_data(StepData::new().with_mapped("method", "DELETE"));
        let err = HttpRequestHook::new().rollback(&context).await.unwrap_err();

        assert!(err.is_failure());
        assert_eq!(
            err.to_string(),
            "No rollback connection URL specified for hook 'http[0]'."
        );
    }

    #[tokio::test]
    async fn test_rollback_skips_without_rollback_data() {
        let context = ExecutionContext::new("http[0]")
            .with_data(StepData::new().with_mapped("url", "http://unused.invalid"));
        assert!(HttpRequestHook::new().rollback(&context).await.is_ok());
    }
}
