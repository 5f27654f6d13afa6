use std::sync::Arc;

use postlens_queue::{execute_with_retry, RequestSerializer, RetryPolicy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, DEFAULT_API_BASE};
use crate::error::{ClientError, ClientResult};
use crate::stats::CachedStats;
use crate::transport::{ApiRequest, ReqwestTransport, Transport};

/// Per-call overrides.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Replaces the configured retry policy.
    pub retry: Option<RetryPolicy>,
    /// Extra headers sent with the request.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Client for the analysis backend.
///
/// `POST`s go through the shared [`RequestSerializer`] one at a time;
/// `GET`s (status polls, health checks) are only retried.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    serializer: RequestSerializer,
    base: Arc<OnceCell<String>>,
    pub(crate) stats_cache: Arc<tokio::sync::Mutex<Option<CachedStats>>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let serializer = RequestSerializer::with_concurrency(config.max_concurrency);
        Self::with_serializer(config, transport, serializer)
    }

    /// Build a client that shares an existing serializer.
    pub fn with_serializer(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        serializer: RequestSerializer,
    ) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            serializer,
            base: Arc::new(OnceCell::new()),
            stats_cache: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// A client using `reqwest`.
    pub fn from_config(config: ClientConfig) -> Self {
        Self::new(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn serializer(&self) -> &RequestSerializer {
        &self.serializer
    }

    /// The API base in use, probing candidates on first call.
    ///
    /// Candidates are health-checked in configured order and the first 2xx
    /// wins. If none answers, the first candidate is used anyway. The result
    /// is cached; concurrent first callers share one probe.
    pub async fn resolve_api_base(&self) -> &str {
        self.base.get_or_init(|| self.probe_bases()).await
    }

    async fn probe_bases(&self) -> String {
        for base in &self.config.api_bases {
            let url = join_url(base, &self.config.health_path);
            match self.transport.send(ApiRequest::get(url)).await {
                Ok(res) if res.is_success() => {
                    info!(base = %base, "API base resolved");
                    return base.clone();
                }
                Ok(res) => debug!(base = %base, status = res.status, "health check failed"),
                Err(err) => debug!(base = %base, error = %err, "health check failed"),
            }
        }

        let fallback = self
            .config
            .api_bases
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        warn!(base = %fallback, "no API base passed its health check, using default");
        fallback
    }

    /// `POST` a JSON body, serialized behind every other `POST` from this
    /// client's serializer, with retry.
    pub async fn post<R, B>(&self, path: &str, body: &B, options: RequestOptions) -> ClientResult<R>
    where
        R: DeserializeOwned + Send + 'static,
        B: Serialize + ?Sized,
    {
        let url = join_url(self.resolve_api_base().await, path);
        let body = serde_json::to_value(body).map_err(|e| ClientError::Serialization(e.to_string()))?;
        let request = options
            .headers
            .into_iter()
            .fold(
                ApiRequest::post(url, body).with_header("Content-Type", "application/json"),
                |req, (name, value)| req.with_header(name, value),
            );
        let policy = options.retry.unwrap_or_else(|| self.config.retry_policy());
        let transport = Arc::clone(&self.transport);

        debug!(path, "queueing POST");
        let value = self
            .serializer
            .enqueue(move || async move {
                execute_with_retry::<R, _, _>(&policy, || transport.send(request.clone())).await
            })
            .await?;
        Ok(value)
    }

    /// `GET` with retry; not serialized.
    pub async fn get<R>(&self, path: &str, options: RequestOptions) -> ClientResult<R>
    where
        R: DeserializeOwned,
    {
        let url = join_url(self.resolve_api_base().await, path);
        let request = options
            .headers
            .into_iter()
            .fold(ApiRequest::get(url), |req, (name, value)| req.with_header(name, value));
        let policy = options.retry.unwrap_or_else(|| self.config.retry_policy());

        let value = execute_with_retry::<R, _, _>(&policy, || self.transport.send(request.clone())).await?;
        Ok(value)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("base", &self.base.get())
            .field("serializer", &self.serializer)
            .finish()
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use postlens_queue::{HttpResponse, RequestError};
    use serde_json::{json, Value};

    use crate::transport::mock::ScriptedTransport;
    use crate::transport::Method;

    fn build(config: ClientConfig, transport: ScriptedTransport) -> (ApiClient, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        (ApiClient::new(config, transport.clone()), transport)
    }

    fn two_bases() -> ClientConfig {
        ClientConfig {
            api_bases: vec!["http://a.test".into(), "http://b.test".into()],
            ..Default::default()
        }
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("http://h/", "/x"), "http://h/x");
        assert_eq!(join_url("http://h", "x"), "http://h/x");
        assert_eq!(join_url("http://h", "/x?y=1"), "http://h/x?y=1");
    }

    #[tokio::test]
    async fn resolves_first_healthy_base() {
        let transport = ScriptedTransport::new()
            .respond(Method::Get, "http://a.test/health", Err(RequestError::Transport("refused".into())))
            .json(Method::Get, "http://b.test/health", 200, json!({"status": "ok"}));
        let (client, transport) = build(two_bases(), transport);

        assert_eq!(client.resolve_api_base().await, "http://b.test");
        assert_eq!(
            transport.urls(),
            vec!["http://a.test/health", "http://b.test/health"]
        );
    }

    #[tokio::test]
    async fn unhealthy_status_skips_base() {
        let transport = ScriptedTransport::new()
            .json(Method::Get, "http://a.test/health", 503, json!({}))
            .json(Method::Get, "http://b.test/health", 200, json!({}));
        let (client, _) = build(two_bases(), transport);
        assert_eq!(client.resolve_api_base().await, "http://b.test");
    }

    #[tokio::test]
    async fn falls_back_to_first_base() {
        let (client, transport) = build(two_bases(), ScriptedTransport::new());
        assert_eq!(client.resolve_api_base().await, "http://a.test");
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn resolution_is_cached_and_shared() {
        let transport = ScriptedTransport::new().json(Method::Get, "http://a.test/health", 200, json!({}));
        let (client, transport) = build(two_bases(), transport);

        let (first, second) = tokio::join!(client.resolve_api_base(), client.resolve_api_base());
        assert_eq!(first, "http://a.test");
        assert_eq!(second, "http://a.test");
        assert_eq!(client.resolve_api_base().await, "http://a.test");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn post_sends_json_with_headers() {
        let transport = ScriptedTransport::new()
            .json(Method::Get, "http://api.test/health", 200, json!({}))
            .json(Method::Post, "http://api.test/grammar-check", 200, json!({"mistakes": []}));
        let (client, transport) = build(ClientConfig::single("http://api.test"), transport);

        let reply: Value = client
            .post(
                "/grammar-check",
                &json!({"texts": ["hello"], "language": "eng"}),
                RequestOptions::default().with_header("X-Trace", "t1"),
            )
            .await
            .unwrap();
        assert_eq!(reply, json!({"mistakes": []}));

        let sent = transport.requests().pop().unwrap();
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.header("Content-Type"), Some("application/json"));
        assert_eq!(sent.header("X-Trace"), Some("t1"));
        assert_eq!(sent.body, Some(json!({"texts": ["hello"], "language": "eng"})));
    }

    #[tokio::test(start_paused = true)]
    async fn post_surfaces_last_error_after_retries() {
        let transport = ScriptedTransport::new()
            .json(Method::Get, "http://api.test/health", 200, json!({}))
            .respond(Method::Post, "http://api.test/p", Err(RequestError::Transport("reset".into())))
            .respond(Method::Post, "http://api.test/p", Ok(HttpResponse::new(502, "")));
        let (client, transport) = build(ClientConfig::single("http://api.test"), transport);

        let err = client
            .post::<Value, _>(
                "/p",
                &json!({}),
                RequestOptions::default().with_retry(RetryPolicy::new(3, Duration::from_millis(10))),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Request(RequestError::Status { status: 502 })));
        assert_eq!(transport.requests().len(), 4);
        assert_eq!(client.serializer().active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn get_retries_without_queueing() {
        let transport = ScriptedTransport::new()
            .json(Method::Get, "http://api.test/health", 200, json!({}))
            .json(Method::Get, "http://api.test/stats", 500, json!({}))
            .json(Method::Get, "http://api.test/stats", 200, json!({"total": 9}));
        let (client, _) = build(ClientConfig::single("http://api.test"), transport);

        let stats: Value = client.get("/stats", RequestOptions::default()).await.unwrap();
        assert_eq!(stats["total"], 9);
        assert_eq!(client.serializer().pending_count(), 0);
    }
}
