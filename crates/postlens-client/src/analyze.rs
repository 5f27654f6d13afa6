//! Server-side analysis queue.
//!
//! `POST /analyze` either answers with the finished analysis (older servers)
//! or with a ticket. Tickets are polled on `GET /queue/status` until the job
//! is done or failed. Polling has no deadline of its own; wrap the call in
//! `tokio::time::timeout` to bound it.

use std::time::Duration;

use postlens_queue::RetryPolicy;
use serde_json::Value;
use tracing::{debug, info};

use crate::client::{ApiClient, RequestOptions};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::status::{endpoints, AnalyzeReply, AnalyzeRequest, QueueProgress, QueueState, StatusReply};

/// Settings for one analysis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyzeOptions {
    /// Retry policy for the initial `POST`. Status polls use a single attempt
    /// with the same base delay.
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for AnalyzeOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            retry: config.analyze_retry_policy(),
            poll_interval: config.poll_interval(),
        }
    }
}

const DEFAULT_FAILURE_MESSAGE: &str = "Queue processing failed";

impl ApiClient {
    /// Run an analysis through the server queue, reporting progress to
    /// `on_update`, and return the analysis JSON.
    pub async fn analyze<F>(
        &self,
        request: &AnalyzeRequest,
        options: &AnalyzeOptions,
        mut on_update: F,
    ) -> ClientResult<Value>
    where
        F: FnMut(&QueueProgress),
    {
        let mut payload =
            serde_json::to_value(request).map_err(|e| ClientError::Serialization(e.to_string()))?;
        if let Value::Object(fields) = &mut payload {
            fields.insert("queue".into(), Value::Bool(true));
        }

        let reply: Value = self
            .post(
                endpoints::ANALYZE,
                &payload,
                RequestOptions::default()
                    .with_retry(options.retry)
                    .with_header("X-Queue", "1"),
            )
            .await?;

        let ticket = match AnalyzeReply::classify(reply)? {
            AnalyzeReply::Complete(analysis) => {
                debug!(username = %request.username, "server answered without queueing");
                return Ok(analysis);
            }
            AnalyzeReply::Queued(ticket) => ticket,
        };
        let request_id = ticket
            .request_id
            .clone()
            .ok_or_else(|| ClientError::Protocol("queued reply carries no request_id".into()))?;
        info!(username = %request.username, request_id = %request_id, "analysis queued");
        on_update(&ticket.progress());

        let poll = RequestOptions::default().with_retry(RetryPolicy::new(1, options.retry.base_delay));
        let encoded_id = encode_query_value(&request_id);

        loop {
            tokio::time::sleep(options.poll_interval).await;

            let status: StatusReply = self
                .get(
                    &format!("{}?request_id={}", endpoints::QUEUE_STATUS, encoded_id),
                    poll.clone(),
                )
                .await?;
            on_update(&status.progress());

            match status.into_state() {
                QueueState::Done { result: Some(result) } => return Ok(result),
                QueueState::Done { result: None } => {
                    return self
                        .get(
                            &format!("{}?request_id={}", endpoints::QUEUE_RESULT, encoded_id),
                            poll,
                        )
                        .await;
                }
                QueueState::Failed { message } => {
                    return Err(ClientError::Remote(
                        message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.into()),
                    ));
                }
                QueueState::Queued { position, .. } | QueueState::Processing { position, .. } => {
                    debug!(request_id = %request_id, ?position, "analysis pending");
                }
            }
        }
    }
}

fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
