//! HTTP client for the Postlens analysis backend.
//!
//! Resolves which API base to talk to, funnels `POST`s through a shared
//! [`postlens_queue::RequestSerializer`], retries every call with backoff, and
//! drives the server-side analysis queue until a result is ready.
//!
//! # Key Types
//!
//! - [`ApiClient`] -- Base resolution, `post`/`get`, `analyze`, `global_stats`
//! - [`ClientConfig`] -- TOML-loadable settings
//! - [`Transport`] / [`ReqwestTransport`] -- The HTTP seam
//! - [`StatusReply`] / [`QueueState`] -- Analysis queue replies
//! - [`GlobalStats`] -- Population averages used as comparison baselines

pub mod analyze;
pub mod client;
pub mod config;
pub mod error;
pub mod stats;
pub mod status;
pub mod transport;

pub use analyze::AnalyzeOptions;
pub use client::{ApiClient, RequestOptions};
pub use config::{ClientConfig, DEFAULT_API_BASE};
pub use error::{ClientError, ClientResult};
pub use stats::GlobalStats;
pub use status::{
    endpoints, AnalyzeReply, AnalyzeRequest, JobStatus, QueueProgress, QueueState, StatusReply,
};
pub use transport::{ApiRequest, Method, ReqwestTransport, Transport};

// Re-export the queue types callers need alongside the client.
pub use postlens_queue::{HttpResponse, RequestError, RequestSerializer, RetryPolicy};
