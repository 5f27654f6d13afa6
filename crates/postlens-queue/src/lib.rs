//! Request serialization for Postlens.
//!
//! Network-bound work from many independent callers is funneled through a
//! [`RequestSerializer`] so that it runs one operation at a time in
//! submission order. Individual requests are retried with exponential
//! backoff by [`execute_with_retry`].
//!
//! # Key Types
//!
//! - [`RequestSerializer`] -- FIFO single-flight executor
//! - [`RetryPolicy`] / [`execute_with_retry`] -- Bounded exponential backoff
//! - [`HttpResponse`] -- Status plus raw body of one round trip
//! - [`RequestError`] / [`QueueError`] -- Failure kinds

pub mod error;
pub mod response;
pub mod retry;
pub mod serializer;

pub use error::{QueueError, RequestError, RequestResult};
pub use response::HttpResponse;
pub use retry::{execute_with_retry, RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY};
pub use serializer::{RequestSerializer, MAX_CONCURRENCY};
