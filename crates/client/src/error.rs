//! Errors from the inference client layer.

use std::time::Duration;

use bioinfer_core::error::CoreError;
use bioinfer_core::types::CorrelationId;

/// Errors from the inference API, the task poller and client setup.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Inference API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The task reported `DONE` but carried no payload.
    #[error("Task {correlation_id} finished without a response payload")]
    MissingPayload { correlation_id: CorrelationId },

    /// The task reported `ERROR`. Only raised by the convenience
    /// operations on [`InferenceClient`](crate::InferenceClient); the
    /// poller reports this as an outcome.
    #[error("Task {correlation_id} failed: {}", .message.as_deref().unwrap_or("no details"))]
    TaskFailed {
        correlation_id: CorrelationId,
        message: Option<String>,
    },

    /// No terminal state was reported before the poll deadline.
    #[error("Task {correlation_id} did not finish within {elapsed:?}")]
    Timeout {
        correlation_id: CorrelationId,
        elapsed: Duration,
    },

    /// Polling was stopped through the cancellation token.
    #[error("Polling of task {correlation_id} was cancelled")]
    Cancelled { correlation_id: CorrelationId },

    /// Input rejected before submission, or a payload that could not be
    /// interpreted.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether the failure is transient and the same request may succeed
    /// if repeated: connection problems, timeouts, throttling and
    /// gateway errors. Auth failures and malformed responses are fatal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(e) => match e.status() {
                Some(status) => is_retryable_status(status.as_u16()),
                None => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            },
            Self::Api { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Whether the service rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Api { status: 401 | 403, .. })
    }

    /// Whether polling stopped because of the deadline or cancellation
    /// rather than anything the service reported.
    pub fn is_interruption(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled { .. })
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}
