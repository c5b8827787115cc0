use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token the remote service assigns to a submitted job.
///
/// Used as the key for every status query. Owned by the caller; the
/// service defines no expiry for it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CorrelationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<&CorrelationId> for CorrelationId {
    fn from(id: &CorrelationId) -> Self {
        id.clone()
    }
}

/// Response returned by every job-submitting endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned identifier for the queued job.
    pub correlation_id: CorrelationId,
}

impl From<SubmitResponse> for CorrelationId {
    fn from(response: SubmitResponse) -> Self {
        response.correlation_id
    }
}

impl From<&SubmitResponse> for CorrelationId {
    fn from(response: &SubmitResponse) -> Self {
        response.correlation_id.clone()
    }
}
