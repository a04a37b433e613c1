use thiserror::Error;

/// Failures raised by the voice, persona and session round-trips.
///
/// Round-trip failures are caught at the boundary of the operation that
/// raised them and turned into a log event or a transient status; none
/// escape to the surrounding UI shell. `HttpClient` is only raised when
/// building a `BackendClient`.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Audio input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Request to {endpoint} failed: {reason}")]
    NetworkFailure {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Malformed response from {endpoint}: {reason}")]
    MalformedResponse {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    #[error("Failed to encode audio artifact: {0}")]
    Encoding(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl ClientError {
    pub(crate) fn network(endpoint: &'static str, reason: impl ToString) -> Self {
        Self::NetworkFailure {
            endpoint,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(endpoint: &'static str, reason: impl ToString) -> Self {
        Self::MalformedResponse {
            endpoint,
            reason: reason.to_string(),
        }
    }
}

impl From<hound::Error> for ClientError {
    fn from(err: hound::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

/// Rejected persona edit transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("No persona record has been loaded yet")]
    NoRecord,

    #[error("Persona is not in edit mode")]
    NotEditing,

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("Field '{key}' expects a number, got '{raw}'")]
    InvalidNumber { key: String, raw: String },

    #[error("Field '{key}' expects 'true' or 'false', got '{raw}'")]
    InvalidBool { key: String, raw: String },
}
