use thiserror::Error;

/// Input problems caught before anything is sent over the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported file format `{0}`, please upload a JPEG, PNG, PDF, or TIFF file")]
    UnsupportedFormat(String),

    #[error("please upload a valid file, the selected file is empty")]
    EmptyFile,

    #[error("a branch id is required")]
    MissingBranchId,

    #[error("branch id must be a positive integer, got `{0}`")]
    InvalidBranchId(String),

    #[error("unknown table `{0}`")]
    UnknownTable(String),
}

/// Errors returned by the upload and download clients.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered with a non-2xx status.
    #[error("request rejected with status {status}: {detail}")]
    RequestRejected { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response body: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Rejected,
    Transport,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::RequestRejected { .. } => ErrorKind::Rejected,
            ClientError::Transport(_) | ClientError::MalformedResponse(_) => ErrorKind::Transport,
        }
    }

    /// Builds a rejection from a non-2xx response body.
    ///
    /// Prefers a JSON `detail` string, then a non-empty plain text body, then `fallback`.
    pub fn rejected(status: u16, body: &[u8], fallback: &str) -> Self {
        let from_json = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string));

        let detail = match from_json {
            Some(detail) => detail,
            None => match std::str::from_utf8(body).map(str::trim) {
                Ok(text) if !text.is_empty() && !text.starts_with('{') => {
                    text.to_string()
                }
                _ => fallback.to_string(),
            },
        };

        ClientError::RequestRejected { status, detail }
    }

    /// The server supplied detail, if this is a rejection.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::RequestRejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
