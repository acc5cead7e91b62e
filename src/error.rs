use thiserror::Error;

/// Code reported for every problem that is not an HTTP rejection by the API.
pub const LOCAL_ERROR_CODE: i32 = -1;

#[derive(Debug, Clone, Error)]
pub enum MeteosourceError {
    #[error("Invalid client configuration: {0}")]
    Config(String),

    #[error("Cannot use option '{0}'")]
    UnsupportedOption(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Passed datetime '{input}' is not valid; an ISO 8601 string (like YYYY-MM-DDTHH:mm:ss) or a zoned datetime is required")]
    BadDateTime { input: String },

    #[error("Unknown timezone '{0}'")]
    BadTimezone(String),

    #[error("Request to {url} failed: {detail}")]
    Transport { url: String, detail: String },

    #[error("Meteosource API rejected the request: {detail} (code {code})")]
    Remote { code: i32, detail: String },

    #[error("Unexpected response layout: {0}")]
    MalformedResponse(String),
}

impl MeteosourceError {
    /// HTTP status for remote rejections, [`LOCAL_ERROR_CODE`] for everything else.
    pub fn code(&self) -> i32 {
        match self {
            MeteosourceError::Remote { code, .. } => *code,
            _ => LOCAL_ERROR_CODE,
        }
    }

    /// The human-readable part of the error, without the code.
    pub fn detail(&self) -> String {
        match self {
            MeteosourceError::Remote { detail, .. } | MeteosourceError::Transport { detail, .. } => {
                detail.clone()
            }
            other => other.to_string(),
        }
    }

    pub(crate) fn bad_datetime(input: impl Into<String>) -> Self {
        MeteosourceError::BadDateTime {
            input: input.into(),
        }
    }
}
