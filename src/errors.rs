use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl From<crate::models::RegionError> for AppError {
    fn from(err: crate::models::RegionError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

/// Failure to obtain a series from the data source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("hit source request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("hit source answered {0}")]
    Status(reqwest::StatusCode),
    #[error("hit source returned an unreadable body: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("invalid hit source url: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err)
        } else if let Some(status) = err.status() {
            Self::Status(status)
        } else {
            Self::Transport(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{name} lists an invalid region: {source}")]
    Region {
        name: &'static str,
        #[source]
        source: crate::models::RegionError,
    },
}
