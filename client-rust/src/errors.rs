use thiserror::Error;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RouterError {
    /// The submission was rejected before any request was made
    /// (e.g. an empty question or a non-image file).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request never completed or its body could not be read as JSON.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxedError),
    /// The request returns a non-OK status code
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
    /// The backend answered with a success status but an unexpected body.
    #[error("Invariant: {0}")]
    Invariant(String),
}

impl RouterError {
    pub fn transport(error: impl Into<BoxedError>) -> Self {
        Self::Transport(error.into())
    }

    /// Whether the failure happened before a well-formed response arrived.
    /// Only these failures are eligible for the offline fallback.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for RouterError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(Box::new(error))
    }
}

pub type RouterResult<T> = Result<T, RouterError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Location request timed out")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_errors_are_fallback_eligible() {
        assert!(RouterError::transport("connection refused").is_transport());
        assert!(!RouterError::InvalidInput("empty".into()).is_transport());
        assert!(
            !RouterError::StatusCode(reqwest::StatusCode::BAD_GATEWAY, "down".into())
                .is_transport()
        );
        assert!(!RouterError::Invariant("no answer".into()).is_transport());
    }

    #[test]
    fn status_error_displays_message_and_code() {
        let error = RouterError::StatusCode(reqwest::StatusCode::NOT_FOUND, "missing".into());
        assert_eq!(error.to_string(), "Status error: missing (Status 404 Not Found)");
    }
}
