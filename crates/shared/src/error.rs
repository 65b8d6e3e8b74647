use thiserror::Error;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error: could not reach the analysis service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please choose a CSV file to upload.")]
    MissingFile,
    #[error("Please enter a report title.")]
    MissingTitle,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzeError {
    /// Non-2xx response. `message` is the server-supplied text or a status fallback.
    #[error("{message}")]
    Server { status: u16, message: String },
    /// No response at all. `detail` is kept for logs, never shown.
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network { detail: String },
    #[error("request was cancelled")]
    Cancelled,
}

impl AnalyzeError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::Network {
            detail: detail.into(),
        }
    }

    pub fn status_fallback(status: u16) -> Self {
        Self::server(status, format!("Request failed with status {status}"))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Everything that can put the form into its failed state.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error("Could not prepare the report for viewing: {0}")]
    Resource(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Server,
    Network,
    Cancelled,
    Resource,
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Analyze(AnalyzeError::Server { .. }) => ErrorKind::Server,
            Self::Analyze(AnalyzeError::Network { .. }) => ErrorKind::Network,
            Self::Analyze(AnalyzeError::Cancelled) => ErrorKind::Cancelled,
            Self::Resource(_) => ErrorKind::Resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_displays_server_message_verbatim() {
        assert_eq!(AnalyzeError::server(500, "bad data").to_string(), "bad data");
    }

    #[test]
    fn network_error_hides_transport_detail() {
        let err = AnalyzeError::network("tcp connect error: Connection refused");
        assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
        assert_ne!(err.to_string(), AnalyzeError::status_fallback(500).to_string());
    }

    #[test]
    fn status_fallback_embeds_status_code() {
        assert_eq!(
            AnalyzeError::status_fallback(502).to_string(),
            "Request failed with status 502"
        );
    }

    #[test]
    fn submit_error_kinds_follow_source() {
        let err: SubmitError = ValidationError::MissingTitle.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Please enter a report title.");

        let err: SubmitError = AnalyzeError::network("down").into();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
