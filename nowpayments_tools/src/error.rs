use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum NowPaymentsApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The API key was rejected. Error {status}. {message}")]
    AuthenticationRejected { status: u16, message: String },
    #[error("The request timed out: {0}")]
    Timeout(String),
    #[error("Could not reach the API: {0}")]
    ConnectionError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("The response has neither an invoice id nor a payment URL: {0}")]
    MalformedResponse(String),
}

impl NowPaymentsApiError {
    /// Timeouts, connection failures, rate limiting and server errors are worth retrying. Everything else will fail
    /// the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            NowPaymentsApiError::Timeout(_) | NowPaymentsApiError::ConnectionError(_) => true,
            NowPaymentsApiError::QueryError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NowPaymentsApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NowPaymentsApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            NowPaymentsApiError::JsonError(e.to_string())
        } else {
            NowPaymentsApiError::ConnectionError(e.to_string())
        }
    }
}
