use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use spg_engine::{AccountApiError, CatalogApiError, OrderFlowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Missing signature header")]
    MissingSignature,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Missing or invalid operator id")]
    MissingOperatorId,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Payment provider error. {0}")]
    GatewayError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MissingSignature => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::MissingOperatorId => StatusCode::BAD_REQUEST,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::CheckoutError(e) => Self::InvalidRequest(e.to_string()),
            OrderFlowError::InvalidRequest(_) => Self::InvalidRequest(e.to_string()),
            OrderFlowError::OrderNotFound(_) | OrderFlowError::UnknownProduct(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::DuplicateOrderId(_) | OrderFlowError::InvalidTransition { .. } => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::PermissionDenied(s) => Self::InsufficientPermissions(s),
            OrderFlowError::InvoiceCreationFailed { ref source, .. } if source.is_auth_rejection() => {
                error!("🚨️ The payment provider rejected our API key. Check SPG_NOWPAYMENTS_API_KEY. {e}");
                Self::GatewayError(
                    "The payment provider is not configured correctly. Please contact the shop administrator."
                        .to_string(),
                )
            },
            OrderFlowError::InvoiceCreationFailed { .. } => Self::GatewayError(e.to_string()),
            OrderFlowError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::DatabaseError(s) => Self::BackendError(s),
            AccountApiError::QueryError(s) => Self::InvalidRequest(s),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(s) => Self::BackendError(s),
            CatalogApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::InvalidUpdate(s) => Self::InvalidRequest(s),
        }
    }
}
