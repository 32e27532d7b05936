use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use loyalty_engine::{AccountApiError, EnrollmentError, WithdrawError};
use lpg_common::Cents;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(String),
    #[error("{0}")]
    InvalidOrderNumber(String),
    #[error("Order {0} has already been uploaded by another user")]
    OrderConflict(String),
    #[error("Cannot withdraw nothing")]
    EmptyWithdrawal,
    #[error("Invalid withdrawal amount. {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds. The balance is {balance}, but {requested} was requested")]
    InsufficientFunds { balance: Cents, requested: Cents },
    #[error("The service is shutting down. {0}")]
    ShuttingDown(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::EmptyWithdrawal => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::OrderConflict(_) => StatusCode::CONFLICT,
            Self::InvalidOrderNumber(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ShuttingDown(_) => StatusCode::SERVICE_UNAVAILABLE,
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

impl From<EnrollmentError> for ServerError {
    fn from(e: EnrollmentError) -> Self {
        match e {
            EnrollmentError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            EnrollmentError::DatabaseError(s) => Self::BackendError(s),
            EnrollmentError::QueueClosed(e) => Self::ShuttingDown(e.to_string()),
        }
    }
}

impl From<WithdrawError> for ServerError {
    fn from(e: WithdrawError) -> Self {
        match e {
            WithdrawError::InvalidOrderNumber(e) => Self::InvalidOrderNumber(e.to_string()),
            WithdrawError::EmptyBalance => Self::EmptyWithdrawal,
            WithdrawError::InvalidAmount(sum) => Self::InvalidAmount(format!("{sum} is not a valid amount")),
            WithdrawError::NoMoney { balance, requested } => Self::InsufficientFunds { balance, requested },
            WithdrawError::AccountNotFound(id) => Self::AuthenticationError(format!("Account #{id} does not exist")),
            WithdrawError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::InvalidLogin(_) => Self::AuthenticationError(e.to_string()),
            AccountApiError::AccountNotFound(_) => Self::AuthenticationError(e.to_string()),
            AccountApiError::DatabaseError(s) => Self::BackendError(format!("Database error: {s}")),
        }
    }
}
