use crate::accounts::AccountError;
use crate::catalog::CatalogError;
use crate::commands::CommandError;
use crate::config::ConfigError;
use crate::integrations::IntegrationError;
use crate::lifecycle::LifecycleError;
use crate::payments::{ChargeError, PaymentError};
use crate::storage::DatabaseError;
use crate::telemetry::TelemetryError;
use crate::tenancy::TenancyError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Database(DatabaseError),
    Tenancy(TenancyError),
    Catalog(CatalogError),
    Account(AccountError),
    Lifecycle(LifecycleError),
    Charge(ChargeError),
    Integration(IntegrationError),
    Command(CommandError),
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Forbidden,
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Database(err) => database_status(err),
            AppError::Tenancy(TenancyError::Invalid(_)) => StatusCode::BAD_REQUEST,
            AppError::Tenancy(TenancyError::Database(err)) => database_status(err),
            AppError::Catalog(err) => match err {
                CatalogError::Invalid(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Conflict(_) => StatusCode::CONFLICT,
                CatalogError::Database(err) => database_status(err),
            },
            AppError::Account(err) => match err {
                AccountError::Invalid(_) => StatusCode::BAD_REQUEST,
                AccountError::UsernameTaken => StatusCode::CONFLICT,
                AccountError::InvalidCredentials | AccountError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                AccountError::Hashing(_) | AccountError::Signing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                AccountError::Database(err) => database_status(err),
            },
            AppError::Charge(err) => match err {
                ChargeError::NotFound => StatusCode::NOT_FOUND,
                ChargeError::AlreadyPaid => StatusCode::CONFLICT,
                ChargeError::Unavailable => StatusCode::BAD_REQUEST,
                ChargeError::NoTokens | ChargeError::Payment(PaymentError::Card(_)) => {
                    StatusCode::PAYMENT_REQUIRED
                }
                ChargeError::Payment(_) => StatusCode::BAD_GATEWAY,
                ChargeError::Lifecycle(_) => StatusCode::INTERNAL_SERVER_ERROR,
                ChargeError::Database(err) => database_status(err),
            },
            AppError::Integration(_) => StatusCode::BAD_GATEWAY,
            AppError::Command(CommandError::UnknownSite(_)) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Lifecycle(_)
            | AppError::Command(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to a client. Upstream failures are not echoed.
    fn public_message(&self) -> String {
        match self {
            AppError::Charge(ChargeError::Payment(PaymentError::Card(message))) => message.clone(),
            AppError::Charge(ChargeError::Payment(_)) => {
                "The payment could not be processed, please try again later".to_string()
            }
            AppError::Integration(_) => {
                "The request could not be completed, please try again later".to_string()
            }
            other if other.status().is_server_error() => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

fn database_status(err: &DatabaseError) -> StatusCode {
    match err {
        DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
        DatabaseError::Conflict(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Database(err) => write!(f, "database error: {}", err),
            AppError::Tenancy(err) => write!(f, "{}", err),
            AppError::Catalog(err) => write!(f, "{}", err),
            AppError::Account(err) => write!(f, "{}", err),
            AppError::Lifecycle(err) => write!(f, "lifecycle error: {}", err),
            AppError::Charge(err) => write!(f, "{}", err),
            AppError::Integration(err) => write!(f, "integration error: {}", err),
            AppError::Command(err) => write!(f, "{}", err),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::BadRequest(message) => write!(f, "{}", message),
            AppError::Unauthorized => write!(f, "authentication required"),
            AppError::Forbidden => write!(f, "you do not have permission to do that"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Database(err) => Some(err),
            AppError::Tenancy(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Account(err) => Some(err),
            AppError::Lifecycle(err) => Some(err),
            AppError::Charge(err) => Some(err),
            AppError::Integration(err) => Some(err),
            AppError::Command(err) => Some(err),
            AppError::NotFound(_)
            | AppError::BadRequest(_)
            | AppError::Unauthorized
            | AppError::Forbidden => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.public_message() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DatabaseError> for AppError {
    fn from(value: DatabaseError) -> Self {
        Self::Database(value)
    }
}

impl From<TenancyError> for AppError {
    fn from(value: TenancyError) -> Self {
        Self::Tenancy(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<AccountError> for AppError {
    fn from(value: AccountError) -> Self {
        Self::Account(value)
    }
}

impl From<LifecycleError> for AppError {
    fn from(value: LifecycleError) -> Self {
        Self::Lifecycle(value)
    }
}

impl From<ChargeError> for AppError {
    fn from(value: ChargeError) -> Self {
        Self::Charge(value)
    }
}

impl From<IntegrationError> for AppError {
    fn from(value: IntegrationError) -> Self {
        Self::Integration(value)
    }
}

impl From<CommandError> for AppError {
    fn from(value: CommandError) -> Self {
        Self::Command(value)
    }
}
