//! Error type for the topology server.
//!
//! Errors are grouped into kinds rather than typed per call site. Input errors
//! are raised before any store call; schema and store failures propagate as-is;
//! business-rule rejections carry their own codes so clients can render them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cmdb_condition::ConditionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("object schema not found: {0}")]
    SchemaNotFound(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid status value '{0}', expected 'enabled' or 'disabled'")]
    InvalidStatusValue(String),

    #[error("business {biz_id} is still referenced by {references} association(s)")]
    StillReferenced { biz_id: i64, references: i64 },

    #[error("invalid field list: {0}")]
    InvalidFieldList(String),

    #[error("malformed condition: {0}")]
    MalformedCondition(#[from] ConditionError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("a default business already exists for owner '{0}'")]
    DefaultBusinessExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification callers can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed client input, detected before touching any store.
    Input,
    /// Request was well-formed but violates a business rule.
    BusinessRule,
    NotFound,
    /// Collaborator (schema resolver, store) or server failure.
    Infrastructure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameter(_)
            | Error::InvalidStatusValue(_)
            | Error::InvalidFieldList(_)
            | Error::MalformedCondition(_) => ErrorKind::Input,
            Error::StillReferenced { .. } | Error::DefaultBusinessExists(_) => {
                ErrorKind::BusinessRule
            }
            Error::NotFound(_) | Error::SchemaNotFound(_) => ErrorKind::NotFound,
            Error::Database(_) | Error::Migration(_) | Error::Internal(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaNotFound(_) => "SCHEMA_NOT_FOUND",
            Error::InvalidParameter(_) => "INVALID_PARAMETER",
            Error::InvalidStatusValue(_) => "INVALID_STATUS_VALUE",
            Error::StillReferenced { .. } => "STILL_REFERENCED",
            Error::InvalidFieldList(_) => "INVALID_FIELD_LIST",
            Error::MalformedCondition(_) => "MALFORMED_CONDITION",
            Error::NotFound(_) => "NOT_FOUND",
            Error::DefaultBusinessExists(_) => "DEFAULT_BUSINESS_EXISTS",
            Error::Database(_) | Error::Migration(_) | Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Input => StatusCode::BAD_REQUEST,
            ErrorKind::BusinessRule => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Infrastructure details stay in the server log.
        let message = match self.kind() {
            ErrorKind::Infrastructure => {
                tracing::error!(error = %self, "request failed");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}
