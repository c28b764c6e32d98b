//! Protocol errors and their HTTP rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use super::types::ErrorResponse;
use crate::identifier::IdentifierError;
use crate::password::PasswordError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown user, wrong password or input rejected by the validators.
    #[error("invalid credentials")]
    CredentialMismatch,
    #[error("client token not found")]
    TokenNotFound,
    #[error("access token does not match")]
    TokenMismatch,
    #[error("token pair is not valid")]
    ValidationFailure,
    #[error("token store failure: {0}")]
    Store(#[from] StoreError),
    #[error("corrupted identity record: {0}")]
    Identifier(#[from] IdentifierError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<rand::Error> for AuthError {
    fn from(err: rand::Error) -> Self {
        Self::Internal(format!("random source failed: {err}"))
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::CredentialMismatch => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::invalid_credentials()),
            )
                .into_response(),
            Self::TokenNotFound => StatusCode::UNAUTHORIZED.into_response(),
            Self::TokenMismatch => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::invalid_token()),
            )
                .into_response(),
            Self::ValidationFailure => StatusCode::FORBIDDEN.into_response(),
            Self::Store(err) => {
                error!("Token store failure: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Identifier(err) => {
                error!("Corrupted identity record: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            Self::Internal(message) => {
                error!("Internal auth error: {message}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
