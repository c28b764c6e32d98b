//! `POST /authserver/validate`: check that a token pair is usable.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use super::error::AuthError;
use super::state::AuthState;
use super::types::TokenRequest;
use super::utils::tokens_match;
use crate::store::StoreError;

#[utoipa::path(
    post,
    path = "/authserver/validate",
    request_body = TokenRequest,
    responses(
        (status = 204, description = "Token pair is valid"),
        (status = 400, description = "Missing payload", body = String),
        (status = 403, description = "Token pair is unknown, invalid or mismatched")
    ),
    tag = "authserver"
)]
pub async fn validate(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<TokenRequest>>,
) -> Response {
    let request = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match validate_token_pair(&auth_state, &request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Read-only; store failures are reported as a plain validation failure.
#[instrument(skip_all)]
async fn validate_token_pair(state: &AuthState, request: &TokenRequest) -> Result<(), AuthError> {
    let found = match state.store().find_token_pair(&request.client_token).await {
        Ok(found) => found,
        Err(StoreError::NotFound) => return Err(AuthError::ValidationFailure),
        Err(err) => {
            error!("Token store failure during validate: {err}");
            return Err(AuthError::ValidationFailure);
        }
    };

    if found.token_pair.valid && tokens_match(&request.access_token, &found.token_pair.access_token)
    {
        Ok(())
    } else {
        Err(AuthError::ValidationFailure)
    }
}
