//! `POST /authserver/signout`: invalidate every pair of a user by credentials.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::error::AuthError;
use super::state::AuthState;
use super::types::{ErrorResponse, SignoutRequest};
use super::utils::verify_credentials;

#[utoipa::path(
    post,
    path = "/authserver/signout",
    request_body = SignoutRequest,
    responses(
        (status = 204, description = "All token pairs of the user invalidated"),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "authserver"
)]
pub async fn signout(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<SignoutRequest>>,
) -> Response {
    let request = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match sign_out_user(&auth_state, &request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip_all, fields(username = %request.username))]
async fn sign_out_user(state: &AuthState, request: &SignoutRequest) -> Result<(), AuthError> {
    let found = verify_credentials(state, &request.username, &request.password).await?;
    let invalidated = state
        .store()
        .invalidate_user_tokens(found.user.uuid)
        .await?;
    debug!(invalidated, "Signed out user");
    Ok(())
}
