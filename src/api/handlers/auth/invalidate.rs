//! `POST /authserver/invalidate`: revoke sessions by client token.
//!
//! The access token is accepted but not checked. Revoking an unknown client
//! token succeeds, so the endpoint is idempotent.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

use super::error::AuthError;
use super::state::{AuthState, InvalidateScope};
use super::types::TokenRequest;
use crate::store::StoreError;

#[utoipa::path(
    post,
    path = "/authserver/invalidate",
    request_body = TokenRequest,
    responses(
        (status = 204, description = "Token pairs invalidated"),
        (status = 400, description = "Missing payload", body = String),
        (status = 500, description = "Token store failure")
    ),
    tag = "authserver"
)]
pub async fn invalidate(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<TokenRequest>>,
) -> Response {
    let request = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match revoke(&auth_state, &request).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip_all, fields(scope = %state.config().invalidate_scope()))]
async fn revoke(state: &AuthState, request: &TokenRequest) -> Result<(), AuthError> {
    let found = match state.store().find_token_pair(&request.client_token).await {
        Ok(found) => found,
        Err(StoreError::NotFound) => {
            debug!("Unknown client token, nothing to invalidate");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let result = match state.config().invalidate_scope() {
        InvalidateScope::User => {
            state
                .store()
                .invalidate_user_tokens(found.token_pair.user_uuid)
                .await
        }
        InvalidateScope::Pair => {
            state
                .store()
                .invalidate_token_pair(&found.token_pair.client_token)
                .await
        }
    };

    match result {
        Ok(invalidated) => {
            debug!(invalidated, "Invalidated token pairs");
            Ok(())
        }
        // The owner or pair vanished after the lookup.
        Err(StoreError::NotFound) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
