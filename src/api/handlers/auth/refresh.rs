//! `POST /authserver/refresh`: rotate the access token of a pair.

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
use super::types::{ErrorResponse, Profile, RefreshRequest, RefreshResponse, UserResponse};
use super::utils::{generate_token, tokens_match};
use crate::model::TokenPairWithUser;
use crate::store::StoreError;

#[utoipa::path(
    post,
    path = "/authserver/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Access token rotated", body = RefreshResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Unknown client token (empty body) or invalid access token", body = ErrorResponse)
    ),
    tag = "authserver"
)]
pub async fn refresh(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    let request = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match rotate_access_token(&auth_state, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip_all)]
async fn rotate_access_token(
    state: &AuthState,
    request: RefreshRequest,
) -> Result<RefreshResponse, AuthError> {
    let TokenPairWithUser { token_pair, user } =
        match state.store().find_token_pair(&request.client_token).await {
            Ok(found) => found,
            Err(StoreError::NotFound) => return Err(AuthError::TokenNotFound),
            Err(err) => return Err(err.into()),
        };

    if !tokens_match(&request.access_token, &token_pair.access_token) {
        return Err(AuthError::TokenMismatch);
    }

    let profile = Profile::for_user(&user)?;
    let user_block = if request.request_user {
        Some(UserResponse::for_user(&user)?)
    } else {
        None
    };

    let access_token = generate_token()?;
    let rotated = state
        .store()
        .update_token_pair(
            &token_pair.client_token,
            &token_pair.access_token,
            &access_token,
            true,
        )
        .await?;
    if !rotated {
        debug!("Lost access token rotation race");
        return Err(AuthError::TokenMismatch);
    }

    Ok(RefreshResponse {
        access_token,
        client_token: token_pair.client_token,
        selected_profile: profile.clone(),
        available_profiles: vec![profile],
        user: user_block,
    })
}
