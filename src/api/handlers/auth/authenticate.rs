//! `POST /authserver/authenticate`: exchange credentials for a token pair.

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
use super::types::{
    AuthenticateRequest, AuthenticateResponse, ErrorResponse, Profile, UserResponse,
};
use super::utils::{generate_token, verify_credentials};
use crate::model::{TokenPair, UserWithTokens};

#[utoipa::path(
    post,
    path = "/authserver/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Token pair issued", body = AuthenticateResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "authserver"
)]
pub async fn authenticate(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AuthenticateRequest>>,
) -> Response {
    let request = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match issue_token_pair(&auth_state, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip_all, fields(username = %request.username))]
async fn issue_token_pair(
    state: &AuthState,
    request: AuthenticateRequest,
) -> Result<AuthenticateResponse, AuthError> {
    let UserWithTokens { user, token_pairs } =
        verify_credentials(state, &request.username, &request.password).await?;

    let (selected_profile, available_profiles) = if request.agent.is_some() {
        let profile = Profile::for_user(&user)?;
        (Some(profile.clone()), Some(vec![profile]))
    } else {
        (None, None)
    };
    let user_block = if request.request_user {
        Some(UserResponse::for_user(&user)?)
    } else {
        None
    };

    let access_token = generate_token()?;
    let client_token = match request.client_token {
        Some(client_token) => client_token,
        None => generate_token()?,
    };

    // A known client token keeps its pair and only gets a fresh access token;
    // an unknown one (supplied or generated) starts a new pair. Both are one upsert.
    // The user snapshot predates the password check, so only the pair is written.
    let reused = token_pairs
        .iter()
        .any(|pair| pair.client_token == client_token);
    let pair = TokenPair {
        client_token: client_token.clone(),
        access_token: access_token.clone(),
        valid: true,
        user_uuid: user.uuid,
    };
    state
        .store()
        .upsert_token_pairs(user.uuid, &[pair])
        .await?;
    debug!(reused, "Issued token pair");

    Ok(AuthenticateResponse {
        access_token,
        client_token,
        selected_profile,
        available_profiles,
        user: user_block,
    })
}
