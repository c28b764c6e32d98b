//! Request/response types for the `/authserver` endpoints.
//!
//! Field names follow the Yggdrasil wire format (camelCase). Optional response
//! fields are omitted from the JSON rather than sent as `null`.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::identifier::IdentifierError;
use crate::model::User;

pub const FORBIDDEN_OPERATION: &str = "ForbiddenOperationException";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials. Invalid username or password.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token.";

/// Game agent a client authenticates for, e.g. `{"name": "Minecraft", "version": 1}`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Default)]
pub struct Agent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: u32,
}

#[derive(ToSchema, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<Agent>,
    #[serde(default)]
    pub request_user: bool,
}

impl fmt::Debug for AuthenticateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticateRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .field("client_token", &self.client_token)
            .field("agent", &self.agent)
            .field("request_user", &self.request_user)
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateResponse {
    pub access_token: String,
    pub client_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_profiles: Option<Vec<Profile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub access_token: String,
    pub client_token: String,
    #[serde(default)]
    pub request_user: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub client_token: String,
    pub selected_profile: Profile,
    pub available_profiles: Vec<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Body of `/authserver/validate` and `/authserver/invalidate`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub access_token: String,
    pub client_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Clone)]
pub struct SignoutRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SignoutRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignoutRequest")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Compact (hyphen-less) profile id.
    pub id: String,
    pub name: String,
}

impl Profile {
    /// # Errors
    /// Fails if the user's stored identity is not a canonical UUID.
    pub fn for_user(user: &User) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: user.profile_id()?,
            name: user.player_name.clone(),
        })
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProperty {
    pub name: String,
    pub value: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserResponse {
    pub id: String,
    pub properties: Vec<UserProperty>,
}

impl UserResponse {
    /// # Errors
    /// Fails if the user's stored identity is not a canonical UUID.
    pub fn for_user(user: &User) -> Result<Self, IdentifierError> {
        Ok(Self {
            id: user.profile_id()?,
            properties: vec![UserProperty {
                name: "preferredLanguage".to_string(),
                value: user.preferred_language.to_string(),
            }],
        })
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub error_message: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self {
            error: FORBIDDEN_OPERATION.to_string(),
            error_message: INVALID_CREDENTIALS_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_token() -> Self {
        Self {
            error: FORBIDDEN_OPERATION.to_string(),
            error_message: INVALID_TOKEN_MESSAGE.to_string(),
        }
    }
}
