//! Users and token pairs as stored by the token store.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

use crate::identifier::{IdentifierError, uuid_to_id};

/// Longest accepted player name (and username).
pub const MAX_PLAYER_NAME_LENGTH: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("can't be blank")]
    Blank,
    #[error("can't be longer than {MAX_PLAYER_NAME_LENGTH} characters")]
    TooLong,
}

/// # Errors
/// Returns an error if the name is empty or longer than [`MAX_PLAYER_NAME_LENGTH`].
pub fn validate_player_name(player_name: &str) -> Result<(), ValidationError> {
    if player_name.is_empty() {
        return Err(ValidationError::Blank);
    }
    if player_name.len() > MAX_PLAYER_NAME_LENGTH {
        return Err(ValidationError::TooLong);
    }
    Ok(())
}

/// Usernames follow the same rules as player names.
///
/// # Errors
/// Returns an error if the username is empty or too long.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    validate_player_name(username)
}

/// # Errors
/// Returns an error if the password is empty.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Blank);
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

macro_rules! language_codes {
    ($($variant:ident => $code:literal),+ $(,)?) => {
        /// Language codes accepted for a user's `preferredLanguage` property.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum PreferredLanguage {
            $($variant,)+
        }

        impl PreferredLanguage {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl FromStr for PreferredLanguage {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: "preferred language",
                        value: value.to_string(),
                    }),
                }
            }
        }
    };
}

language_codes! {
    Albanian => "sq",
    Arabic => "ar",
    Belarusian => "be",
    Bulgarian => "bg",
    Catalan => "ca",
    Chinese => "zh",
    Croatian => "hr",
    Czech => "cs",
    Danish => "da",
    Dutch => "nl",
    English => "en",
    Estonian => "et",
    Finnish => "fi",
    French => "fr",
    German => "de",
    Greek => "el",
    Hebrew => "iw",
    Hindi => "hi",
    Hungarian => "hu",
    Icelandic => "is",
    Indonesian => "in",
    Irish => "ga",
    Italian => "it",
    Japanese => "ja",
    Korean => "ko",
    Latvian => "lv",
    Lithuanian => "lt",
    Macedonian => "mk",
    Malay => "ms",
    Maltese => "mt",
    Norwegian => "no",
    NorwegianBokmal => "nb",
    NorwegianNynorsk => "nn",
    Polish => "pl",
    Portuguese => "pt",
    Romanian => "ro",
    Russian => "ru",
    Serbian => "sr",
    Slovak => "sk",
    Slovenian => "sl",
    Spanish => "es",
    Swedish => "sv",
    Thai => "th",
    Turkish => "tr",
    Ukrainian => "uk",
    Vietnamese => "vi",
}

impl Default for PreferredLanguage {
    fn default() -> Self {
        Self::English
    }
}

impl fmt::Display for PreferredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PreferredLanguage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PreferredLanguage {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinModel {
    #[default]
    Classic,
    Slim,
}

impl SkinModel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Slim => "slim",
        }
    }
}

impl FromStr for SkinModel {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "classic" => Ok(Self::Classic),
            "slim" => Ok(Self::Slim),
            _ => Err(UnknownVariant {
                kind: "skin model",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub uuid: Uuid,
    pub username: String,
    pub player_name: String,
    pub password_salt: Vec<u8>,
    pub password_hash: Vec<u8>,
    pub preferred_language: PreferredLanguage,
    pub skin_hash: Option<String>,
    pub skin_model: SkinModel,
    pub cape_hash: Option<String>,
    /// Legacy join-server marker.
    pub server_id: Option<String>,
    pub browser_token: Option<String>,
}

impl User {
    /// Compact (hyphen-less) profile id used on the wire.
    ///
    /// # Errors
    /// Fails only if the stored identity is not a canonical UUID.
    pub fn profile_id(&self) -> Result<String, IdentifierError> {
        uuid_to_id(&self.uuid.hyphenated().to_string())
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("uuid", &self.uuid)
            .field("username", &self.username)
            .field("player_name", &self.player_name)
            .field("password_salt", &"***")
            .field("password_hash", &"***")
            .field("preferred_language", &self.preferred_language)
            .field("skin_hash", &self.skin_hash)
            .field("skin_model", &self.skin_model)
            .field("cape_hash", &self.cape_hash)
            .field("server_id", &self.server_id)
            .field("browser_token", &self.browser_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// One device session: a stable client token and its current access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub client_token: String,
    pub access_token: String,
    pub valid: bool,
    pub user_uuid: Uuid,
}

/// A user together with every token pair it owns.
#[derive(Debug, Clone)]
pub struct UserWithTokens {
    pub user: User,
    pub token_pairs: Vec<TokenPair>,
}

impl UserWithTokens {
    #[must_use]
    pub fn token_pair(&self, client_token: &str) -> Option<&TokenPair> {
        self.token_pairs
            .iter()
            .find(|pair| pair.client_token == client_token)
    }
}

/// A token pair loaded together with its owner.
#[derive(Debug, Clone)]
pub struct TokenPairWithUser {
    pub token_pair: TokenPair,
    pub user: User,
}
