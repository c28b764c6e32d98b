//! Token generation and credential checks shared by the auth handlers.

use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use tracing::debug;

use super::error::AuthError;
use super::state::AuthState;
use crate::model::{UserWithTokens, validate_password, validate_username};
use crate::password::check_password;
use crate::store::StoreError;

/// Bytes of entropy in client and access tokens.
const TOKEN_BYTES: usize = 16;

/// Random bytes, hex-encoded (so `2 * n` characters).
pub(super) fn random_hex(n: usize) -> Result<String, rand::Error> {
    let mut bytes = vec![0u8; n];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// New opaque client or access token.
pub(super) fn generate_token() -> Result<String, rand::Error> {
    random_hex(TOKEN_BYTES)
}

pub(super) fn tokens_match(presented: &str, stored: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(stored.as_bytes()))
}

/// Load the user and verify the password.
///
/// Every failure that reveals nothing but "wrong credentials" collapses into
/// [`AuthError::CredentialMismatch`]; unknown users still pay for a hash.
pub(super) async fn verify_credentials(
    state: &AuthState,
    username: &str,
    password: &str,
) -> Result<UserWithTokens, AuthError> {
    if validate_username(username).is_err() || validate_password(password).is_err() {
        debug!("Rejected malformed credentials");
        return Err(AuthError::CredentialMismatch);
    }

    let params = state.config().scrypt_params();
    let found = match state.store().find_user_by_username(username).await {
        Ok(found) => Some(found),
        Err(StoreError::NotFound) => None,
        Err(err) => return Err(err.into()),
    };

    let stored = found
        .as_ref()
        .map(|found| (found.user.password_salt.clone(), found.user.password_hash.clone()));
    let matches = check_password(password.to_string(), stored, params).await?;

    match found {
        Some(found) if matches => Ok(found),
        _ => Err(AuthError::CredentialMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hex_has_expected_shape() -> Result<(), rand::Error> {
        let token = random_hex(16)?;
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_token()?, generate_token()?);
        assert_eq!(random_hex(0)?, "");
        Ok(())
    }

    #[test]
    fn tokens_match_is_exact() {
        assert!(tokens_match("abc", "abc"));
        assert!(!tokens_match("abc", "abd"));
        assert!(!tokens_match("abc", "abcd"));
        assert!(!tokens_match("", "abc"));
    }
}
