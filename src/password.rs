//! Salted scrypt password hashing.
//!
//! Hashes are raw 32-byte scrypt outputs stored next to a per-user salt. The
//! default cost (N=32768, r=8, p=1) must not change once hashes are stored:
//! the parameters are not persisted with the hash.

use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::task;

pub const SALT_LENGTH: usize = 16;
pub const HASH_LENGTH: usize = 32;

const DEFAULT_LOG_N: u8 = 15;
const DEFAULT_R: u32 = 8;
const DEFAULT_P: u32 = 1;

// Used to burn the same amount of work when the username does not exist.
const DUMMY_SALT: [u8; SALT_LENGTH] = [0x5a; SALT_LENGTH];

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("invalid scrypt parameters")]
    InvalidParams,
    #[error("invalid scrypt output length")]
    OutputLength,
    #[error("failed to generate salt: {0}")]
    Random(#[from] rand::Error),
    #[error("password hashing task failed: {0}")]
    Join(#[from] task::JoinError),
}

/// scrypt cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    log_n: u8,
    r: u32,
    p: u32,
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self {
            log_n: DEFAULT_LOG_N,
            r: DEFAULT_R,
            p: DEFAULT_P,
        }
    }
}

impl ScryptParams {
    #[must_use]
    pub const fn new(log_n: u8, r: u32, p: u32) -> Self {
        Self { log_n, r, p }
    }

    #[must_use]
    pub const fn n(&self) -> u64 {
        1 << self.log_n
    }

    fn to_scrypt(self) -> Result<scrypt::Params, PasswordError> {
        scrypt::Params::new(self.log_n, self.r, self.p, HASH_LENGTH)
            .map_err(|_| PasswordError::InvalidParams)
    }
}

/// Derive the password digest for `salt`.
///
/// # Errors
/// Returns an error if the parameters are rejected by scrypt.
pub fn hash_password(
    password: &str,
    salt: &[u8],
    params: ScryptParams,
) -> Result<Vec<u8>, PasswordError> {
    let scrypt_params = params.to_scrypt()?;
    let mut output = vec![0u8; HASH_LENGTH];
    scrypt::scrypt(password.as_bytes(), salt, &scrypt_params, &mut output)
        .map_err(|_| PasswordError::OutputLength)?;
    Ok(output)
}

/// Hash `password` and compare it with `expected_hash` in constant time.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn verify_password(
    password: &str,
    salt: &[u8],
    expected_hash: &[u8],
    params: ScryptParams,
) -> Result<bool, PasswordError> {
    let computed = hash_password(password, salt, params)?;
    Ok(bool::from(computed.as_slice().ct_eq(expected_hash)))
}

/// Credential check run on the blocking pool.
///
/// `stored` is the user's `(salt, hash)`; when `None` the password is hashed
/// against a dummy salt and the check fails, so unknown users cost the same as
/// wrong passwords.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn check_password(
    password: String,
    stored: Option<(Vec<u8>, Vec<u8>)>,
    params: ScryptParams,
) -> Result<bool, PasswordError> {
    task::spawn_blocking(move || match stored {
        Some((salt, hash)) => verify_password(&password, &salt, &hash, params),
        None => hash_password(&password, &DUMMY_SALT, params).map(|_| false),
    })
    .await?
}

/// Fresh random salt for a new password.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_salt() -> Result<Vec<u8>, PasswordError> {
    let mut salt = vec![0u8; SALT_LENGTH];
    OsRng.try_fill_bytes(&mut salt)?;
    Ok(salt)
}
