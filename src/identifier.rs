//! Profile identifier codec.
//!
//! The Yggdrasil wire protocol exposes profile ids as 32 hex characters with no
//! hyphens, while users are stored under their canonical 36-character UUID.

use thiserror::Error;

const UUID_LENGTH: usize = 36;
const ID_LENGTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("invalid UUID: expected {UUID_LENGTH} characters, got {0}")]
    InvalidUuid(usize),
    #[error("invalid ID: expected {ID_LENGTH} characters, got {0}")]
    InvalidId(usize),
}

/// Strip the hyphens from a hyphenated UUID.
///
/// # Errors
/// Returns [`IdentifierError::InvalidUuid`] when `uuid` is not 36 characters long.
pub fn uuid_to_id(uuid: &str) -> Result<String, IdentifierError> {
    if uuid.len() != UUID_LENGTH {
        return Err(IdentifierError::InvalidUuid(uuid.len()));
    }
    Ok(uuid.replace('-', ""))
}

/// Reinsert hyphens at offsets 8, 12, 16 and 20 of a compact id.
///
/// # Errors
/// Returns [`IdentifierError::InvalidId`] when `id` is not 32 characters long
/// (or is not ASCII, which would make the offsets meaningless).
pub fn id_to_uuid(id: &str) -> Result<String, IdentifierError> {
    if id.len() != ID_LENGTH || !id.is_ascii() {
        return Err(IdentifierError::InvalidId(id.len()));
    }
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &id[0..8],
        &id[8..12],
        &id[12..16],
        &id[16..20],
        &id[20..]
    ))
}
