//! Token store: users and their token pairs.
//!
//! [`TokenStore`] is the single source of truth for session state. Handlers do
//! not cache anything between requests; every mutation is made atomic by the
//! store itself:
//!
//! - mutations scoped to a user's pair set (`save_user`, `upsert_token_pairs`,
//!   `invalidate_user_tokens`) lock the user row first, so concurrent
//!   Authenticate/Signout/Invalidate calls on the same user serialize;
//! - access token rotation (`update_token_pair`) is a compare-and-swap on the
//!   previous access token, so two concurrent refreshes cannot both win.

mod memory;
mod postgres;

pub use memory::MemoryTokenStore;
pub use postgres::PgTokenStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::model::{TokenPair, TokenPairWithUser, User, UserWithTokens};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("conflicting record: {0}")]
    Conflict(String),
    #[error("corrupt record: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Decode(source) => Self::Decode(source.to_string()),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Decode(format!("column {index}: {source}"))
            }
            sqlx::Error::Database(ref db_err)
                if db_err.code().is_some_and(|code| code.as_ref() == "23505") =>
            {
                Self::Conflict(db_err.message().to_string())
            }
            other => Self::Database(other),
        }
    }
}

impl StoreError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load a user and every token pair it owns.
    async fn find_user_by_username(&self, username: &str) -> Result<UserWithTokens, StoreError>;

    /// Load a token pair and its owner in one lookup.
    async fn find_token_pair(&self, client_token: &str) -> Result<TokenPairWithUser, StoreError>;

    /// Persist `user` and upsert `token_pairs` atomically.
    ///
    /// Only the given pairs are written; other pairs of the user are left
    /// as they are in the store. A pair whose client token currently belongs
    /// to another user is moved to `user`.
    async fn save_user(&self, user: &User, token_pairs: &[TokenPair]) -> Result<(), StoreError>;

    /// Upsert `token_pairs` for `user_uuid` under the user-row lock without
    /// writing any user column.
    ///
    /// Callers holding a user snapshot that may be stale use this instead of
    /// [`TokenStore::save_user`], so concurrent changes to the user survive.
    async fn upsert_token_pairs(
        &self,
        user_uuid: Uuid,
        token_pairs: &[TokenPair],
    ) -> Result<(), StoreError>;

    /// Replace the access token of a pair and set its validity, but only if
    /// the stored access token still equals `expected_access_token`.
    ///
    /// Returns `false` when the pair is missing or its token changed.
    async fn update_token_pair(
        &self,
        client_token: &str,
        expected_access_token: &str,
        access_token: &str,
        valid: bool,
    ) -> Result<bool, StoreError>;

    /// Mark every pair owned by `user_uuid` invalid. Returns the number of pairs touched.
    async fn invalidate_user_tokens(&self, user_uuid: Uuid) -> Result<u64, StoreError>;

    /// Mark a single pair invalid. Returns the number of pairs touched.
    async fn invalidate_token_pair(&self, client_token: &str) -> Result<u64, StoreError>;

    /// Create a user with no token pairs.
    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> Result<(), StoreError>;
}
