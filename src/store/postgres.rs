//! PostgreSQL token store.

use async_trait::async_trait;
use sqlx::{Connection, FromRow, PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::{StoreError, TokenStore};
use crate::model::{TokenPair, TokenPairWithUser, User, UserWithTokens};

const USER_COLUMNS: &str = "users.uuid, users.username, users.player_name, \
    users.password_salt, users.password_hash, users.preferred_language, \
    users.skin_hash, users.skin_model, users.cape_hash, users.server_id, \
    users.browser_token";

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let preferred_language: String = row.try_get("preferred_language")?;
        let skin_model: String = row.try_get("skin_model")?;
        Ok(Self {
            uuid: row.try_get("uuid")?,
            username: row.try_get("username")?,
            player_name: row.try_get("player_name")?,
            password_salt: row.try_get("password_salt")?,
            password_hash: row.try_get("password_hash")?,
            preferred_language: preferred_language
                .parse()
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            skin_hash: row.try_get("skin_hash")?,
            skin_model: skin_model
                .parse()
                .map_err(|err| sqlx::Error::Decode(Box::new(err)))?,
            cape_hash: row.try_get("cape_hash")?,
            server_id: row.try_get("server_id")?,
            browser_token: row.try_get("browser_token")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TokenPair {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            client_token: row.try_get("client_token")?,
            access_token: row.try_get("access_token")?,
            valid: row.try_get("valid")?,
            user_uuid: row.try_get("user_uuid")?,
        })
    }
}

fn db_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Locks the user row for the rest of the transaction.
async fn lock_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_uuid: Uuid,
) -> Result<(), StoreError> {
    let query = "SELECT uuid FROM users WHERE uuid = $1 FOR UPDATE";
    let row = sqlx::query(query)
        .bind(user_uuid)
        .fetch_optional(&mut **tx)
        .instrument(db_span("SELECT", query))
        .await?;
    if row.is_none() {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

/// Insert or re-key pairs by client token; every pair ends up owned by `user_uuid`.
async fn upsert_pairs(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_uuid: Uuid,
    token_pairs: &[TokenPair],
) -> Result<(), StoreError> {
    let query = r"
        INSERT INTO token_pairs (client_token, access_token, valid, user_uuid)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (client_token) DO UPDATE SET
            access_token = EXCLUDED.access_token,
            valid = EXCLUDED.valid,
            user_uuid = EXCLUDED.user_uuid
    ";
    for pair in token_pairs {
        sqlx::query(query)
            .bind(&pair.client_token)
            .bind(&pair.access_token)
            .bind(pair.valid)
            .bind(user_uuid)
            .execute(&mut **tx)
            .instrument(db_span("INSERT", query))
            .await?;
    }
    Ok(())
}

#[derive(Clone, Debug)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TokenStore for PgTokenStore {
    async fn find_user_by_username(&self, username: &str) -> Result<UserWithTokens, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE users.username = $1");
        let row = sqlx::query(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?
            .ok_or(StoreError::NotFound)?;
        let user = User::from_row(&row)?;

        let query = r"
            SELECT client_token, access_token, valid, user_uuid
            FROM token_pairs
            WHERE user_uuid = $1
            ORDER BY client_token
        ";
        let token_pairs = sqlx::query_as::<_, TokenPair>(query)
            .bind(user.uuid)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", query))
            .await?;

        Ok(UserWithTokens { user, token_pairs })
    }

    async fn find_token_pair(&self, client_token: &str) -> Result<TokenPairWithUser, StoreError> {
        let query = format!(
            "SELECT token_pairs.client_token, token_pairs.access_token, token_pairs.valid, \
             token_pairs.user_uuid, {USER_COLUMNS} \
             FROM token_pairs JOIN users ON users.uuid = token_pairs.user_uuid \
             WHERE token_pairs.client_token = $1"
        );
        let row = sqlx::query(&query)
            .bind(client_token)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(TokenPairWithUser {
            token_pair: TokenPair::from_row(&row)?,
            user: User::from_row(&row)?,
        })
    }

    async fn save_user(&self, user: &User, token_pairs: &[TokenPair]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user.uuid).await?;

        let query = r"
            UPDATE users SET
                username = $2,
                player_name = $3,
                password_salt = $4,
                password_hash = $5,
                preferred_language = $6,
                skin_hash = $7,
                skin_model = $8,
                cape_hash = $9,
                server_id = $10,
                browser_token = $11,
                updated_at = NOW()
            WHERE uuid = $1
        ";
        sqlx::query(query)
            .bind(user.uuid)
            .bind(&user.username)
            .bind(&user.player_name)
            .bind(&user.password_salt)
            .bind(&user.password_hash)
            .bind(user.preferred_language.as_str())
            .bind(&user.skin_hash)
            .bind(user.skin_model.as_str())
            .bind(&user.cape_hash)
            .bind(&user.server_id)
            .bind(&user.browser_token)
            .execute(&mut *tx)
            .instrument(db_span("UPDATE", query))
            .await?;

        upsert_pairs(&mut tx, user.uuid, token_pairs).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_token_pairs(
        &self,
        user_uuid: Uuid,
        token_pairs: &[TokenPair],
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_uuid).await?;
        upsert_pairs(&mut tx, user_uuid, token_pairs).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_token_pair(
        &self,
        client_token: &str,
        expected_access_token: &str,
        access_token: &str,
        valid: bool,
    ) -> Result<bool, StoreError> {
        let query = r"
            UPDATE token_pairs
            SET access_token = $3, valid = $4
            WHERE client_token = $1 AND access_token = $2
        ";
        let result = sqlx::query(query)
            .bind(client_token)
            .bind(expected_access_token)
            .bind(access_token)
            .bind(valid)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn invalidate_user_tokens(&self, user_uuid: Uuid) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        lock_user(&mut tx, user_uuid).await?;

        let query = "UPDATE token_pairs SET valid = FALSE WHERE user_uuid = $1";
        let result = sqlx::query(query)
            .bind(user_uuid)
            .execute(&mut *tx)
            .instrument(db_span("UPDATE", query))
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn invalidate_token_pair(&self, client_token: &str) -> Result<u64, StoreError> {
        let query = "UPDATE token_pairs SET valid = FALSE WHERE client_token = $1";
        let result = sqlx::query(query)
            .bind(client_token)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let query = r"
            INSERT INTO users
                (uuid, username, player_name, password_salt, password_hash,
                 preferred_language, skin_hash, skin_model, cape_hash, server_id,
                 browser_token)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ";
        sqlx::query(query)
            .bind(user.uuid)
            .bind(&user.username)
            .bind(&user.player_name)
            .bind(&user.password_salt)
            .bind(&user.password_hash)
            .bind(user.preferred_language.as_str())
            .bind(&user.skin_hash)
            .bind(user.skin_model.as_str())
            .bind(&user.cape_hash)
            .bind(&user.server_id)
            .bind(&user.browser_token)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping()
            .instrument(db_span("PING", "ping"))
            .await?;
        Ok(())
    }
}
