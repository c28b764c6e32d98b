//! In-process token store for tests and local development.
//!
//! A single mutex guards every map, so each operation is atomic with respect
//! to the others; this gives the same guarantees the PostgreSQL store gets from
//! row locks and conditional updates.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreError, TokenStore};
use crate::model::{TokenPair, TokenPairWithUser, User, UserWithTokens};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    token_pairs: HashMap<String, TokenPair>,
}

impl Inner {
    fn pairs_of(&self, user_uuid: Uuid) -> Vec<TokenPair> {
        let mut pairs: Vec<TokenPair> = self
            .token_pairs
            .values()
            .filter(|pair| pair.user_uuid == user_uuid)
            .cloned()
            .collect();
        pairs.sort_by(|a, b| a.client_token.cmp(&b.client_token));
        pairs
    }

    fn upsert_pairs(&mut self, user_uuid: Uuid, token_pairs: &[TokenPair]) {
        for pair in token_pairs {
            self.token_pairs.insert(
                pair.client_token.clone(),
                TokenPair {
                    user_uuid,
                    ..pair.clone()
                },
            );
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: Mutex<Inner>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_user_by_username(&self, username: &str) -> Result<UserWithTokens, StoreError> {
        let inner = self.inner.lock().await;
        let user = inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let token_pairs = inner.pairs_of(user.uuid);
        Ok(UserWithTokens { user, token_pairs })
    }

    async fn find_token_pair(&self, client_token: &str) -> Result<TokenPairWithUser, StoreError> {
        let inner = self.inner.lock().await;
        let token_pair = inner
            .token_pairs
            .get(client_token)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        let user = inner
            .users
            .get(&token_pair.user_uuid)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        Ok(TokenPairWithUser { token_pair, user })
    }

    async fn save_user(&self, user: &User, token_pairs: &[TokenPair]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.users.get_mut(&user.uuid) else {
            return Err(StoreError::NotFound);
        };
        *stored = user.clone();
        inner.upsert_pairs(user.uuid, token_pairs);
        Ok(())
    }

    async fn upsert_token_pairs(
        &self,
        user_uuid: Uuid,
        token_pairs: &[TokenPair],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&user_uuid) {
            return Err(StoreError::NotFound);
        }
        inner.upsert_pairs(user_uuid, token_pairs);
        Ok(())
    }

    async fn update_token_pair(
        &self,
        client_token: &str,
        expected_access_token: &str,
        access_token: &str,
        valid: bool,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.token_pairs.get_mut(client_token) {
            Some(pair) if pair.access_token == expected_access_token => {
                pair.access_token = access_token.to_string();
                pair.valid = valid;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn invalidate_user_tokens(&self, user_uuid: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&user_uuid) {
            return Err(StoreError::NotFound);
        }
        let mut touched = 0;
        for pair in inner
            .token_pairs
            .values_mut()
            .filter(|pair| pair.user_uuid == user_uuid)
        {
            pair.valid = false;
            touched += 1;
        }
        Ok(touched)
    }

    async fn invalidate_token_pair(&self, client_token: &str) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        Ok(inner
            .token_pairs
            .get_mut(client_token)
            .map_or(0, |pair| {
                pair.valid = false;
                1
            }))
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&user.uuid) {
            return Err(StoreError::Conflict(format!("uuid {}", user.uuid)));
        }
        if inner.users.values().any(|existing| {
            existing.username == user.username || existing.player_name == user.player_name
        }) {
            return Err(StoreError::Conflict(format!("username {}", user.username)));
        }
        inner.users.insert(user.uuid, user.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PreferredLanguage, SkinModel};

    fn user(username: &str) -> User {
        User {
            uuid: Uuid::new_v4(),
            username: username.to_string(),
            player_name: username.to_uppercase(),
            password_salt: vec![0; 16],
            password_hash: vec![0; 32],
            preferred_language: PreferredLanguage::default(),
            skin_hash: None,
            skin_model: SkinModel::default(),
            cape_hash: None,
            server_id: None,
            browser_token: None,
        }
    }

    fn pair(client_token: &str, access_token: &str, owner: &User) -> TokenPair {
        TokenPair {
            client_token: client_token.to_string(),
            access_token: access_token.to_string(),
            valid: true,
            user_uuid: owner.uuid,
        }
    }

    #[tokio::test]
    async fn lookups_miss_with_not_found() {
        let store = MemoryTokenStore::new();
        assert!(matches!(
            store.find_user_by_username("ghost").await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.find_token_pair("c1").await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn save_user_upserts_only_given_pairs() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        store.insert_user(&alice).await?;
        store
            .save_user(&alice, &[pair("c1", "a1", &alice), pair("c2", "a2", &alice)])
            .await?;
        store.invalidate_user_tokens(alice.uuid).await?;

        // A stale copy of c1 must not resurrect c2.
        store.save_user(&alice, &[pair("c1", "a3", &alice)]).await?;

        let loaded = store.find_user_by_username("alice").await?;
        assert_eq!(loaded.token_pairs.len(), 2);
        let c1 = loaded.token_pair("c1").map(|p| (p.access_token.clone(), p.valid));
        let c2 = loaded.token_pair("c2").map(|p| p.valid);
        assert_eq!(c1, Some(("a3".to_string(), true)));
        assert_eq!(c2, Some(false));
        Ok(())
    }

    #[tokio::test]
    async fn save_user_moves_foreign_client_token() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        let bob = user("bob");
        store.insert_user(&alice).await?;
        store.insert_user(&bob).await?;
        store.save_user(&alice, &[pair("shared", "a1", &alice)]).await?;
        store.save_user(&bob, &[pair("shared", "b1", &alice)]).await?;

        let found = store.find_token_pair("shared").await?;
        assert_eq!(found.user.username, "bob");
        assert_eq!(found.token_pair.user_uuid, bob.uuid);
        assert!(store.find_user_by_username("alice").await?.token_pairs.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn upsert_token_pairs_leaves_user_row_alone() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        store.insert_user(&alice).await?;
        let changed = User {
            preferred_language: PreferredLanguage::French,
            ..alice.clone()
        };
        store.save_user(&changed, &[pair("c1", "a1", &alice)]).await?;

        store
            .upsert_token_pairs(alice.uuid, &[pair("c1", "a2", &alice), pair("c2", "a3", &alice)])
            .await?;

        let loaded = store.find_user_by_username("alice").await?;
        assert_eq!(loaded.user.preferred_language, PreferredLanguage::French);
        assert_eq!(loaded.token_pairs.len(), 2);
        assert_eq!(
            loaded.token_pair("c1").map(|p| p.access_token.as_str()),
            Some("a2")
        );
        assert!(matches!(
            store.upsert_token_pairs(Uuid::new_v4(), &[]).await,
            Err(StoreError::NotFound)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn update_token_pair_is_compare_and_swap() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        store.insert_user(&alice).await?;
        store.save_user(&alice, &[pair("c1", "a1", &alice)]).await?;

        assert!(store.update_token_pair("c1", "a1", "a2", true).await?);
        assert!(!store.update_token_pair("c1", "a1", "a3", true).await?);
        assert!(!store.update_token_pair("missing", "a1", "a3", true).await?);

        let found = store.find_token_pair("c1").await?;
        assert_eq!(found.token_pair.access_token, "a2");
        Ok(())
    }

    #[tokio::test]
    async fn invalidation_counts_touched_pairs() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        let bob = user("bob");
        store.insert_user(&alice).await?;
        store.insert_user(&bob).await?;
        store
            .save_user(&alice, &[pair("c1", "a1", &alice), pair("c2", "a2", &alice)])
            .await?;
        store.save_user(&bob, &[pair("c3", "b1", &bob)]).await?;

        assert_eq!(store.invalidate_token_pair("c1").await?, 1);
        assert_eq!(store.invalidate_token_pair("missing").await?, 0);
        assert_eq!(store.invalidate_user_tokens(alice.uuid).await?, 2);
        assert!(matches!(
            store.invalidate_user_tokens(Uuid::new_v4()).await,
            Err(StoreError::NotFound)
        ));
        assert!(store.find_token_pair("c3").await?.token_pair.valid);
        Ok(())
    }

    #[tokio::test]
    async fn insert_user_rejects_duplicates() -> anyhow::Result<()> {
        let store = MemoryTokenStore::new();
        let alice = user("alice");
        store.insert_user(&alice).await?;
        assert!(matches!(
            store.insert_user(&alice).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.insert_user(&user("alice")).await,
            Err(StoreError::Conflict(_))
        ));
        store.ping().await?;
        Ok(())
    }
}
