//! Auth state and configuration.

use std::{fmt, str::FromStr, sync::Arc};

use crate::password::ScryptParams;
use crate::store::TokenStore;

/// How far `/authserver/invalidate` reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidateScope {
    /// Every pair owned by the user of the presented client token.
    #[default]
    User,
    /// Only the presented pair.
    Pair,
}

impl InvalidateScope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Pair => "pair",
        }
    }
}

impl fmt::Display for InvalidateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvalidateScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "pair" => Ok(Self::Pair),
            other => Err(format!("unknown invalidate scope: {other}")),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    invalidate_scope: InvalidateScope,
    scrypt_params: ScryptParams,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_invalidate_scope(mut self, scope: InvalidateScope) -> Self {
        self.invalidate_scope = scope;
        self
    }

    /// Only tests should lower the cost; stored hashes depend on the default.
    #[must_use]
    pub fn with_scrypt_params(mut self, params: ScryptParams) -> Self {
        self.scrypt_params = params;
        self
    }

    #[must_use]
    pub fn invalidate_scope(&self) -> InvalidateScope {
        self.invalidate_scope
    }

    #[must_use]
    pub fn scrypt_params(&self) -> ScryptParams {
        self.scrypt_params
    }
}

/// Shared handler context, attached to the router as an `Extension`.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn TokenStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn TokenStore>) -> Self {
        Self { config, store }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
