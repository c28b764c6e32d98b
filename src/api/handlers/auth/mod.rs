//! Yggdrasil session protocol handlers.
//!
//! All five endpoints live under `/authserver` and share one [`AuthState`].
//! Session state is the set of token pairs in the store:
//!
//! - `authenticate` creates a pair, or re-keys the pair of a supplied client token;
//! - `refresh` rotates the access token of a pair (compare-and-swap);
//! - `validate` is a pure read;
//! - `signout` and `invalidate` flip `valid` to false, never delete.
//!
//! ## Invalidate scope
//!
//! `invalidate` revokes every pair owned by the user of the presented client
//! token by default. [`InvalidateScope::Pair`] narrows it to the presented pair.

pub mod authenticate;
mod error;
pub mod invalidate;
pub mod refresh;
pub mod signout;
mod state;
pub mod types;
mod utils;
pub mod validate;

pub use error::AuthError;
pub use state::{AuthConfig, AuthState, InvalidateScope};
