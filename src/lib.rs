//! # Yggauth (Yggdrasil authentication server)
//!
//! `yggauth` implements the token-based login protocol Minecraft launchers speak
//! with an authentication server: `authenticate`, `refresh`, `validate`,
//! `signout` and `invalidate` under `/authserver`.
//!
//! ## Sessions
//!
//! A user owns any number of token pairs. Each pair is keyed by a launcher
//! chosen **client token** and carries the current **access token** plus a
//! validity flag. Authenticating with a known client token replaces its access
//! token in place, so one launcher installation holds one pair.
//!
//! ## Storage
//!
//! Users and token pairs live in PostgreSQL (`sql/schema.sql`). Handlers never
//! cache session state; concurrent requests on the same user are serialized by
//! row locks, and access token rotation is a compare-and-swap.
//!
//! ## Credentials
//!
//! Passwords are stored as salted scrypt digests (N=32768, r=8, p=1) and
//! compared in constant time. Unknown usernames cost the same as wrong
//! passwords and produce the same response.

pub mod api;
pub mod cli;
pub mod identifier;
pub mod model;
pub mod password;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
