//! Maps validated CLI matches to the action the binary executes.

use crate::cli::{
    actions::{Action, server::Args},
    commands::{self, auth, database},
};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let request_timeout_seconds = matches
        .get_one::<u64>(commands::ARG_REQUEST_TIMEOUT_SECONDS)
        .copied()
        .unwrap_or(10);

    let database_opts = database::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn: database_opts.dsn,
        db_max_connections: database_opts.max_connections,
        db_acquire_timeout_seconds: database_opts.acquire_timeout_seconds,
        request_timeout_seconds,
        invalidate_scope: auth_opts.invalidate_scope,
    }))
}
