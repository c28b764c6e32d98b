use crate::{
    api::{
        self, ServerConfig,
        handlers::auth::{AuthConfig, InvalidateScope},
    },
    cli::telemetry,
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub db_max_connections: u32,
    pub db_acquire_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub invalidate_scope: InvalidateScope,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let server_config = ServerConfig::new()
        .with_db_max_connections(args.db_max_connections)
        .with_db_acquire_timeout_seconds(args.db_acquire_timeout_seconds)
        .with_request_timeout_seconds(args.request_timeout_seconds);
    let auth_config = AuthConfig::new().with_invalidate_scope(args.invalidate_scope);

    let result = api::new(args.port, args.dsn, server_config, auth_config).await;

    telemetry::shutdown_tracer();

    result
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(args.dsn.expose_secret())),
        ("db_max_connections", args.db_max_connections.to_string()),
        (
            "db_acquire_timeout",
            format!("{}s", args.db_acquire_timeout_seconds),
        ),
        ("request_timeout", format!("{}s", args.request_timeout_seconds)),
        ("invalidate_scope", args.invalidate_scope.to_string()),
    ];
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
