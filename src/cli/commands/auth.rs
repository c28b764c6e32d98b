use clap::{Arg, ArgMatches, Command, builder::PossibleValuesParser};

use crate::api::handlers::auth::InvalidateScope;

pub const ARG_INVALIDATE_SCOPE: &str = "invalidate-scope";

#[derive(Debug)]
pub struct Options {
    pub invalidate_scope: InvalidateScope,
}

impl Options {
    /// Parse auth arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the invalidate scope is not recognized.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let invalidate_scope = match matches.get_one::<String>(ARG_INVALIDATE_SCOPE) {
            Some(value) => value
                .parse::<InvalidateScope>()
                .map_err(|err| anyhow::anyhow!(err))?,
            None => InvalidateScope::default(),
        };
        Ok(Self { invalidate_scope })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_INVALIDATE_SCOPE)
            .long(ARG_INVALIDATE_SCOPE)
            .help("What /authserver/invalidate revokes")
            .long_help(
                "What /authserver/invalidate revokes: 'user' invalidates every token pair of the owning user, 'pair' only the presented one.",
            )
            .env("YGGAUTH_INVALIDATE_SCOPE")
            .default_value(InvalidateScope::User.as_str())
            .value_parser(PossibleValuesParser::new([
                InvalidateScope::User.as_str(),
                InvalidateScope::Pair.as_str(),
            ])),
    )
}
