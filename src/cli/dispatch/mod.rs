//! Maps parsed command-line arguments to an [`Action`].

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{database, ARG_LISTEN, ARG_PORT};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(5000);
    let listen = matches
        .get_one::<String>(ARG_LISTEN)
        .cloned()
        .context("missing required argument: --listen")?;

    let database = database::Options::parse(matches)?;

    Ok(Action::Server(Args {
        listen,
        port,
        database,
    }))
}
