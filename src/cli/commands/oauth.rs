//! OAuth provider registration arguments.
//!
//! A provider without a client id is simply unsupported at runtime; none are
//! required so a development setup can run with only one configured.

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};

pub const ARG_GOOGLE_CLIENT_ID: &str = "google-client-id";
pub const ARG_FACEBOOK_CLIENT_ID: &str = "facebook-client-id";
pub const ARG_APPLE_CLIENT_ID: &str = "apple-client-id";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_GOOGLE_CLIENT_ID)
                .long(ARG_GOOGLE_CLIENT_ID)
                .help("OAuth client id registered with Google")
                .env("ESUSU_GOOGLE_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_FACEBOOK_CLIENT_ID)
                .long(ARG_FACEBOOK_CLIENT_ID)
                .help("OAuth client id registered with Facebook")
                .env("ESUSU_FACEBOOK_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_APPLE_CLIENT_ID)
                .long(ARG_APPLE_CLIENT_ID)
                .help("OAuth client id registered with Apple")
                .env("ESUSU_APPLE_CLIENT_ID"),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub google_client_id: Option<String>,
    pub facebook_client_id: Option<String>,
    pub apple_client_id: Option<String>,
}

impl Options {
    /// # Errors
    /// Infallible today; kept fallible to match the other option parsers.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            google_client_id: matches.get_one::<String>(ARG_GOOGLE_CLIENT_ID).cloned(),
            facebook_client_id: matches.get_one::<String>(ARG_FACEBOOK_CLIENT_ID).cloned(),
            apple_client_id: matches.get_one::<String>(ARG_APPLE_CLIENT_ID).cloned(),
        })
    }
}
