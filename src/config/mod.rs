//! Configuration module.
//!
//! Server and agent settings are read from command-line flags with
//! environment-variable fallbacks (`.env` files are honoured by the binaries).
//! Flags take precedence over environment variables, which take precedence
//! over defaults.

mod agent_config;
mod server_config;

pub use agent_config::AgentConfig;
pub use server_config::ServerConfig;

use anyhow::anyhow;
use humanize_rs::ParseError;
use std::str::FromStr;
use std::time::Duration;

/// Parses a humanized duration (`300s`, `1m`, `500ms`); a bare number is
/// taken as seconds.
pub fn parse_duration(value: &str) -> anyhow::Result<Duration> {
    let value = value.trim();
    match humanize_rs::duration::parse(value) {
        Ok(v) => Ok(v),
        Err(ParseError::MissingUnit) => {
            if let Ok(u) = u64::from_str(value) {
                Ok(Duration::from_secs(u))
            } else if let Ok(f) = f64::from_str(value) {
                Duration::try_from_secs_f64(f).map_err(anyhow::Error::new)
            } else {
                Err(anyhow!("unsupported duration string"))
            }
        }
        Err(e) => Err(anyhow!("invalid humanize duration string: {e}")),
    }
}
