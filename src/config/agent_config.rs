//! Agent configuration parsing from flags and environment variables.

use crate::application::agent::TransmitMode;
use crate::config::parse_duration;
use clap::Parser;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "agent", version, about = "Metric collection agent")]
pub struct AgentConfig {
    /// Server address (host:port or base URL)
    #[arg(short = 'a', long, env = "ADDRESS", default_value = "localhost:8080")]
    pub address: String,

    /// Period between local stat samples
    #[arg(short = 'p', long, env = "POLL_INTERVAL", default_value = "2s", value_parser = parse_duration)]
    pub poll_interval: Duration,

    /// Period between reports to the server; also the request timeout
    #[arg(short = 'r', long, env = "REPORT_INTERVAL", default_value = "10s", value_parser = parse_duration)]
    pub report_interval: Duration,

    /// Transmission mode: plain, json or jsonbatch
    #[arg(short = 't', long, env = "MODE", default_value = "jsonbatch", value_parser = TransmitMode::from_str)]
    pub mode: TransmitMode,

    /// Shared signing key; empty disables signatures
    #[arg(short = 'k', long, env = "KEY", default_value = "", hide_env_values = true)]
    pub key: String,
}
