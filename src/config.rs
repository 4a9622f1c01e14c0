//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "focusd")]
#[command(about = "A local focus timer daemon with a persisted, shared timer state")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Directory holding the focus snapshot, shared by every instance on this device
    #[arg(long, default_value = ".cyber-heaven")]
    pub state_dir: PathBuf,

    /// Interval between view refreshes in milliseconds
    #[arg(long, default_value = "250", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Interval between checks for snapshots written by other instances, in milliseconds
    #[arg(long, default_value = "500", value_parser = clap::value_parser!(u64).range(10..))]
    pub sync_ms: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["focusd"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.state_dir, PathBuf::from(".cyber-heaven"));
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.sync_interval(), Duration::from_millis(500));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "focusd", "-p", "9000", "--state-dir", "/tmp/focus", "--tick-ms", "100", "-v",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.state_dir, PathBuf::from("/tmp/focus"));
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn rejects_tiny_tick_interval() {
        assert!(Config::try_parse_from(["focusd", "--tick-ms", "1"]).is_err());
    }
}
