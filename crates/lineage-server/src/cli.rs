//! Command-line arguments for the server binary.

use crate::config::{ConfigError, ServerConfig};
use clap::Parser;
use std::path::PathBuf;

/// Lineage server - REST API for family trees
#[derive(Debug, Parser)]
#[command(name = "lineage-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LINEAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(short, long, env = "LINEAGE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Bind address (overrides the config file)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port (overrides the config file)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Load the config file, if any, and apply command-line overrides
    pub fn resolve_config(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };

        if let Some(database) = &self.database {
            config.database_path = database.clone();
        }
        if let Some(bind) = &self.bind {
            config.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            config.bind_port = port;
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_arguments() {
        let cli = Cli::try_parse_from(["lineage-server"]).unwrap();
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.bind_port, 5001);
    }

    #[test]
    fn test_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.toml");
        std::fs::write(&path, "bind_port = 7000\nlog_level = \"warn\"\n").unwrap();

        let cli = Cli::try_parse_from([
            "lineage-server",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "7100",
            "--database",
            "/tmp/trees.db",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.bind_port, 7100);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.database_path, PathBuf::from("/tmp/trees.db"));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["lineage-server", "--port", "high"]).is_err());
    }
}
