//! CLI module - Command-line interface for geocache
//!
//! This module provides a structured CLI using clap for argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::ServiceType;

/// geocache - caching proxy for the Yandex geocoding and suggest APIs
#[derive(Parser, Debug)]
#[command(name = "geocache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to the first config.toml found)
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create a default config.toml in the current directory
    Init,

    /// Run one cached lookup and print the response body
    Lookup {
        /// Service to query: geocode or suggest
        service: ServiceType,

        /// Free-text location query
        #[arg(required = true)]
        query: Vec<String>,
    },
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["geocache"]);
        assert_eq!(cli.command(), Commands::Serve);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_lookup_collects_query_words() {
        let cli = Cli::parse_from(["geocache", "lookup", "suggest", "Red", "Square"]);
        assert_eq!(
            cli.command(),
            Commands::Lookup {
                service: ServiceType::Suggest,
                query: vec!["Red".to_string(), "Square".to_string()],
            }
        );
    }

    #[test]
    fn test_rejects_unknown_service() {
        assert!(Cli::try_parse_from(["geocache", "lookup", "reverse", "Moscow"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::parse_from(["geocache", "serve", "--config", "/etc/geocache.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/geocache.toml")));
    }
}
