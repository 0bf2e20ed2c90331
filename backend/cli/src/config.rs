use std::path::PathBuf;

use serde::Deserialize;

use collabadoku_core::RandomSudokuGenerator;
use collabadoku_gateway::DEFAULT_OUTBOUND_BUFFER;

/// collabadoku server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Log level
    pub log_level: String,
    /// Directory for rolling NDJSON logs; console only when unset
    pub log_dir: Option<PathBuf>,
    /// Capacity of each session's outbound queue
    pub outbound_buffer: usize,
    /// Givens left in each generated puzzle
    pub puzzle_givens: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            log_dir: None,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            puzzle_givens: RandomSudokuGenerator::DEFAULT_GIVENS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            bind_address: lookup("COLLABADOKU_BIND").unwrap_or(defaults.bind_address),
            port: lookup("COLLABADOKU_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_dir: lookup("COLLABADOKU_LOG_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
            outbound_buffer: lookup("COLLABADOKU_OUTBOUND_BUFFER")
                .and_then(|n| n.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.outbound_buffer),
            puzzle_givens: lookup("COLLABADOKU_PUZZLE_GIVENS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(defaults.puzzle_givens),
        }
    }
}
