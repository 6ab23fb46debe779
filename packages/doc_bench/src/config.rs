use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Settings shared by every harness operation.
///
/// Values come from three layers, each overriding the previous one: the built-in defaults,
/// an optional TOML config file and the command line.
///
/// # Examples
///
/// ```
/// use doc_bench::{BenchConfig, ConfigOverrides};
///
/// let mut overrides = ConfigOverrides::default();
/// overrides.threads = Some(8);
///
/// let config = BenchConfig::resolve(None, overrides).unwrap();
///
/// assert_eq!(config.threads, 8);
/// assert_eq!(config.bulk, 32);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct BenchConfig {
    /// Store endpoints. Every worker session receives its own shuffled copy.
    pub endpoints: Vec<String>,

    /// Name of the database holding the benchmark collection.
    pub database: String,

    /// Name of the benchmark collection.
    pub collection: String,

    /// Number of worker threads issuing bulk requests.
    pub threads: usize,

    /// Number of documents per bulk request.
    pub bulk: usize,

    /// Simulated latency added to every call into the in-memory store, in milliseconds.
    pub latency_ms: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            database: "benchmark".to_string(),
            collection: "benchmark".to_string(),
            threads: 2,
            bulk: 32,
            latency_ms: 0,
        }
    }
}

/// Values given on the command line, which take precedence over the config file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub struct ConfigOverrides {
    /// Replaces the configured endpoints if not empty.
    pub endpoints: Vec<String>,

    /// Replaces the configured database name.
    pub database: Option<String>,

    /// Replaces the configured collection name.
    pub collection: Option<String>,

    /// Replaces the configured worker thread count.
    pub threads: Option<usize>,

    /// Replaces the configured bulk size.
    pub bulk: Option<usize>,

    /// Replaces the configured simulated latency.
    pub latency_ms: Option<u64>,
}

impl BenchConfig {
    /// Builds the effective configuration from an optional config file and command-line
    /// overrides, then validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if the resulting
    /// configuration describes no workers or empty bulk requests.
    pub fn resolve(path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        config.apply(overrides);
        config.validate()?;

        Ok(config)
    }

    /// Loads a configuration from a TOML file. Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML or contains unknown keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Applies command-line overrides on top of this configuration.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if !overrides.endpoints.is_empty() {
            self.endpoints = overrides.endpoints;
        }

        if let Some(database) = overrides.database {
            self.database = database;
        }

        if let Some(collection) = overrides.collection {
            self.collection = collection;
        }

        if let Some(threads) = overrides.threads {
            self.threads = threads;
        }

        if let Some(bulk) = overrides.bulk {
            self.bulk = bulk;
        }

        if let Some(latency_ms) = overrides.latency_ms {
            self.latency_ms = latency_ms;
        }
    }

    /// Checks that the configuration can drive a bulk run.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count or the bulk size is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }

        if self.bulk == 0 {
            return Err(ConfigError::ZeroBulk);
        }

        Ok(())
    }

    /// The simulated latency of every store call.
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// The `<database>/<collection>` name the benchmark operates on.
    #[must_use]
    pub fn namespace(&self) -> String {
        format!("{}/{}", self.database, self.collection)
    }
}

/// Errors that can occur while building the harness configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        /// The config file that was requested.
        path: PathBuf,

        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not a valid harness configuration.
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        /// The config file that was requested.
        path: PathBuf,

        /// The underlying TOML error.
        source: Box<toml::de::Error>,
    },

    /// The thread count was zero.
    #[error("threads must be at least 1")]
    ZeroThreads,

    /// The bulk size was zero.
    #[error("bulk size must be at least 1")]
    ZeroBulk,
}
