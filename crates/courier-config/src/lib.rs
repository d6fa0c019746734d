//! Configuration for courier worker processes.
//!
//! A worker is usually launched by its controller, so every setting can come
//! from a command-line flag or a `COURIER_*` environment variable. Flags win
//! over the environment, which wins over the built-in defaults.

use std::ffi::OsString;

use clap::Parser;
use thiserror::Error;

pub mod defaults;
pub mod logging;
pub mod transport;

pub use self::defaults::{DEFAULT_LOG_FILTER, DEFAULT_PROTOCOL};
pub use self::logging::{LogFormat, LogFormatParseError};
pub use self::transport::{TransportEndpoint, TransportParseError};

/// Settings for one worker process.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "courier-worker",
    version,
    about = "Serve one URL scheme over the courier worker protocol"
)]
pub struct Config {
    /// URL scheme served by this worker.
    #[arg(long, env = "COURIER_PROTOCOL", default_value = DEFAULT_PROTOCOL)]
    protocol: String,

    /// Channel endpoint: `stdio`, `unix:///path/to.sock` or `tcp://host:port`.
    #[arg(long, env = "COURIER_TRANSPORT", default_value = "stdio")]
    transport: TransportEndpoint,

    /// Tracing filter expression, e.g. `info` or `courier_worker=debug`.
    #[arg(long, env = "COURIER_LOG_FILTER", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,

    /// Log output format.
    #[arg(long, env = "COURIER_LOG_FORMAT", default_value_t = defaults::default_log_format())]
    log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_owned(),
            transport: defaults::default_transport(),
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
        }
    }
}

impl Config {
    /// Parses configuration from the process arguments and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] when an argument or environment value
    /// is invalid, or when help or version output was requested.
    pub fn load() -> Result<Self, ConfigError> {
        Self::try_parse().map_err(ConfigError::Cli)
    }

    /// Parses configuration from an explicit argument list.
    ///
    /// The first item is the program name, as with [`std::env::args_os`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Cli`] on invalid input.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ConfigError::Cli)
    }

    /// Replaces the served scheme.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    /// Replaces the channel endpoint.
    #[must_use]
    pub fn with_transport(mut self, transport: TransportEndpoint) -> Self {
        self.transport = transport;
        self
    }

    /// Replaces the log filter.
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Returns the served scheme.
    #[must_use]
    pub const fn protocol(&self) -> &str {
        self.protocol.as_str()
    }

    /// Returns the channel endpoint.
    #[must_use]
    pub const fn transport(&self) -> &TransportEndpoint {
        &self.transport
    }

    /// Returns the tracing filter expression.
    #[must_use]
    pub const fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Command-line or environment input was rejected.
    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl ConfigError {
    /// Returns `true` when the "error" is a help or version request that
    /// should be printed and end the process successfully.
    #[must_use]
    pub fn is_informational(&self) -> bool {
        match self {
            Self::Cli(error) => matches!(
                error.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ),
        }
    }
}

#[cfg(test)]
mod tests;
