//! Default values shared by the worker binaries.

use crate::logging::LogFormat;
use crate::transport::TransportEndpoint;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Scheme served when none is configured.
pub const DEFAULT_PROTOCOL: &str = "memfs";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format. Compact output keeps stderr readable when a
/// worker is launched by hand.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default transport: the protocol runs over the process's stdio.
#[must_use]
pub const fn default_transport() -> TransportEndpoint {
    TransportEndpoint::Stdio
}
