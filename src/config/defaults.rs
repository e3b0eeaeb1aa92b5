//! Default constants for clientele configuration.

/// Anonymous aggregates are dropped unless explicitly requested.
pub const DEFAULT_INCLUDE_ANONYMOUS: bool = false;

/// Compact JSON unless pretty output is requested.
pub const DEFAULT_PRETTY_OUTPUT: bool = false;

/// Default `tracing` filter directive for the command-line tool.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Prefix for environment overrides, e.g. `CLIENTELE_INCLUDE_ANONYMOUS=true`.
pub const ENV_PREFIX: &str = "CLIENTELE_";

/// Separator for nested keys in environment overrides, e.g. `CLIENTELE_OUTPUT__PRETTY`.
pub const ENV_NESTING_SEPARATOR: &str = "__";
