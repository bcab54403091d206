//! CLI-specific error types and mappings.
//!
//! Maps `CoreError` to exit codes and user-facing messages.

use tagvault_core::{ConfigError, CoreError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The current principal may not use this tool.
    #[error("Access denied: {0}")]
    Unauthorized(String),

    /// Every replica or target was unavailable.
    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 2,     // EX_USAGE
            Self::Io(_) => 74,           // EX_IOERR
            Self::Unavailable(_) => 75,  // EX_TEMPFAIL
            Self::Unauthorized(_) => 77, // EX_NOPERM
            Self::Config(_) => 78,       // EX_CONFIG
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownChannel(_)
            | CoreError::ChannelNotUsable(_)
            | CoreError::Artifact(_) => Self::Arguments(err.to_string()),
            CoreError::UnknownDatabase(_) | CoreError::Config(_) => Self::Config(err.to_string()),
            CoreError::NoAccessibleTarget(_) | CoreError::TotalFailure { .. } => {
                Self::Unavailable(err.to_string())
            }
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Exit code for an error surfaced from a handler.
///
/// Core and configuration errors propagated without conversion map the same
/// way their `CliError` counterparts do; anything else exits with 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli) = err.downcast_ref::<CliError>() {
        return cli.exit_code();
    }
    if let Some(core) = err.downcast_ref::<CoreError>() {
        return core_exit_code(core);
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return 78;
    }
    1
}

const fn core_exit_code(err: &CoreError) -> i32 {
    match err {
        CoreError::UnknownChannel(_)
        | CoreError::ChannelNotUsable(_)
        | CoreError::Artifact(_) => 2,
        CoreError::UnknownDatabase(_) | CoreError::Config(_) => 78,
        CoreError::NoAccessibleTarget(_) | CoreError::TotalFailure { .. } => 75,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let unavailable: CliError = CoreError::TotalFailure {
            operation: "slot lookup",
            detail: "a: timed out".to_string(),
        }
        .into();
        assert_eq!(unavailable.exit_code(), 75);

        let unknown: CliError = CoreError::UnknownChannel("KZZZ".to_string()).into();
        assert_eq!(unknown.exit_code(), 2);

        let config: CliError = ConfigError::UnknownCatalogDatabase("x".to_string()).into();
        assert_eq!(config.exit_code(), 78);
    }

    #[test]
    fn test_exit_code_for_downcasts() {
        let err = anyhow::Error::new(CliError::Unauthorized("guest".to_string()));
        assert_eq!(exit_code_for(&err), 77);
        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), 1);

        let core = anyhow::Error::new(CoreError::NoAccessibleTarget("KXYZ".to_string()));
        assert_eq!(exit_code_for(&core), 75);
        let config = anyhow::Error::new(ConfigError::UnknownCatalogDatabase("x".to_string()));
        assert_eq!(exit_code_for(&config), 78);
    }
}
