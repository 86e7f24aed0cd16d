//! CLI-specific error types and exit code mapping

use chutney_core::error::ChutneyError;
use chutney_execution_report::ExecutionReportError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The execution engine could not be reached.
    #[error("server not reachable: {0}")]
    Unreachable(String),

    /// A watched execution ended in failure.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from chutney-core.
    #[error("{0}")]
    Core(ChutneyError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                              |
    /// |------|--------------------------------------|
    /// | 0    | Success                              |
    /// | 1    | General / command error              |
    /// | 2    | Configuration error                  |
    /// | 3    | Server unreachable                   |
    /// | 4    | Watched execution failed             |
    /// | 10   | IO error                             |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Unreachable(_) => 3,
            Self::ExecutionFailed(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<ChutneyError> for CliError {
    fn from(e: ChutneyError) -> Self {
        match e {
            ChutneyError::Config(config) => Self::Config(config.to_string()),
            ChutneyError::Io(io) => Self::Io(io),
            other => Self::Core(other),
        }
    }
}

impl From<ExecutionReportError> for CliError {
    fn from(e: ExecutionReportError) -> Self {
        match e {
            ExecutionReportError::InvalidBaseUrl { .. } => Self::Config(e.to_string()),
            e if e.is_unreachable() => Self::Unreachable(e.to_string()),
            e => Self::Command(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chutney_core::error::ConfigError;
    use chutney_execution_report::StreamFailure;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_unreachable() {
        let err = CliError::Unreachable("connection refused".to_owned());
        assert_eq!(err.exit_code(), 3, "unreachable should return exit code 3");
    }

    #[test]
    fn test_exit_code_execution_failed() {
        let err = CliError::ExecutionFailed("execution 4 ended with FAILURE".to_owned());
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_from_core_config_error_maps_to_config() {
        let core_err = ChutneyError::Config(ConfigError::FileNotFound {
            path: "chutney.toml".to_owned(),
        });
        let cli_err: CliError = core_err.into();
        assert_eq!(cli_err.exit_code(), 2);
        assert!(cli_err.to_string().contains("chutney.toml"));
    }

    #[test]
    fn test_from_request_error_maps_to_unreachable() {
        let err: CliError = ExecutionReportError::Request {
            operation: "find_scenario_executions",
            reason: "connection refused".to_owned(),
        }
        .into();
        assert!(matches!(err, CliError::Unreachable(_)));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_from_status_error_keeps_server_message() {
        let err: CliError = ExecutionReportError::Status {
            operation: "stop_scenario",
            status: 409,
            message: "Execution already finished".to_owned(),
        }
        .into();
        assert_eq!(err.to_string(), "Execution already finished");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_from_invalid_base_url_maps_to_config() {
        let err: CliError = ExecutionReportError::InvalidBaseUrl {
            url: "nope".to_owned(),
            reason: "relative URL without a base".to_owned(),
        }
        .into();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_stream_failure_message_is_user_facing() {
        let err: CliError = ExecutionReportError::from(StreamFailure::Transport {
            reason: "reset".to_owned(),
        })
        .into();
        assert_eq!(err.to_string(), "Error loading execution");
    }
}
