//! CLI error types and exit codes

use thiserror::Error;

use bastion_core::error::BastionError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Network error
/// - 4: Validation error
/// - 5: Server error
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Network(_) => 3,
            CliError::Validation(_) | CliError::Config(_) => 4,
            CliError::Api { status, .. } => {
                if *status >= 500 {
                    5
                } else {
                    4
                }
            }
            CliError::Io(_) => 1,
        }
    }

    /// Print the error to stderr, honoring NO_COLOR
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }
    }
}

impl From<BastionError> for CliError {
    fn from(err: BastionError) -> Self {
        match err {
            BastionError::Backend { status, body } => CliError::Api {
                status,
                message: body,
            },
            BastionError::Network { .. } => CliError::Network(err.to_string()),
            BastionError::InvalidConfiguration { message } => CliError::Config(message),
            BastionError::Serialization { message } => CliError::Validation(message),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Validation(err.to_string())
    }
}
