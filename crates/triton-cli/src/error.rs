//! CLI error types.

use thiserror::Error;
use triton_api::Error as ApiError;
use triton_auth::AuthError;

/// Exit code for "no such resource".
pub const EXIT_NOT_FOUND: u8 = 3;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// A CloudAPI or orchestration failure.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The signing key could not be loaded.
    #[error("key error: {0}")]
    Key(#[from] AuthError),
    /// Invalid profile or configuration.
    #[error("configuration error: {0}")]
    Config(String),
    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 3 when every failure is a missing resource,
    /// otherwise 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Api(e) if all_not_found(e) => EXIT_NOT_FOUND,
            _ => 1,
        }
    }
}

fn all_not_found(err: &ApiError) -> bool {
    match err {
        ApiError::ResourceNotFound { .. } => true,
        ApiError::Multi(errors) => !errors.is_empty() && errors.iter().all(all_not_found),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_not_found() {
        let err = CliError::from(ApiError::not_found("no instance with id or name \"x\" was found"));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.to_string(), "no instance with id or name \"x\" was found");
    }

    #[test]
    fn exit_code_multi() {
        let all = CliError::from(ApiError::Multi(vec![
            ApiError::not_found("a"),
            ApiError::not_found("b"),
        ]));
        assert_eq!(all.exit_code(), 3);

        let mixed = CliError::from(ApiError::Multi(vec![
            ApiError::not_found("a"),
            ApiError::usage("b"),
        ]));
        assert_eq!(mixed.exit_code(), 1);
    }

    #[test]
    fn exit_code_other() {
        assert_eq!(CliError::Config("no profile".into()).exit_code(), 1);
        assert_eq!(CliError::from(ApiError::usage("bad")).exit_code(), 1);
    }

    #[test]
    fn cli_error_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err = CliError::from(io_err);
        assert!(matches!(cli_err, CliError::Io(_)));
    }
}
