//! Error taxonomy for compile requests.
//!
//! Only conditions that stop a request from producing an [`OutputModel`]
//! live here. A crashed toolchain or a reported compile error is a normal
//! outcome and is carried by the model instead.
//!
//! [`OutputModel`]: crate::model::OutputModel

use std::path::PathBuf;

/// Errors produced while preparing or running a compile request.
#[derive(Debug, thiserror::Error)]
pub enum PhaselensError {
    #[error("there is no code to compile")]
    EmptySource,

    #[error("compiler executable not found or not executable: {}", path.display())]
    ExecutableNotFound { path: PathBuf },

    #[error("compiler timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for phaselens operations.
pub type Result<T> = std::result::Result<T, PhaselensError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_not_found_names_path() {
        let err = PhaselensError::ExecutableNotFound {
            path: PathBuf::from("/opt/toolchain/compiler"),
        };
        let msg = err.to_string();
        assert!(msg.contains("not found"));
        assert!(msg.contains("/opt/toolchain/compiler"));
    }

    #[test]
    fn test_timeout_names_budget() {
        let err = PhaselensError::Timeout { timeout_secs: 10 };
        assert!(err.to_string().contains("10 seconds"));
    }

    #[test]
    fn test_io_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only tmp");
        let err: PhaselensError = io.into();
        assert!(err.to_string().contains("io error"));
        assert!(err.to_string().contains("read-only tmp"));
    }
}
