//! Compiler invocation configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PhaselensError, Result};

/// Default wall-clock budget for one compile request.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Suffix the toolchain recognises for source files.
pub const DEFAULT_SOURCE_SUFFIX: &str = ".mylang";

/// Environment variable naming the compiler executable.
pub const ENV_COMPILER: &str = "PHASELENS_COMPILER";
/// Environment variable overriding the timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "PHASELENS_TIMEOUT_SECS";
/// Environment variable overriding the artifact suffix.
pub const ENV_SOURCE_SUFFIX: &str = "PHASELENS_SOURCE_SUFFIX";
/// Environment variable overriding where source artifacts are written.
pub const ENV_ARTIFACT_DIR: &str = "PHASELENS_ARTIFACT_DIR";

/// Configuration for invoking the external compiler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerConfig {
    /// Path to the compiler executable.
    pub executable: PathBuf,

    /// Deadline for a single invocation, in seconds.
    pub timeout_secs: u64,

    /// File suffix given to the temporary source artifact.
    pub source_suffix: String,

    /// Directory for source artifacts (system temp dir when `None`).
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            source_suffix: DEFAULT_SOURCE_SUFFIX.to_string(),
            artifact_dir: None,
        }
    }
}

impl CompilerConfig {
    /// Create a configuration for a specific executable with default limits.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    /// Set the invocation deadline.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Write source artifacts into `dir` instead of the system temp dir.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Build a configuration from the defaults overlaid with `PHASELENS_*`
    /// environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`CompilerConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(ENV_COMPILER) {
            config.executable = PathBuf::from(path);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                PhaselensError::InvalidConfig(format!("{ENV_TIMEOUT_SECS} is not a number: {raw}"))
            })?;
        }
        if let Some(suffix) = lookup(ENV_SOURCE_SUFFIX) {
            config.source_suffix = suffix;
        }
        if let Some(dir) = lookup(ENV_ARTIFACT_DIR) {
            config.artifact_dir = Some(PathBuf::from(dir));
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the invoker cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(PhaselensError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if !self.source_suffix.starts_with('.') {
            return Err(PhaselensError::InvalidConfig(format!(
                "source suffix must start with '.': {}",
                self.source_suffix
            )));
        }
        Ok(())
    }
}

/// `compiler` (or `compiler.exe` on Windows) in the current directory.
fn default_executable() -> PathBuf {
    let name = if cfg!(windows) {
        "compiler.exe"
    } else {
        "compiler"
    };
    std::env::current_dir()
        .map(|cwd| cwd.join(name))
        .unwrap_or_else(|_| PathBuf::from(name))
}
