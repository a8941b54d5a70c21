//! Compiler process invocation.
//!
//! One compile request writes the source text to a temporary artifact,
//! runs `<executable> <artifact>` under a deadline, captures both output
//! streams and removes the artifact before returning, whatever happened.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::CompilerConfig;
use crate::error::{PhaselensError, Result};
use crate::metrics::METRICS;
use crate::obs;

/// Prefix for source artifact file names.
const ARTIFACT_PREFIX: &str = "phaselens-";

/// Captured output of one compiler invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationResult {
    /// Captured stdout.
    pub stdout: String,

    /// Captured stderr.
    pub stderr: String,

    /// Whether the deadline expired. Output is discarded when set.
    pub timed_out: bool,

    /// Exit code, when the process exited normally. Informational only.
    pub exit_code: Option<i32>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl InvocationResult {
    /// Result carrying just the two streams.
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    fn timed_out(duration_ms: u64) -> Self {
        Self {
            timed_out: true,
            duration_ms,
            ..Self::default()
        }
    }
}

/// Something that turns source text into captured compiler output.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Compile `source` and return the captured streams.
    async fn invoke(&self, source: &str) -> Result<InvocationResult>;
}

/// Temporary file holding the source text for one invocation.
///
/// Removed by [`SourceArtifact::release`]; dropping it also removes the
/// file, which covers panics and cancelled futures.
#[derive(Debug)]
pub struct SourceArtifact {
    file: NamedTempFile,
}

impl SourceArtifact {
    /// Write `source` to a fresh, uniquely named file ending in `suffix`.
    pub fn create(source: &str, suffix: &str, dir: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX).suffix(suffix);
        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(source.as_bytes())?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the artifact from disk.
    pub fn release(self) -> Result<()> {
        let path = self.file.path().to_path_buf();
        self.file.close().map_err(|e| {
            obs::emit_artifact_cleanup_failed(&path, &e);
            PhaselensError::Io(e)
        })
    }
}

/// Runs the configured compiler executable as a child process.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    config: CompilerConfig,
}

impl ProcessInvoker {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    async fn run(&self, artifact: &Path) -> Result<InvocationResult> {
        let start = Instant::now();
        let deadline = Duration::from_secs(self.config.timeout_secs);

        debug!(
            executable = %self.config.executable.display(),
            artifact = %artifact.display(),
            "spawning compiler"
        );

        let child = Command::new(&self.config.executable)
            .arg(artifact)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the wait future on expiry drops the child, which kills it.
        let output = match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => {
                METRICS.inc_timeouts();
                warn!(
                    event = "compile.timeout",
                    timeout_secs = self.config.timeout_secs,
                    "compiler exceeded deadline, output discarded"
                );
                return Ok(InvocationResult::timed_out(elapsed_ms(start)));
            }
        };

        Ok(InvocationResult {
            stdout: decode_stream("stdout", &output.stdout),
            stderr: decode_stream("stderr", &output.stderr),
            timed_out: false,
            exit_code: output.status.code(),
            duration_ms: elapsed_ms(start),
        })
    }
}

#[async_trait]
impl Toolchain for ProcessInvoker {
    async fn invoke(&self, source: &str) -> Result<InvocationResult> {
        if source.trim().is_empty() {
            return Err(PhaselensError::EmptySource);
        }
        check_executable(&self.config.executable)?;

        METRICS.inc_invocations();
        let artifact = SourceArtifact::create(
            source,
            &self.config.source_suffix,
            self.config.artifact_dir.as_deref(),
        )?;

        let outcome = self.run(artifact.path()).await;
        let released = artifact.release();

        let result = outcome?;
        released?;

        if result.timed_out {
            return Err(PhaselensError::Timeout {
                timeout_secs: self.config.timeout_secs,
            });
        }
        Ok(result)
    }
}

/// Invoke `executable` on `source` with a deadline of `timeout_secs`.
pub async fn invoke(
    source: &str,
    executable: impl Into<PathBuf>,
    timeout_secs: u64,
) -> Result<InvocationResult> {
    let config = CompilerConfig::new(executable).with_timeout_secs(timeout_secs);
    config.validate()?;
    ProcessInvoker::new(config).invoke(source).await
}

/// Fail with `ExecutableNotFound` unless `path` is a runnable file.
pub fn check_executable(path: &Path) -> Result<()> {
    let not_found = || PhaselensError::ExecutableNotFound {
        path: path.to_path_buf(),
    };
    let meta = std::fs::metadata(path).map_err(|_| not_found())?;
    if meta.is_file() && is_executable(&meta) {
        Ok(())
    } else {
        Err(not_found())
    }
}

#[cfg(unix)]
fn is_executable(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &std::fs::Metadata) -> bool {
    true
}

/// Decode a captured stream as UTF-8, replacing invalid sequences, and
/// normalise line endings to `\n`.
fn decode_stream(stream: &str, bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => std::borrow::Cow::Borrowed(text),
        Err(e) => {
            warn!(
                event = "compile.decode_fallback",
                stream = stream,
                valid_up_to = e.valid_up_to(),
                "compiler output is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(bytes)
        }
    };
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.into_owned()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
