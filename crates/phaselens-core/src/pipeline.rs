//! Compile request pipeline.
//!
//! `source -> Toolchain -> classify -> (failure | segment + optimizer) -> OutputModel`.
//!
//! Everything after the toolchain call is pure and synchronous; see
//! [`interpret`]. Counting and logging the outcome is left to the caller
//! through [`record_outcome`].

use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

use crate::classify::{classify_streams, Classification};
use crate::error::Result;
use crate::invoker::{InvocationResult, Toolchain};
use crate::metrics::METRICS;
use crate::model::OutputModel;
use crate::obs::{self, CompileSpan};
use crate::optimizer;
use crate::segment;

/// Identity of one compile request, used for log correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    /// Unique id for this request.
    pub id: Uuid,

    /// SHA-256 (hex) of the source text.
    pub source_digest: String,
}

impl CompileRequest {
    pub fn new(source: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_digest: source_digest(source),
        }
    }
}

/// SHA-256 hex digest of `source`.
pub fn source_digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Run `source` through `toolchain` and interpret the result.
///
/// Invocation failures (empty source, missing executable, timeout, io)
/// are returned as errors; everything the compiler reported, including
/// crashes and compile errors, comes back as an [`OutputModel`].
pub async fn compile<T>(toolchain: &T, source: &str) -> Result<OutputModel>
where
    T: Toolchain + ?Sized,
{
    let request = CompileRequest::new(source);
    let request_id = request.id.to_string();
    let start = Instant::now();

    async {
        obs::emit_compile_started(&request_id, &request.source_digest, source.len());

        let result = match toolchain.invoke(source).await {
            Ok(result) => result,
            Err(e) => {
                obs::emit_compile_failed(&request_id, &e);
                return Err(e);
            }
        };

        let model = interpret_result(&result);
        record_outcome(&model);
        obs::emit_compile_finished(
            &request_id,
            start.elapsed().as_millis() as u64,
            model.kind(),
        );
        Ok(model)
    }
    .instrument(CompileSpan::span(&request_id))
    .await
}

/// Interpret a captured invocation.
pub fn interpret_result(result: &InvocationResult) -> OutputModel {
    interpret(&result.stdout, &result.stderr)
}

/// Turn captured stdout/stderr into an [`OutputModel`].
///
/// A crash or compile error short-circuits; segmentation and optimizer
/// extraction only run on clean output.
pub fn interpret(stdout: &str, stderr: &str) -> OutputModel {
    match classify_streams(stdout, stderr) {
        Classification::Crash { stderr, notice } => OutputModel::CrashFailure {
            message: stderr,
            crash_notice: notice,
        },
        Classification::CompileError { line } => OutputModel::CompileError { message: line },
        Classification::Clean => phase_report(stdout),
    }
}

/// Count `model` in [`METRICS`] and log a crash event if it is one.
pub fn record_outcome(model: &OutputModel) {
    if let OutputModel::CrashFailure { crash_notice, .. } = model {
        obs::emit_crash_detected(crash_notice.is_some());
    }
    METRICS.record_outcome(model);
}

fn phase_report(stdout: &str) -> OutputModel {
    let phases = segment::segment(stdout);
    let optimization = optimizer::extract(stdout);

    // Programs with no phase instrumentation (e.g. a lone print) fall back
    // to showing stdout as-is.
    if phases.is_empty() && optimization.is_none() && !stdout.trim().is_empty() {
        return OutputModel::RawMessage {
            text: stdout.to_string(),
        };
    }

    OutputModel::PhaseReport {
        channels: segment::route(&phases),
        optimization,
    }
}
