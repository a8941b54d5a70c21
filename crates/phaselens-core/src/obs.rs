//! Structured observability hooks for the compile request lifecycle.
//!
//! This module provides:
//! - Request-scoped tracing spans via the `CompileSpan` RAII guard, and
//!   `InterpretSpan` for offline interpretation of captured output
//! - Emission functions for key lifecycle events: start, finish, crash,
//!   artifact cleanup failure

use std::path::Path;

use tracing::{info, warn};

/// RAII guard that enters a request-scoped span for one compile.
///
/// # Example
///
/// ```ignore
/// let _span = CompileSpan::enter("4f0c...");
/// // every event until the guard drops carries request_id = "4f0c..."
/// ```
pub struct CompileSpan {
    _span: tracing::span::EnteredSpan,
}

impl CompileSpan {
    /// Create and enter a span tagged with the request id.
    pub fn enter(request_id: &str) -> Self {
        Self {
            _span: Self::span(request_id).entered(),
        }
    }

    /// The request span without entering it, for `Instrument`.
    pub fn span(request_id: &str) -> tracing::Span {
        tracing::info_span!("phaselens.compile", request_id = %request_id)
    }
}

/// RAII guard for interpreting captured output without a compile.
pub struct InterpretSpan {
    _span: tracing::span::EnteredSpan,
}

impl InterpretSpan {
    pub fn enter(request_id: &str) -> Self {
        Self {
            _span: tracing::info_span!("phaselens.interpret", request_id = %request_id).entered(),
        }
    }
}

/// Emit event: compile request started.
pub fn emit_compile_started(request_id: &str, source_digest: &str, source_bytes: usize) {
    info!(
        event = "compile.started",
        request_id = %request_id,
        source_digest = %source_digest,
        source_bytes = source_bytes,
    );
}

/// Emit event: compile request finished with its outcome kind.
pub fn emit_compile_finished(request_id: &str, duration_ms: u64, outcome: &str) {
    info!(
        event = "compile.finished",
        request_id = %request_id,
        duration_ms = duration_ms,
        outcome = %outcome,
    );
}

/// Emit event: compile request failed before producing output.
pub fn emit_compile_failed(request_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "compile.failed", request_id = %request_id, error = %error);
}

/// Emit event: the compiler wrote to stderr.
pub fn emit_crash_detected(abnormal_exit: bool) {
    warn!(event = "compile.crash", abnormal_exit = abnormal_exit);
}

/// Emit event: a source artifact could not be removed (warning level).
pub fn emit_artifact_cleanup_failed(path: &Path, error: &dyn std::fmt::Display) {
    warn!(
        event = "artifact.cleanup_failed",
        path = %path.display(),
        error = %error,
    );
}
