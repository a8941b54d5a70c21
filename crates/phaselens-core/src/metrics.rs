//! Global atomic counters for compile requests.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before the process exits).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::OutputModel;

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations and no locking.
pub struct Metrics {
    invocations: AtomicU64,
    timeouts: AtomicU64,
    crashes: AtomicU64,
    compile_errors: AtomicU64,
    phase_reports: AtomicU64,
    raw_messages: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            invocations: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            crashes: AtomicU64::new(0),
            compile_errors: AtomicU64::new(0),
            phase_reports: AtomicU64::new(0),
            raw_messages: AtomicU64::new(0),
        }
    }

    /// Increment the spawned-invocations counter by one.
    pub fn inc_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "invocations", "counter incremented");
    }

    /// Increment the timeouts counter by one.
    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "timeouts", "counter incremented");
    }

    /// Count one interpreted outcome under its variant.
    pub fn record_outcome(&self, model: &OutputModel) {
        let counter = match model {
            OutputModel::CrashFailure { .. } => &self.crashes,
            OutputModel::CompileError { .. } => &self.compile_errors,
            OutputModel::PhaseReport { .. } => &self.phase_reports,
            OutputModel::RawMessage { .. } => &self.raw_messages,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = model.kind(), "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            invocations = self.invocations(),
            timeouts = self.timeouts(),
            crashes = self.crashes(),
            compile_errors = self.compile_errors(),
            phase_reports = self.phase_reports(),
            raw_messages = self.raw_messages(),
        );
    }

    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    pub fn crashes(&self) -> u64 {
        self.crashes.load(Ordering::Relaxed)
    }

    pub fn compile_errors(&self) -> u64 {
        self.compile_errors.load(Ordering::Relaxed)
    }

    pub fn phase_reports(&self) -> u64 {
        self.phase_reports.load(Ordering::Relaxed)
    }

    pub fn raw_messages(&self) -> u64 {
        self.raw_messages.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.invocations.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.crashes.store(0, Ordering::Relaxed);
        self.compile_errors.store(0, Ordering::Relaxed);
        self.phase_reports.store(0, Ordering::Relaxed);
        self.raw_messages.store(0, Ordering::Relaxed);
    }
}
