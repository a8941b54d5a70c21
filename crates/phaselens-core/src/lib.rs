//! Phaselens Core - compiler output classification and phase routing
//!
//! Provides:
//! - Invocation of an external compiler on a temporary source artifact,
//!   under a deadline, with guaranteed artifact cleanup
//! - Classification of captured output (crash, compile error, clean)
//! - Segmentation of clean stdout into banner-delimited phases routed to
//!   a fixed set of display channels
//! - Extraction of the optimizer sub-report

pub mod classify;
pub mod config;
pub mod error;
pub mod invoker;
pub mod metrics;
pub mod model;
pub mod obs;
pub mod optimizer;
pub mod pipeline;
pub mod segment;
pub mod telemetry;

pub use classify::{classify, classify_streams, Classification, CRASH_MARKER, CRASH_NOTICE};
pub use config::CompilerConfig;
pub use error::{PhaselensError, Result};
pub use invoker::{check_executable, invoke, InvocationResult, ProcessInvoker, SourceArtifact, Toolchain};
pub use metrics::METRICS;
pub use model::{Channel, ChannelBodies, OutputModel, UnknownChannel};
pub use obs::{CompileSpan, InterpretSpan};
pub use optimizer::{extract as extract_optimization, OptimizationReport};
pub use pipeline::{
    compile, interpret, interpret_result, record_outcome, source_digest, CompileRequest,
};
pub use segment::{
    map_title, render_phases, route, segment, titles_for, PhaseRecord, PHASE_TITLES,
};
pub use telemetry::init_tracing;

/// Phaselens version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
