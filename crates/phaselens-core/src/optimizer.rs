//! Optimization sub-report extraction.
//!
//! The optimizer does not use phase banners. Its report is bracketed by its
//! own markers and may appear anywhere in stdout:
//!
//! ```text
//! --- OPTIMIZER START ---
//! Applied: Constant Folding at line 3
//! --- OPTIMIZED IR ---
//! t1 = 5
//! --- OPTIMIZER END ---
//! ```

use serde::{Deserialize, Serialize};

/// Marks that the optimizer ran.
pub const OPTIMIZER_START: &str = "--- OPTIMIZER START ---";
/// Opens the final transformed-code listing.
pub const OPTIMIZED_IR: &str = "--- OPTIMIZED IR ---";
/// Closes the final transformed-code listing.
pub const OPTIMIZER_END: &str = "--- OPTIMIZER END ---";
/// Lines containing this token are collected as applied transforms.
pub const APPLIED_TOKEN: &str = "Applied:";

/// Summary shown when the optimizer ran but applied nothing.
pub const NO_OPTIMIZATIONS: &str = "No optimizations were applied.";
/// Placeholder for a listing whose end marker is missing.
pub const UNPARSEABLE_IR: &str = "Could not parse optimized IR.";

/// Optimizer report embedded in the compiler's stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptimizationReport {
    /// Every `Applied:` line in stream order.
    pub applied_transforms: Vec<String>,

    /// Final optimized listing, or the unparseable placeholder.
    pub final_code: Option<String>,
}

impl OptimizationReport {
    /// Applied transforms joined by newlines, or the "nothing applied"
    /// sentinel when the optimizer ran without changing anything.
    pub fn summary(&self) -> String {
        if self.applied_transforms.is_empty() {
            NO_OPTIMIZATIONS.to_string()
        } else {
            self.applied_transforms.join("\n")
        }
    }

    /// Whether the listing was cut short by a missing end marker.
    pub fn is_malformed(&self) -> bool {
        self.final_code.as_deref() == Some(UNPARSEABLE_IR)
    }

    /// Render for the optimization channel.
    pub fn render(&self) -> String {
        let mut out = format!("Applied Optimizations:\n{}", self.summary());
        if let Some(code) = &self.final_code {
            out.push_str("\n\nFinal Optimized Code:\n");
            out.push_str(code);
        }
        out
    }
}

/// Pull the optimizer report out of `stdout`, if the optimizer ran.
pub fn extract(stdout: &str) -> Option<OptimizationReport> {
    if !stdout.contains(OPTIMIZER_START) {
        return None;
    }

    let applied_transforms = stdout
        .lines()
        .filter(|line| line.contains(APPLIED_TOKEN))
        .map(str::to_string)
        .collect();

    Some(OptimizationReport {
        applied_transforms,
        final_code: extract_final_code(stdout),
    })
}

fn extract_final_code(stdout: &str) -> Option<String> {
    let start = stdout.find(OPTIMIZED_IR)? + OPTIMIZED_IR.len();
    let rest = &stdout[start..];

    let Some(end) = rest.find(OPTIMIZER_END) else {
        tracing::warn!(
            event = "optimizer.malformed",
            "optimized IR listing has no end marker"
        );
        return Some(UNPARSEABLE_IR.to_string());
    };

    let code = rest[..end].trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
