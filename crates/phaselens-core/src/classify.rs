//! Error-vs-success classification of captured compiler output.
//!
//! Precedence is fixed: anything on stderr is a crash, then the first
//! genuine error line on stdout, then clean output.

use serde::{Deserialize, Serialize};

use crate::invoker::InvocationResult;

/// Substring marking that the compiler process itself died.
pub const CRASH_MARKER: &str = "Segmentation fault";

/// Notice reported alongside stderr when [`CRASH_MARKER`] is present.
pub const CRASH_NOTICE: &str = "The compiler crashed with a Segmentation Fault.";

/// Lowercase token that makes a stdout line a candidate error.
const ERROR_TOKEN: &str = "error";

/// Checkmark glyphs that mark a line as a success message. The second is
/// the first one decoded with the wrong code page.
const CHECKMARKS: [&str; 2] = ["\u{2713}", "\u{e2}\u{153}\u{201c}"];

/// Outcome of classifying one invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classification {
    /// stderr was non-empty.
    Crash {
        stderr: String,
        notice: Option<String>,
    },

    /// First genuine error line from stdout, trimmed.
    CompileError { line: String },

    /// Nothing went wrong; stdout is ready for segmentation.
    Clean,
}

/// Classify captured output.
pub fn classify(result: &InvocationResult) -> Classification {
    classify_streams(&result.stdout, &result.stderr)
}

/// Classify a raw stdout/stderr pair.
pub fn classify_streams(stdout: &str, stderr: &str) -> Classification {
    if !stderr.is_empty() {
        let notice = stderr
            .contains(CRASH_MARKER)
            .then(|| CRASH_NOTICE.to_string());
        return Classification::Crash {
            stderr: stderr.to_string(),
            notice,
        };
    }

    match first_error_line(stdout) {
        Some(line) => Classification::CompileError {
            line: line.trim().to_string(),
        },
        None => Classification::Clean,
    }
}

/// First stdout line mentioning "error" that is not a success message.
///
/// Scanning stops at the first qualifying line.
pub fn first_error_line(stdout: &str) -> Option<&str> {
    for line in stdout.lines() {
        let lower = line.to_lowercase();
        if !lower.contains(ERROR_TOKEN) {
            continue;
        }
        if is_suppressed(line, &lower) {
            continue;
        }
        return Some(line);
    }
    None
}

// "0 " is matched anywhere in the line, so a genuine error such as
// "error at line 10 column 4" is also skipped.
fn is_suppressed(line: &str, lower: &str) -> bool {
    lower.contains("no ") || lower.contains("0 ") || CHECKMARKS.iter().any(|m| line.contains(m))
}
