//! Output model handed to display layers.
//!
//! An [`OutputModel`] is an immutable value built fresh for every compile
//! request. Display code decides how to render it; nothing here holds
//! state between requests.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::optimizer::OptimizationReport;

/// Fixed set of display channels, in display order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Lexical,
    Syntax,
    Semantic,
    #[serde(rename = "ir")]
    IR,
    Optimization,
    #[serde(rename = "codegen")]
    CodeGen,
}

impl Channel {
    /// Every channel in display order.
    pub const ALL: [Channel; 6] = [
        Channel::Lexical,
        Channel::Syntax,
        Channel::Semantic,
        Channel::IR,
        Channel::Optimization,
        Channel::CodeGen,
    ];

    /// Short display label for the channel.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Lexical => "Lexical",
            Channel::Syntax => "Syntax",
            Channel::Semantic => "Semantic",
            Channel::IR => "IR",
            Channel::Optimization => "Optimization",
            Channel::CodeGen => "CodeGen",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a channel name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown channel: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownChannel(s.to_string()))
    }
}

/// Accumulated text per channel for one request.
///
/// Writing to a channel that already holds text appends to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ChannelBodies(BTreeMap<Channel, String>);

impl ChannelBodies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `text` to `channel`.
    pub fn append(&mut self, channel: Channel, text: &str) {
        self.0.entry(channel).or_default().push_str(text);
    }

    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.0.get(&channel).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Populated channels in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, &str)> {
        self.0.iter().map(|(c, s)| (*c, s.as_str()))
    }
}

/// Result of interpreting one compile request. Exactly one variant is active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputModel {
    /// The toolchain wrote to its error stream.
    CrashFailure {
        /// Full stderr text.
        message: String,
        /// Separate notice when the process itself died abnormally.
        crash_notice: Option<String>,
    },

    /// A genuine error line was reported on stdout.
    CompileError { message: String },

    /// Phase output routed to channels.
    PhaseReport {
        channels: ChannelBodies,
        optimization: Option<OptimizationReport>,
    },

    /// Uninstrumented output, shown as-is.
    RawMessage { text: String },
}

impl OutputModel {
    /// Whether this outcome represents a failed compile.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OutputModel::CrashFailure { .. } | OutputModel::CompileError { .. }
        )
    }

    /// Short outcome name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            OutputModel::CrashFailure { .. } => "crash_failure",
            OutputModel::CompileError { .. } => "compile_error",
            OutputModel::PhaseReport { .. } => "phase_report",
            OutputModel::RawMessage { .. } => "raw_message",
        }
    }

    /// Text to display for `channel`, if this is a phase report and the
    /// channel was populated.
    ///
    /// The optimization channel is rendered from the optimization report.
    pub fn channel_text(&self, channel: Channel) -> Option<String> {
        let OutputModel::PhaseReport {
            channels,
            optimization,
        } = self
        else {
            return None;
        };

        let phase_text = channels.get(channel).map(str::to_string);
        if channel != Channel::Optimization {
            return phase_text;
        }

        match (phase_text, optimization) {
            (Some(mut text), Some(report)) => {
                text.push_str(&report.render());
                Some(text)
            }
            (None, Some(report)) => Some(report.render()),
            (text, None) => text,
        }
    }
}
