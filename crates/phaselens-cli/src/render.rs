//! Terminal display of an [`OutputModel`].

use phaselens_core::{Channel, OutputModel};
use serde::Serialize;

/// Text shown for a phase report with nothing routed to any channel.
pub const NO_OUTPUT: &str = "No output yet.";

/// Rendered output split by destination stream.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Rendered {
    pub stdout: String,
    pub stderr: String,
}

/// Render `model` as human-readable text.
///
/// Failures go to stderr. A crash notice is printed as its own block after
/// the compiler's stderr. With `only`, a phase report shows just that channel.
pub fn render_text(model: &OutputModel, only: Option<Channel>) -> Rendered {
    let mut out = Rendered::default();

    match model {
        OutputModel::CrashFailure {
            message,
            crash_notice,
        } => {
            out.stderr.push_str("Compiler Error:\n");
            out.stderr.push_str(message.trim_end());
            out.stderr.push('\n');
            if let Some(notice) = crash_notice {
                out.stderr.push_str("\nCompiler Crash:\n");
                out.stderr.push_str(notice);
                out.stderr.push('\n');
            }
        }
        OutputModel::CompileError { message } => {
            out.stderr.push_str("Compiler Error:\n");
            out.stderr.push_str(message);
            out.stderr.push('\n');
        }
        OutputModel::RawMessage { text } => {
            out.stdout.push_str("Compiler Output:\n");
            out.stdout.push_str(text.trim_end());
            out.stdout.push('\n');
        }
        OutputModel::PhaseReport { .. } => {
            let channels: Vec<Channel> = match only {
                Some(channel) => vec![channel],
                None => Channel::ALL.to_vec(),
            };
            let sections: Vec<String> = channels
                .into_iter()
                .filter_map(|channel| {
                    model
                        .channel_text(channel)
                        .map(|text| format!("=== {channel} ===\n{}\n", text.trim_end()))
                })
                .collect();

            if sections.is_empty() {
                out.stdout.push_str(NO_OUTPUT);
                out.stdout.push('\n');
            } else {
                out.stdout.push_str(&sections.join("\n"));
            }
        }
    }

    out
}

#[derive(Serialize)]
struct ChannelView<'a> {
    channel: Channel,
    text: &'a str,
}

/// Render `model` as pretty JSON. With `only`, emit just that channel's text.
pub fn render_json(model: &OutputModel, only: Option<Channel>) -> serde_json::Result<String> {
    match only {
        None => serde_json::to_string_pretty(model),
        Some(channel) => {
            let text = model.channel_text(channel).unwrap_or_default();
            serde_json::to_string_pretty(&ChannelView {
                channel,
                text: &text,
            })
        }
    }
}
