//! Phase segmentation of compiler stdout.
//!
//! The compiler announces each phase with a banner:
//!
//! ```text
//! ==============================
//!  Phase: Semantic Analysis
//! ==============================
//! ```
//!
//! Everything up to the next banner (or end of stream) is that phase's body.
//! Text before the first banner is preamble and is dropped.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{Channel, ChannelBodies};

/// Separator line used when rendering banners.
pub const BANNER_RULE: &str = "==============================";

/// Two or more `=`, a ` Phase: <title>` line, two or more `=`. The title is
/// lazy and may span lines.
const BANNER_PATTERN: &str = r"(?s)={2,}\n Phase: (.*?)\n={2,}\n";

fn banner_regex() -> &'static Regex {
    static BANNER: OnceLock<Regex> = OnceLock::new();
    BANNER.get_or_init(|| Regex::new(BANNER_PATTERN).expect("banner pattern is a valid regex"))
}

/// One banner-delimited section of stdout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhaseRecord {
    /// Title as captured from the banner, before trimming.
    pub raw_title: String,

    /// Phase body with surrounding whitespace trimmed.
    pub body: String,
}

impl PhaseRecord {
    pub fn new(raw_title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            raw_title: raw_title.into(),
            body: body.into(),
        }
    }

    /// Title with surrounding whitespace removed.
    pub fn title(&self) -> &str {
        self.raw_title.trim()
    }

    /// Display channel for this phase, if it has one.
    pub fn channel(&self) -> Option<Channel> {
        map_title(self.title())
    }

    /// Banner and body as the compiler prints them.
    pub fn render(&self) -> String {
        format!(
            "{BANNER_RULE}\n Phase: {}\n{BANNER_RULE}\n{}\n",
            self.raw_title, self.body
        )
    }
}

/// Split `stdout` into phases in stream order.
pub fn segment(stdout: &str) -> Vec<PhaseRecord> {
    let banners: Vec<_> = banner_regex().captures_iter(stdout).collect();
    let mut records = Vec::with_capacity(banners.len());

    for (i, caps) in banners.iter().enumerate() {
        let (Some(whole), Some(title)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let body_end = banners
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(stdout.len(), |m| m.start());

        records.push(PhaseRecord::new(
            title.as_str(),
            stdout[whole.end()..body_end].trim(),
        ));
    }

    records
}

/// Phase titles the compiler prints, in pipeline order, with their channel.
///
/// The optimizer is not listed: it reports through its own markers.
pub static PHASE_TITLES: [(&str, Channel); 5] = [
    ("Lexical and Syntax Analysis", Channel::Lexical),
    ("Syntax Analysis (AST)", Channel::Syntax),
    ("Semantic Analysis", Channel::Semantic),
    ("Intermediate Representation (IR)", Channel::IR),
    ("Code Generation", Channel::CodeGen),
];

/// Map a trimmed phase title to its display channel.
pub fn map_title(title: &str) -> Option<Channel> {
    PHASE_TITLES
        .iter()
        .find(|(known, _)| *known == title)
        .map(|&(_, channel)| channel)
}

/// Titles routed to `channel`, in pipeline order.
pub fn titles_for(channel: Channel) -> impl Iterator<Item = &'static str> {
    PHASE_TITLES
        .iter()
        .filter(move |&&(_, routed)| routed == channel)
        .map(|&(title, _)| title)
}

/// Route phase bodies to channels. Unmapped phases are dropped.
pub fn route(records: &[PhaseRecord]) -> ChannelBodies {
    let mut bodies = ChannelBodies::new();
    for record in records {
        match record.channel() {
            Some(channel) => bodies.append(channel, &record.body),
            None => tracing::debug!(title = %record.title(), "dropping unmapped phase"),
        }
    }
    bodies
}

/// Re-wrap phases with their banners.
pub fn render_phases(records: &[PhaseRecord]) -> String {
    records.iter().map(PhaseRecord::render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn banner(title: &str) -> String {
        format!("{BANNER_RULE}\n Phase: {title}\n{BANNER_RULE}\n")
    }

    #[test]
    fn test_two_phases() {
        let stdout = format!(
            "{}A\n{}B\n",
            banner("Semantic Analysis"),
            banner("Code Generation")
        );
        let records = segment(&stdout);
        assert_eq!(
            records,
            vec![
                PhaseRecord::new("Semantic Analysis", "A"),
                PhaseRecord::new("Code Generation", "B"),
            ]
        );

        let bodies = route(&records);
        assert_eq!(bodies.get(Channel::Semantic), Some("A"));
        assert_eq!(bodies.get(Channel::CodeGen), Some("B"));
        assert_eq!(bodies.len(), 2);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let stdout = format!("Compiling main.mylang...\n{}tokens\n", banner("Lexical and Syntax Analysis"));
        let records = segment(&stdout);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].body, "tokens");
    }

    #[test]
    fn test_no_banner_yields_nothing() {
        assert!(segment("Hello\n").is_empty());
        assert!(segment("").is_empty());
        assert!(segment("==\nPhase: missing space\n==\n").is_empty());
    }

    #[test]
    fn test_phase_keyword_is_case_sensitive() {
        assert!(segment("=====\n phase: Semantic Analysis\n=====\nA\n").is_empty());
    }

    #[test]
    fn test_short_rules_accepted() {
        let records = segment("==\n Phase: Code Generation\n==\nMOV r0, 1\n");
        assert_eq!(records, vec![PhaseRecord::new("Code Generation", "MOV r0, 1")]);
    }

    #[test]
    fn test_title_whitespace_and_newlines_tolerated() {
        let stdout = "=====\n Phase:   Semantic Analysis  \n=====\nA\n=====\n Phase: Code\nGeneration\n=====\nB\n";
        let records = segment(stdout);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].raw_title, "  Semantic Analysis  ");
        assert_eq!(records[0].channel(), Some(Channel::Semantic));
        assert_eq!(records[1].raw_title, "Code\nGeneration");
        assert_eq!(records[1].channel(), None);
    }

    #[test]
    fn test_empty_body_between_banners() {
        let stdout = format!("{}{}x\n", banner("Semantic Analysis"), banner("Code Generation"));
        let records = segment(&stdout);
        assert_eq!(records[0].body, "");
        assert_eq!(records[1].body, "x");
    }

    #[test]
    fn test_unmapped_phases_dropped() {
        let stdout = format!(
            "{}opt stuff\n{}IR\n",
            banner("Optimization"),
            banner("Intermediate Representation (IR)")
        );
        let records = segment(&stdout);
        assert_eq!(records.len(), 2);
        let bodies = route(&records);
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies.get(Channel::IR), Some("IR"));
        assert!(bodies.get(Channel::Optimization).is_none());
    }

    #[test]
    fn test_repeated_phase_appends() {
        let stdout = format!("{}t1\n{}t2\n", banner("Semantic Analysis"), banner("Semantic Analysis"));
        let bodies = route(&segment(&stdout));
        assert_eq!(bodies.get(Channel::Semantic), Some("t1t2"));
    }

    #[test]
    fn test_mapping_table() {
        assert_eq!(map_title("Lexical and Syntax Analysis"), Some(Channel::Lexical));
        assert_eq!(map_title("Syntax Analysis (AST)"), Some(Channel::Syntax));
        assert_eq!(map_title("Semantic Analysis"), Some(Channel::Semantic));
        assert_eq!(map_title("Intermediate Representation (IR)"), Some(Channel::IR));
        assert_eq!(map_title("Code Generation"), Some(Channel::CodeGen));
        assert_eq!(map_title("code generation"), None);
        assert_eq!(map_title("Optimization"), None);
    }

    #[test]
    fn test_titles_for_channel() {
        assert_eq!(
            titles_for(Channel::IR).collect::<Vec<_>>(),
            vec!["Intermediate Representation (IR)"]
        );
        assert_eq!(titles_for(Channel::Optimization).count(), 0);
        for (title, channel) in PHASE_TITLES {
            assert_eq!(map_title(title), Some(channel));
        }
    }

    #[test]
    fn test_resegment_rendered_phases_is_stable() {
        let stdout = format!(
            "preamble\n{}[KEYWORD] let\n[IDENT] x\n\n{}Program\n  \u{2514}\u{2500} Print\n{}\u{2714} No semantic errors found.\n",
            banner("Lexical and Syntax Analysis"),
            banner("Syntax Analysis (AST)"),
            banner("Semantic Analysis")
        );
        let first = segment(&stdout);
        let second = segment(&render_phases(&first));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
