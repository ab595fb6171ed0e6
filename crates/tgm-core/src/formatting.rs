//! Formatting of outgoing bodies (source markers, default captions).

use std::sync::OnceLock;

use regex::Regex;

use crate::domain::MediaKind;

/// Which outgoing shape a body is for. Text posts get a stricter scrub than
/// media captions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    Caption,
    Text,
}

const CAPTION_MARKER_PATTERNS: &[&str] = &[r"🔗\s*Source:.*", r"📌\s*From:.*"];

const TEXT_MARKER_PATTERNS: &[&str] = &[
    r"🔗\s*Source:.*",
    r"📌\s*From:.*",
    r"Source:.*",
    r"Via:.*",
    r"@FabrizioRomano",
    r"FabrizioRomano",
    r"Fabrizio",
    r"Romano",
    r"https://t\.me/FabrizioRomano",
    r"t\.me/FabrizioRomano",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    // `.` stops at the end of the line, so each marker only eats its own line.
    patterns
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).expect("valid source-marker regex"))
        .collect()
}

fn marker_res(kind: BodyKind) -> &'static [Regex] {
    static CAPTION: OnceLock<Vec<Regex>> = OnceLock::new();
    static TEXT: OnceLock<Vec<Regex>> = OnceLock::new();
    match kind {
        BodyKind::Caption => CAPTION.get_or_init(|| compile(CAPTION_MARKER_PATTERNS)),
        BodyKind::Text => TEXT.get_or_init(|| compile(TEXT_MARKER_PATTERNS)),
    }
}

/// Drop "Source:" / "From:" style attribution lines and trim.
pub fn strip_source_markers(text: &str, kind: BodyKind) -> String {
    let mut out = text.to_string();
    for re in marker_res(kind) {
        out = re.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Credit the source channel at the end of the body.
pub fn append_source(text: &str, chat_title: &str) -> String {
    if text.is_empty() {
        format!("🔗 Source: {chat_title}")
    } else {
        format!("{text}\n\n🔗 Source: {chat_title}")
    }
}

/// Apply the configured source policy: strip markers, or append one.
pub fn apply_source_policy(
    text: &str,
    kind: BodyKind,
    remove_source: bool,
    chat_title: &str,
) -> String {
    if remove_source {
        strip_source_markers(text, kind)
    } else {
        append_source(text, chat_title)
    }
}

/// Caption used when a media post ends up with no text at all.
pub fn default_media_caption(kind: MediaKind) -> String {
    format!("🏆 Football {}", kind.label())
}
