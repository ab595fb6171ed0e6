//! Attribution stripping for mirrored text.

use std::sync::OnceLock;

use regex::Regex;

/// Handles and links of the upstream sources, removed case-insensitively and
/// in this order.
const ATTRIBUTION_PATTERNS: &[&str] = &[
    r"@myachPRO",
    r"\bmyachPRO\b",
    r"@FabrizioRomanoTG",
    r"@FabrizioRomano",
    r"Fabrizio",
    r"Romano",
    r"https://t\.me/FabrizioRomano",
    r"t\.me/FabrizioRomano",
];

fn attribution_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        ATTRIBUTION_PATTERNS
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("valid attribution regex"))
            .collect()
    })
}

fn blank_lines_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n\s*\n").expect("valid blank-line regex"))
}

/// Strip attribution and squeeze blank lines. `None` and `""` give `""`.
///
/// A single pass can splice a new match together ("FabrizFabrizioio"), so the
/// pass is repeated until the text stops changing. Every change shortens the
/// text, which bounds the loop.
pub fn clean(text: Option<&str>) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let mut current = text.to_string();
    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let mut out = text.to_string();
    for re in attribution_res() {
        out = re.replace_all(&out, "").into_owned();
    }
    out = blank_lines_re().replace_all(&out, "\n").into_owned();
    out.trim().to_string()
}
