//! Label/value rules run over the flattened job description.
//!
//! Each rule is case-insensitive and keeps the whole matched span (label,
//! separator and value), trimmed, rather than just the value.

use super::dom::find_pattern;
use regex::Regex;
use std::sync::OnceLock;

/// Fields derived from free description text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionFields {
    pub experience: Option<String>,
    pub compensation: Option<String>,
    pub notice_period: Option<String>,
    pub parsed_location: Option<String>,
    pub role_overview: Option<String>,
}

static WHITESPACE: OnceLock<Regex> = OnceLock::new();
static EXPERIENCE: OnceLock<Regex> = OnceLock::new();
static COMPENSATION: OnceLock<Regex> = OnceLock::new();
static NOTICE_PERIOD: OnceLock<Regex> = OnceLock::new();
static LOCATION: OnceLock<Regex> = OnceLock::new();
static ROLE_LABEL: OnceLock<Regex> = OnceLock::new();
static ROLE_STOP: OnceLock<Regex> = OnceLock::new();

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static description pattern"))
}

fn whitespace() -> &'static Regex {
    compiled(&WHITESPACE, r"\s+")
}

fn experience() -> &'static Regex {
    compiled(
        &EXPERIENCE,
        r"(?i)(Experience)\s*[:\-–]?\s*(-?\s*\d+\+?\s*(?:Years|Yrs)?)",
    )
}

fn compensation() -> &'static Regex {
    compiled(
        &COMPENSATION,
        r"(?i)(CTC|Compensation)\s*[:\-–]?\s*([\w\s.,+/-]+)",
    )
}

fn notice_period() -> &'static Regex {
    compiled(&NOTICE_PERIOD, r"(?i)(NP|Notice\s*Period)\s*[:\-–]?\s*([\w\s]+)")
}

fn location() -> &'static Regex {
    compiled(&LOCATION, r"(?i)(Location)\s*[:\-–]?\s*([\w\s,&()/-]+)")
}

fn role_label() -> &'static Regex {
    compiled(
        &ROLE_LABEL,
        r"(?i)(Role|Position|Job\s*Title|Job\s*Description)\s*[:\-–]?\s*",
    )
}

/// Where a role overview ends: a newline or the start of another section.
fn role_stop() -> &'static Regex {
    compiled(&ROLE_STOP, r"(?i)\n|Responsibilities|Experience|Location")
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace().replace_all(text, " ").trim().to_string()
}

fn whole_match(pattern: &Regex, text: &str) -> Option<String> {
    find_pattern(text, pattern).map(|m| m.trim().to_string())
}

/// Role label plus the shortest following run that ends right before a
/// newline, a reserved section keyword, or the end of the text.
fn role_overview(text: &str) -> Option<String> {
    let label = role_label().find(text)?;
    let end = role_stop()
        .find_at(text, label.end())
        .map(|stop| stop.start())
        .unwrap_or(text.len());
    Some(text[label.start()..end].trim().to_string())
}

/// Run all five rules independently.
pub fn parse_description(text: &str) -> DescriptionFields {
    DescriptionFields {
        experience: whole_match(experience(), text),
        compensation: whole_match(compensation(), text),
        notice_period: whole_match(notice_period(), text),
        parsed_location: whole_match(location(), text),
        role_overview: role_overview(text),
    }
}
