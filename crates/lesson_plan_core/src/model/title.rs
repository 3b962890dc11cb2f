//! Export document title derived from course metadata.
//!
//! Format: `02.{PU level} {U unit}{L lesson} Teaching Plan`, e.g.
//! `02.PU1 U7L1 Teaching Plan`.

use crate::model::plan::BasicInfo;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const LEVEL_PREFIX: &str = "PU";
const UNIT_PREFIX: &str = "U";
const LESSON_PREFIX: &str = "L";

/// Builds the export title for a plan header.
pub fn document_title(basic: &BasicInfo) -> String {
    let level = prefixed_part(&basic.level, LEVEL_PREFIX);
    let unit = prefixed_part(&basic.unit, UNIT_PREFIX);
    let lesson = prefixed_part(&basic.lesson_no, LESSON_PREFIX);

    let raw = format!("02.{level} {unit}{lesson} Teaching Plan");
    WHITESPACE_RE.replace_all(&raw, " ").trim().to_string()
}

/// Trims `value` and adds `prefix` unless it is already there (any case).
fn prefixed_part(value: &str, prefix: &str) -> String {
    let clean = value.trim();
    if clean.is_empty() {
        return String::new();
    }
    let has_prefix = clean
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    if has_prefix {
        clean.to_string()
    } else {
        format!("{prefix}{clean}")
    }
}
