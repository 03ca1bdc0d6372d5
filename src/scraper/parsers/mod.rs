//! Scorecard extraction strategies and the helpers they share.

pub mod dom_fallback;
pub mod embedded;
pub mod table;

pub use dom_fallback::DomFallbackParser;
pub use embedded::EmbeddedDataParser;
pub use table::TableParser;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::ops::RangeInclusive;
use std::sync::LazyLock;

pub const HOLE_RANGE: RangeInclusive<i64> = 1..=18;
pub const PAR_RANGE: RangeInclusive<i64> = 3..=5;
pub const STROKE_INDEX_RANGE: RangeInclusive<i64> = 1..=18;
/// Yardage window for header-driven and embedded extraction
pub const YARDAGE_RANGE: RangeInclusive<i64> = 50..=700;

/// Tee color tokens recognised in table headers
pub const TEE_COLORS: [&str; 9] = [
    "white", "yellow", "red", "blue", "black", "gold", "green", "orange", "purple",
];

/// Course name used when a provider page has no usable title
pub const PROVIDER_DEFAULT_COURSE: &str = "BlueGolf Course";

static PROVIDER_BRANDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bbluegolf(?:\.com)?\b|\bscorecard\b").expect("static regex")
});

static TABLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("static selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));

pub(crate) fn tables(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document.select(&TABLE_SELECTOR)
}

pub(crate) fn rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table.select(&ROW_SELECTOR).collect()
}

/// Trimmed text of every `td`/`th` in a row
pub(crate) fn cell_texts(row: &ElementRef) -> Vec<String> {
    row.select(&CELL_SELECTOR)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

pub(crate) fn document_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Course name from a provider page title with branding removed.
pub fn provider_course_name(title: &str) -> String {
    let stripped = PROVIDER_BRANDING.replace_all(title, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    let name = collapsed.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '|' | '-' | ':' | '\u{2013}' | '\u{2014}')
    });

    if name.is_empty() {
        PROVIDER_DEFAULT_COURSE.to_string()
    } else {
        name.to_string()
    }
}

/// Leading-integer parse: "382 yds" -> 382, "4*" -> 4, "Out" -> None.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }

    let value: i64 = rest[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Keep a value only when it falls inside `range`.
pub fn gate(value: Option<i64>, range: &RangeInclusive<i64>) -> Option<i64> {
    value.filter(|v| range.contains(v))
}

pub(crate) fn gated_u8(text: &str, range: &RangeInclusive<i64>) -> Option<u8> {
    gate(parse_leading_int(text), range).and_then(|v| u8::try_from(v).ok())
}

pub(crate) fn gated_u32(text: &str, range: &RangeInclusive<i64>) -> Option<u32> {
    gate(parse_leading_int(text), range).and_then(|v| u32::try_from(v).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("382"), Some(382));
        assert_eq!(parse_leading_int("  12 "), Some(12));
        assert_eq!(parse_leading_int("410 yds"), Some(410));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("Out"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_gates() {
        assert_eq!(gated_u8("4", &PAR_RANGE), Some(4));
        assert_eq!(gated_u8("6", &PAR_RANGE), None);
        assert_eq!(gated_u8("19", &HOLE_RANGE), None);
        assert_eq!(gated_u32("3120", &YARDAGE_RANGE), None);
        assert_eq!(gated_u32("49", &YARDAGE_RANGE), None);
        assert_eq!(gated_u32("700", &YARDAGE_RANGE), Some(700));
    }

    #[test]
    fn test_provider_course_name() {
        assert_eq!(provider_course_name("Cedar Hollow - Scorecard | BlueGolf"), "Cedar Hollow");
        assert_eq!(provider_course_name("BlueGolf.com: Lakeside CC"), "Lakeside CC");
        assert_eq!(provider_course_name("Scorecard | BlueGolf"), PROVIDER_DEFAULT_COURSE);
        assert_eq!(provider_course_name(""), PROVIDER_DEFAULT_COURSE);
    }

    #[test]
    fn test_document_title() {
        let doc = Html::parse_document("<html><head><title> Pine Valley </title></head></html>");
        assert_eq!(document_title(&doc), "Pine Valley");
        assert_eq!(document_title(&Html::parse_document("<p>x</p>")), "");
    }
}
