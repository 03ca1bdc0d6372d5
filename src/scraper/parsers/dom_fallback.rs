//! Header-less scorecard extraction for provider pages whose embedded data is
//! missing or unusable.
//!
//! The first cell of each row anchors the hole number; the remaining numeric
//! cells are classified purely by value range.

use scraper::Html;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use tracing::{debug, info};

use super::{
    cell_texts, gate, gated_u8, parse_leading_int, provider_course_name, rows, tables, HOLE_RANGE,
    PAR_RANGE, STROKE_INDEX_RANGE,
};
use crate::error::{Result, ScrapeError};
use crate::scraper::assembler::assemble;
use crate::scraper::course::{CourseDocument, ExtractionMethod, Hole, RawCourse, TeeKey};
use crate::scraper::parsers::table::{merge_hole, UNKNOWN_LOCATION};

/// A table needs this many valid holes (half a round) to count as a scorecard
pub const MIN_FALLBACK_HOLES: usize = 9;
/// Yardage window when there are no column headers to trust
pub const FALLBACK_YARDAGE_RANGE: RangeInclusive<i64> = 100..=600;
/// Tee identity guessed from yardage order within a row
pub const FALLBACK_TEE_ORDER: [&str; 3] = ["white", "yellow", "red"];

/// Parser for provider scorecard tables without embedded data
pub struct DomFallbackParser;

impl DomFallbackParser {
    pub fn parse(html: &str, title: &str, source_url: &str) -> Result<CourseDocument> {
        let holes = Self::extract_holes(html)?;

        let raw = RawCourse {
            name: provider_course_name(title),
            location: UNKNOWN_LOCATION.to_string(),
            holes,
            tees: Vec::new(),
        };

        Ok(assemble(raw, source_url, ExtractionMethod::DomFallback))
    }

    /// Holes from the first table reaching `MIN_FALLBACK_HOLES`
    pub fn extract_holes(html: &str) -> Result<Vec<Hole>> {
        let document = Html::parse_document(html);

        for (table_index, table) in tables(&document).enumerate() {
            let mut holes: BTreeMap<u8, Hole> = BTreeMap::new();

            for row in rows(&table) {
                let cells = cell_texts(&row);
                let Some(number) = cells.first().and_then(|t| gated_u8(t, &HOLE_RANGE)) else {
                    continue;
                };

                let values: Vec<i64> = cells[1..]
                    .iter()
                    .filter_map(|t| parse_leading_int(t))
                    .collect();

                let mut observed = Hole::new(number);
                if let Some(existing) = holes.get(&number) {
                    observed.par = existing.par;
                    observed.stroke_index = existing.stroke_index;
                }
                classify_values(&mut observed, &values);
                merge_hole(&mut holes, observed);
            }

            if holes.len() >= MIN_FALLBACK_HOLES {
                info!(
                    "DOM fallback accepted table {} with {} holes",
                    table_index + 1,
                    holes.len()
                );
                return Ok(holes.into_values().collect());
            }

            if !holes.is_empty() {
                debug!(
                    "Table {} has only {} valid holes, skipping",
                    table_index + 1,
                    holes.len()
                );
            }
        }

        Err(ScrapeError::NoScorecardFound)
    }
}

/// Fill par, then stroke index, then yardages from a row's numeric cells.
/// Par and stroke index are only taken when the hole has none yet.
fn classify_values(hole: &mut Hole, values: &[i64]) {
    let mut used = vec![false; values.len()];

    if hole.par.is_none() {
        if let Some(i) = first_unused(values, &used, &PAR_RANGE) {
            hole.par = u8::try_from(values[i]).ok();
            used[i] = true;
        }
    }

    if hole.stroke_index.is_none() {
        if let Some(i) = first_unused(values, &used, &STROKE_INDEX_RANGE) {
            hole.stroke_index = u8::try_from(values[i]).ok();
            used[i] = true;
        }
    }

    assign_yardages_by_tee_order(hole, values, &used);
}

/// Remaining in-range values become white, yellow, red in that order.
///
/// Without headers the tee identity is a guess: pages listing tees in another
/// order get their yardages attributed to the wrong tee.
fn assign_yardages_by_tee_order(hole: &mut Hole, values: &[i64], used: &[bool]) {
    let yardages = values
        .iter()
        .zip(used)
        .filter(|(_, used)| !**used)
        .filter_map(|(value, _)| gate(Some(*value), &FALLBACK_YARDAGE_RANGE))
        .filter_map(|value| u32::try_from(value).ok());

    for (tee, yards) in FALLBACK_TEE_ORDER.iter().zip(yardages) {
        hole.yardage_by_tee.insert(TeeKey::from(*tee), yards);
    }
}

fn first_unused(values: &[i64], used: &[bool], range: &RangeInclusive<i64>) -> Option<usize> {
    values
        .iter()
        .zip(used)
        .position(|(value, used)| !used && range.contains(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&str]) -> String {
        let body: String = rows.iter().map(|r| format!("<tr>{}</tr>", r)).collect();
        format!("<table>{}</table>", body)
    }

    fn table_html(rows: &[&str]) -> String {
        format!("<html><body>{}</body></html>", table(rows))
    }

    fn hole_rows(count: u8) -> Vec<String> {
        (1..=count)
            .map(|n| format!("<td>{}</td><td>4</td><td>{}</td><td>{}</td>", n, n, 300 + n as u32))
            .collect()
    }

    #[test]
    fn test_nine_holes_accepted() {
        let rows = hole_rows(9);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let doc = DomFallbackParser::parse(&table_html(&refs), "Lakeside | BlueGolf", "u").unwrap();

        assert_eq!(doc.holes.len(), 9);
        assert_eq!(doc.name, "Lakeside");
        assert_eq!(doc.total_par, 36);
        assert_eq!(doc.extraction_method, ExtractionMethod::DomFallback);
    }

    #[test]
    fn test_eight_holes_rejected() {
        let rows = hole_rows(8);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        assert_eq!(
            DomFallbackParser::parse(&table_html(&refs), "", "").unwrap_err(),
            ScrapeError::NoScorecardFound
        );
    }

    #[test]
    fn test_value_classification() {
        let mut hole = Hole::new(1);
        classify_values(&mut hole, &[4, 7, 380, 350, 300, 250]);

        assert_eq!(hole.par, Some(4));
        assert_eq!(hole.stroke_index, Some(7));
        assert_eq!(hole.yardage(&TeeKey::from("white")), Some(380));
        assert_eq!(hole.yardage(&TeeKey::from("yellow")), Some(350));
        assert_eq!(hole.yardage(&TeeKey::from("red")), Some(300));
        assert_eq!(hole.yardage_by_tee.len(), 3);
    }

    #[test]
    fn test_classification_priority_ignores_position() {
        let mut hole = Hole::new(3);
        classify_values(&mut hole, &[165, 3, 140, 17]);

        assert_eq!(hole.par, Some(3));
        assert_eq!(hole.stroke_index, Some(17));
        assert_eq!(hole.yardage(&TeeKey::from("white")), Some(165));
        assert_eq!(hole.yardage(&TeeKey::from("yellow")), Some(140));
    }

    #[test]
    fn test_fallback_yardage_window() {
        let mut hole = Hole::new(5);
        classify_values(&mut hole, &[5, 2, 650, 90, 480]);

        assert_eq!(hole.yardage(&TeeKey::from("white")), Some(480));
        assert_eq!(hole.yardage_by_tee.len(), 1);
    }

    #[test]
    fn test_repeat_row_keeps_par() {
        let mut rows = hole_rows(9);
        rows.push("<td>1</td><td>3</td><td>520</td>".to_string());
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();

        let holes = DomFallbackParser::extract_holes(&table_html(&refs)).unwrap();
        let first = &holes[0];
        assert_eq!(first.par, Some(4));
        assert_eq!(first.stroke_index, Some(1));
        assert_eq!(first.yardage(&TeeKey::from("white")), Some(520));
    }

    #[test]
    fn test_small_table_skipped_for_later_one() {
        let small = table(&["<td>1</td><td>4</td><td>380</td>"]);
        let rows = hole_rows(9);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let html = format!("<html><body>{}{}</body></html>", small, table(&refs));

        let holes = DomFallbackParser::extract_holes(&html).unwrap();
        assert_eq!(holes.len(), 9);
        assert_eq!(holes[0].yardage(&TeeKey::from("white")), Some(301));
    }

    #[test]
    fn test_default_provider_name() {
        let rows = hole_rows(9);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let doc = DomFallbackParser::parse(&table_html(&refs), "", "").unwrap();
        assert_eq!(doc.name, crate::scraper::parsers::PROVIDER_DEFAULT_COURSE);
    }
}
