//! Header-driven scorecard extraction for arbitrary pages.
//!
//! Every `<table>` with at least three rows is scanned for header keywords
//! ("hole", tee colors, "par", "hdcp"/"handicap"/"index"). Tables with a hole
//! column contribute their data rows; everything else is ignored.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::{
    cell_texts, document_title, gated_u32, gated_u8, rows, tables, HOLE_RANGE, PAR_RANGE,
    STROKE_INDEX_RANGE, TEE_COLORS, YARDAGE_RANGE,
};
use crate::error::{Result, ScrapeError};
use crate::scraper::assembler::assemble;
use crate::scraper::course::{CourseDocument, ExtractionMethod, Hole, RawCourse, TeeKey};

/// Tables with fewer rows cannot be a scorecard
pub const MIN_TABLE_ROWS: usize = 3;
/// Data rows with fewer cells are skipped
pub const MIN_ROW_CELLS: usize = 3;

pub const UNKNOWN_COURSE: &str = "Unknown Course";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

static SCORECARD_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*Scorecard.*$").expect("static regex"));

/// Column roles discovered in one table. Later keyword matches override
/// earlier ones, so the last matching cell in scan order wins.
#[derive(Debug, Default, PartialEq)]
struct ColumnLayout {
    header_row: Option<usize>,
    hole: Option<usize>,
    par: Option<usize>,
    stroke_index: Option<usize>,
    tees: Vec<(&'static str, usize)>,
}

impl ColumnLayout {
    fn detect(rows: &[Vec<String>]) -> Option<Self> {
        let mut layout = ColumnLayout::default();

        for (row_index, cells) in rows.iter().enumerate() {
            for (col, text) in cells.iter().enumerate() {
                let text = text.to_lowercase();

                if text.contains("hole") {
                    layout.hole = Some(col);
                    layout.header_row = Some(row_index);
                }

                for color in TEE_COLORS {
                    if text.contains(color) {
                        match layout.tees.iter_mut().find(|(c, _)| *c == color) {
                            Some(entry) => entry.1 = col,
                            None => layout.tees.push((color, col)),
                        }
                    }
                }

                if text.contains("par") {
                    layout.par = Some(col);
                }

                if text.contains("hdcp") || text.contains("handicap") || text.contains("index") {
                    layout.stroke_index = Some(col);
                }
            }
        }

        (layout.header_row.is_some() && layout.hole.is_some()).then_some(layout)
    }

    fn parse_row(&self, cells: &[String]) -> Option<Hole> {
        if cells.len() < MIN_ROW_CELLS {
            return None;
        }

        let number = gated_u8(cells.get(self.hole?)?, &HOLE_RANGE)?;
        let mut hole = Hole::new(number);

        hole.par = self
            .par
            .and_then(|i| cells.get(i))
            .and_then(|text| gated_u8(text, &PAR_RANGE));

        hole.stroke_index = self
            .stroke_index
            .and_then(|i| cells.get(i))
            .and_then(|text| gated_u8(text, &STROKE_INDEX_RANGE));

        for (color, col) in &self.tees {
            if let Some(yards) = cells.get(*col).and_then(|text| gated_u32(text, &YARDAGE_RANGE)) {
                hole.yardage_by_tee.insert(TeeKey::from(*color), yards);
            }
        }

        Some(hole)
    }
}

/// Parser for generic scorecard pages
pub struct TableParser;

impl TableParser {
    /// Parse a rendered page into a course document
    pub fn parse(html: &str, source_url: &str) -> Result<CourseDocument> {
        let raw = Self::extract(html)?;
        Ok(assemble(raw, source_url, ExtractionMethod::GenericTable))
    }

    /// Run the table heuristics without aggregating
    pub fn extract(html: &str) -> Result<RawCourse> {
        let document = Html::parse_document(html);
        let name = Self::parse_name(&document);
        info!("Extracting scorecard for: {}", name);

        let mut holes: BTreeMap<u8, Hole> = BTreeMap::new();
        let mut header_found = false;

        for (table_index, table) in tables(&document).enumerate() {
            let table_rows: Vec<Vec<String>> = rows(&table).iter().map(cell_texts).collect();
            if table_rows.len() < MIN_TABLE_ROWS {
                continue;
            }

            debug!("Checking table {} with {} rows", table_index + 1, table_rows.len());

            let Some(layout) = ColumnLayout::detect(&table_rows) else {
                continue;
            };
            header_found = true;

            debug!(
                "Scorecard header at row {:?}: hole={:?} par={:?} hdcp={:?} tees={:?}",
                layout.header_row, layout.hole, layout.par, layout.stroke_index, layout.tees
            );

            for (row_index, cells) in table_rows.iter().enumerate() {
                if Some(row_index) == layout.header_row {
                    continue;
                }
                if let Some(hole) = layout.parse_row(cells) {
                    debug!(
                        "Hole {}: par {:?}, hdcp {:?}, yardages {:?}",
                        hole.number, hole.par, hole.stroke_index, hole.yardage_by_tee
                    );
                    merge_hole(&mut holes, hole);
                }
            }
        }

        if !header_found || holes.is_empty() {
            return Err(ScrapeError::NoScorecardFound);
        }

        Ok(RawCourse {
            name,
            location: UNKNOWN_LOCATION.to_string(),
            holes: holes.into_values().collect(),
            tees: Vec::new(),
        })
    }

    fn parse_name(document: &Html) -> String {
        let title = document_title(document);
        let cleaned = SCORECARD_SUFFIX.replace(&title, "").trim().to_string();
        if !cleaned.is_empty() {
            return cleaned;
        }

        if let Ok(selector) = Selector::parse("h1") {
            if let Some(elem) = document.select(&selector).next() {
                let text = elem.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    return text;
                }
            }
        }

        UNKNOWN_COURSE.to_string()
    }
}

/// Duplicate hole numbers merge field-wise; the later known value wins.
pub(crate) fn merge_hole(holes: &mut BTreeMap<u8, Hole>, hole: Hole) {
    match holes.get_mut(&hole.number) {
        Some(existing) => existing.merge(hole),
        None => {
            holes.insert(hole.number, hole);
        }
    }
}
