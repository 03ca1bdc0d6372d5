//! Scorecard extraction from JSON embedded in provider page scripts.
//!
//! Candidate fragments are cut out of each script by an ordered list of
//! matchers; the first fragment that parses as strict JSON and yields a usable
//! hole list wins.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, info};

use super::{
    gate, parse_leading_int, provider_course_name, HOLE_RANGE, PAR_RANGE, STROKE_INDEX_RANGE,
    YARDAGE_RANGE,
};
use crate::error::{Result, ScrapeError};
use crate::scraper::assembler::assemble;
use crate::scraper::course::{
    capitalize, CourseDocument, ExtractionMethod, Hole, RawCourse, Tee, TeeKey,
};
use crate::scraper::parsers::table::UNKNOWN_LOCATION;

/// Scripts mentioning none of these are skipped
const SCRIPT_TOKENS: [&str; 4] = ["tees", "holes", "course", "scorecard"];

static GREEDY_TEES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)\{.*"tees".*\}"#).expect("static regex"));
static GLOBAL_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_$][\w$.]*\s*=\s*\{").expect("static regex"));

type Matcher = fn(&str) -> Vec<&str>;

/// Fragment matchers in priority order
const MATCHERS: [(&str, Matcher); 4] = [
    ("tees object", tees_objects),
    ("holes object", holes_objects),
    ("greedy tees span", greedy_tees_span),
    ("global assignment", assigned_objects),
];

/// Outcome of scanning one script
#[derive(Debug)]
pub enum ScriptMatch {
    Matched(EmbeddedCourse),
    NoMatch,
}

/// Course data recovered from a script
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCourse {
    pub name: Option<String>,
    pub location: Option<String>,
    pub holes: Vec<Hole>,
    pub tees: Vec<Tee>,
}

/// Parser for provider pages carrying scorecard JSON in inline scripts
pub struct EmbeddedDataParser;

impl EmbeddedDataParser {
    /// Parse script contents into a course document. `title` supplies the
    /// course name when the data carries none.
    pub fn parse(scripts: &[String], title: &str, source_url: &str) -> Result<CourseDocument> {
        let course = Self::extract(scripts)?;

        let raw = RawCourse {
            name: course.name.unwrap_or_else(|| provider_course_name(title)),
            location: course
                .location
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
            holes: course.holes,
            tees: course.tees,
        };

        Ok(assemble(raw, source_url, ExtractionMethod::EmbeddedJson))
    }

    pub fn extract(scripts: &[String]) -> Result<EmbeddedCourse> {
        for (index, script) in scripts.iter().enumerate() {
            if !SCRIPT_TOKENS.iter().any(|token| script.contains(token)) {
                continue;
            }

            match Self::match_script(script) {
                ScriptMatch::Matched(course) => {
                    info!(
                        "Embedded scorecard found in script {}: {} holes, {} tees",
                        index,
                        course.holes.len(),
                        course.tees.len()
                    );
                    return Ok(course);
                }
                ScriptMatch::NoMatch => debug!("Script {} has no usable course data", index),
            }
        }

        Err(ScrapeError::NoEmbeddedData)
    }

    /// Try each matcher in order; the first structurally valid fragment wins.
    pub fn match_script(script: &str) -> ScriptMatch {
        for (pattern, matcher) in MATCHERS {
            for fragment in matcher(script) {
                let value: Value = match serde_json::from_str(fragment) {
                    Ok(value) => value,
                    Err(e) => {
                        debug!("Rejected {} fragment: {}", pattern, e);
                        continue;
                    }
                };

                if let Some(course) = course_data(&value).and_then(build_course) {
                    debug!("Matched course data with {} pattern", pattern);
                    return ScriptMatch::Matched(course);
                }
            }
        }

        ScriptMatch::NoMatch
    }
}

/// Select the object holding course data: `course` when it carries tees,
/// otherwise the object itself when it has `tees` or `holes`.
fn course_data(value: &Value) -> Option<&Value> {
    let obj = value.as_object()?;

    if let Some(course) = obj.get("course").filter(|c| c.get("tees").is_some()) {
        return Some(course);
    }

    (obj.contains_key("tees") || obj.contains_key("holes")).then_some(value)
}

fn build_course(data: &Value) -> Option<EmbeddedCourse> {
    let tee_entries = data.get("tees")?.as_array()?;
    let first = tee_entries.first()?;

    let tees: Vec<Tee> = tee_entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_tee(entry, i))
        .collect();

    let first_holes = first.get("holes").and_then(Value::as_array)?;
    let (mut holes, positions) = canonical_holes(first_holes, &tees[0].key);
    if holes.is_empty() {
        return None;
    }

    for (entry, tee) in tee_entries.iter().zip(&tees).skip(1) {
        if let Some(entries) = entry.get("holes").and_then(Value::as_array) {
            align_tee_yardages_by_position(&mut holes, &positions, entries, &tee.key);
        }
    }

    Some(EmbeddedCourse {
        name: string_field(data, &["name", "courseName"]),
        location: location(data),
        holes,
        tees,
    })
}

/// Hole list defined by the first tee. `positions[i]` is the index into the
/// returned holes for entry `i`, or `None` when the entry was unusable.
fn canonical_holes(entries: &[Value], tee: &TeeKey) -> (Vec<Hole>, Vec<Option<usize>>) {
    let mut holes: Vec<Hole> = Vec::new();
    let mut positions = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(number) = int_field(entry, &["holeNumber", "number", "hole"])
            .filter(|n| HOLE_RANGE.contains(n))
            .and_then(|n| u8::try_from(n).ok())
        else {
            positions.push(None);
            continue;
        };

        let mut hole = Hole::new(number);
        hole.par = gate(int_field(entry, &["par"]), &PAR_RANGE).and_then(|v| u8::try_from(v).ok());
        hole.stroke_index = gate(
            int_field(entry, &["handicap", "strokeIndex", "hcp", "hdcp"]),
            &STROKE_INDEX_RANGE,
        )
        .and_then(|v| u8::try_from(v).ok());
        if let Some(yards) = hole_distance(entry) {
            hole.yardage_by_tee.insert(tee.clone(), yards);
        }

        match holes.iter().position(|h| h.number == number) {
            Some(existing) => {
                holes[existing].merge(hole);
                positions.push(Some(existing));
            }
            None => {
                positions.push(Some(holes.len()));
                holes.push(hole);
            }
        }
    }

    (holes, positions)
}

/// Record a later tee's distances against the canonical holes.
///
/// Entries are matched by array index, not by hole number. If this tee lists
/// holes in a different order or count than the first tee, yardages land on
/// the wrong hole or are dropped. Matching on the entry's own hole number
/// would fix that; the index rule mirrors how the provider publishes data.
fn align_tee_yardages_by_position(
    holes: &mut [Hole],
    positions: &[Option<usize>],
    entries: &[Value],
    tee: &TeeKey,
) {
    for (i, entry) in entries.iter().enumerate() {
        let Some(Some(target)) = positions.get(i) else {
            continue;
        };
        if let Some(yards) = hole_distance(entry) {
            holes[*target].yardage_by_tee.insert(tee.clone(), yards);
        }
    }
}

fn parse_tee(entry: &Value, index: usize) -> Tee {
    let name = string_field(entry, &["name", "teeName"]);
    let color = string_field(entry, &["color", "teeColor"]);

    let key = name
        .clone()
        .or_else(|| color.clone())
        .unwrap_or_else(|| format!("Tee {}", index + 1));

    let mut tee = Tee::from_key(TeeKey::new(key.clone()));
    tee.display_name = name.unwrap_or_else(|| capitalize(&key));
    tee.color = color;
    tee.rating = float_field(entry, &["rating", "courseRating"]);
    tee.slope = int_field(entry, &["slope", "slopeRating"])
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok());
    tee.reported_yardage = int_field(
        entry,
        &["totalDistance", "totalYardage", "yardage", "distance", "length"],
    )
    .filter(|v| *v > 0)
    .and_then(|v| u32::try_from(v).ok());
    tee
}

fn hole_distance(entry: &Value) -> Option<u32> {
    gate(
        int_field(entry, &["length", "distance", "yardage", "yards"]),
        &YARDAGE_RANGE,
    )
    .and_then(|v| u32::try_from(v).ok())
}

fn location(data: &Value) -> Option<String> {
    if let Some(location) = string_field(data, &["location"]) {
        return Some(location);
    }

    let parts: Vec<String> = ["city", "state"]
        .iter()
        .filter_map(|key| string_field(data, &[key]))
        .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn string_field(obj: &Value, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| obj.get(name).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .find(|s| !s.is_empty())
}

/// Integer from a JSON number or numeric string
fn int_field(obj: &Value, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|name| match obj.get(name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    })
}

fn float_field(obj: &Value, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| match obj.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn tees_objects(text: &str) -> Vec<&str> {
    objects_enclosing_key(text, "tees")
}

fn holes_objects(text: &str) -> Vec<&str> {
    objects_enclosing_key(text, "holes")
}

fn greedy_tees_span(text: &str) -> Vec<&str> {
    GREEDY_TEES.find(text).map(|m| m.as_str()).into_iter().collect()
}

/// Objects assigned to a variable or global: `window.__DATA__ = {...};`
fn assigned_objects(text: &str) -> Vec<&str> {
    GLOBAL_ASSIGNMENT
        .find_iter(text)
        .filter_map(|m| balanced_object(text, m.end() - 1))
        .collect()
}

/// Innermost objects that have `key` as one of their own keys.
///
/// Only double-quoted strings are tracked; apostrophes in comments, regex
/// literals and template strings are plain bytes here.
fn objects_enclosing_key<'a>(text: &'a str, key: &str) -> Vec<&'a str> {
    let needle = format!("\"{}\"", key);
    let bytes = text.as_bytes();
    let mut open: Vec<usize> = Vec::new();
    let mut starts: Vec<usize> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => {
                let rest = &text[i..];
                if rest.starts_with(&needle) && rest[needle.len()..].trim_start().starts_with(':') {
                    if let Some(&start) = open.last() {
                        if !starts.contains(&start) {
                            starts.push(start);
                        }
                    }
                }
                in_string = true;
            }
            b'{' => open.push(i),
            b'}' => {
                open.pop();
            }
            _ => {}
        }
    }

    starts
        .into_iter()
        .filter_map(|start| balanced_object(text, start))
        .collect()
}

/// The `{...}` starting at `start`, with string-aware brace matching.
fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}
