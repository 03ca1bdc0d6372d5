//! Course model produced by every extraction strategy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Tee identifier (color or name). Identity is case-insensitive, the original
/// spelling is kept for display and serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeeKey(String);

impl TeeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for TeeKey {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for TeeKey {}

impl Hash for TeeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for TeeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TeeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.normalized().cmp(&other.normalized())
    }
}

impl fmt::Display for TeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// A single hole. Only `number` is mandatory; `None` means "unknown", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    pub number: u8,
    pub par: Option<u8>,
    pub stroke_index: Option<u8>,
    pub yardage_by_tee: BTreeMap<TeeKey, u32>,
}

impl Hole {
    pub fn new(number: u8) -> Self {
        Self {
            number,
            par: None,
            stroke_index: None,
            yardage_by_tee: BTreeMap::new(),
        }
    }

    /// Fold a later observation of the same hole into this one.
    /// Known values from `other` win; unknown values never erase known ones.
    pub fn merge(&mut self, other: Hole) {
        if other.par.is_some() {
            self.par = other.par;
        }
        if other.stroke_index.is_some() {
            self.stroke_index = other.stroke_index;
        }
        self.yardage_by_tee.extend(other.yardage_by_tee);
    }

    pub fn yardage(&self, tee: &TeeKey) -> Option<u32> {
        self.yardage_by_tee.get(tee).copied()
    }
}

/// Tee metadata. `total_yardage` is derived by the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tee {
    pub key: TeeKey,
    pub display_name: String,
    pub color: Option<String>,
    pub rating: Option<f64>,
    pub slope: Option<u32>,
    /// Total distance as published by the source, when it publishes one
    pub reported_yardage: Option<u32>,
    pub total_yardage: u32,
}

impl Tee {
    /// Tee with only an identity; display name is the capitalized key.
    pub fn from_key(key: TeeKey) -> Self {
        let display_name = capitalize(key.as_str());
        Self {
            key,
            display_name,
            color: None,
            rating: None,
            slope: None,
            reported_yardage: None,
            total_yardage: 0,
        }
    }
}

/// Which strategy produced a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    GenericTable,
    EmbeddedJson,
    DomFallback,
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionMethod::GenericTable => "generic_table",
            ExtractionMethod::EmbeddedJson => "embedded_json",
            ExtractionMethod::DomFallback => "dom_fallback",
        };
        f.write_str(name)
    }
}

/// Canonical scrape result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub name: String,
    pub location: String,
    pub holes: Vec<Hole>,
    pub tees: Vec<Tee>,
    pub total_par: u32,
    pub total_yardage: BTreeMap<TeeKey, u32>,
    pub hole_count: usize,
    pub source_url: String,
    pub extraction_method: ExtractionMethod,
    pub extracted_at: DateTime<Utc>,
}

impl CourseDocument {
    pub fn hole(&self, number: u8) -> Option<&Hole> {
        self.holes.iter().find(|h| h.number == number)
    }

    pub fn tee(&self, key: &str) -> Option<&Tee> {
        let key = TeeKey::from(key);
        self.tees.iter().find(|t| t.key == key)
    }
}

/// Extractor output before aggregation
#[derive(Debug, Clone, Default)]
pub struct RawCourse {
    pub name: String,
    pub location: String,
    pub holes: Vec<Hole>,
    pub tees: Vec<Tee>,
}

/// "white" -> "White"
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
