//! Course document assembly: tee discovery, aggregates, final ordering.

use chrono::Utc;
use std::collections::BTreeMap;

use super::course::{CourseDocument, ExtractionMethod, Hole, RawCourse, Tee, TeeKey};

/// Merge raw extractor output into the canonical document.
///
/// The tee set is the union of `raw.tees` (kept in the given order) and every
/// tee key seen in a hole's yardage map (appended in order of first appearance
/// over the sorted holes). Inputs are assumed already range-checked.
pub fn assemble(raw: RawCourse, source_url: &str, method: ExtractionMethod) -> CourseDocument {
    let RawCourse {
        name,
        location,
        mut holes,
        tees: raw_tees,
    } = raw;

    holes.sort_by_key(|h| h.number);

    let mut tees: Vec<Tee> = Vec::new();
    for tee in raw_tees {
        match tees.iter_mut().find(|t| t.key == tee.key) {
            Some(existing) => *existing = tee,
            None => tees.push(tee),
        }
    }
    for hole in &holes {
        for key in hole.yardage_by_tee.keys() {
            if !tees.iter().any(|t| &t.key == key) {
                tees.push(Tee::from_key(key.clone()));
            }
        }
    }

    let mut total_yardage = BTreeMap::new();
    for tee in &mut tees {
        tee.total_yardage = tee_total(&holes, &tee.key);
        total_yardage.insert(tee.key.clone(), tee.total_yardage);
    }

    CourseDocument {
        name,
        location,
        total_par: total_par(&holes),
        hole_count: holes.len(),
        holes,
        tees,
        total_yardage,
        source_url: source_url.to_string(),
        extraction_method: method,
        extracted_at: Utc::now(),
    }
}

/// Sum of known pars; unknown par counts as zero.
pub fn total_par(holes: &[Hole]) -> u32 {
    holes.iter().map(|h| h.par.unwrap_or(0) as u32).sum()
}

fn tee_total(holes: &[Hole], key: &TeeKey) -> u32 {
    holes.iter().filter_map(|h| h.yardage(key)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hole(number: u8, par: Option<u8>, yardages: &[(&str, u32)]) -> Hole {
        let mut h = Hole::new(number);
        h.par = par;
        for (tee, yards) in yardages {
            h.yardage_by_tee.insert(TeeKey::from(*tee), *yards);
        }
        h
    }

    #[test]
    fn test_sorts_holes_and_sums_par() {
        let raw = RawCourse {
            name: "Test".to_string(),
            location: "Here".to_string(),
            holes: vec![
                hole(3, Some(5), &[]),
                hole(1, Some(4), &[]),
                hole(2, None, &[]),
            ],
            tees: vec![],
        };

        let doc = assemble(raw, "https://example.com", ExtractionMethod::GenericTable);
        let numbers: Vec<u8> = doc.holes.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(doc.total_par, 9);
        assert_eq!(doc.hole_count, 3);
        assert_eq!(doc.source_url, "https://example.com");
    }

    #[test]
    fn test_total_par_independent_of_order() {
        let holes = vec![hole(2, Some(3), &[]), hole(1, Some(4), &[]), hole(3, None, &[])];
        let mut reversed = holes.clone();
        reversed.reverse();
        assert_eq!(total_par(&holes), total_par(&reversed));
        assert_eq!(total_par(&holes), 7);
    }

    #[test]
    fn test_tees_derived_from_yardages() {
        let raw = RawCourse {
            holes: vec![
                hole(1, Some(4), &[("white", 380), ("red", 300)]),
                hole(2, Some(3), &[("white", 160)]),
            ],
            ..Default::default()
        };

        let doc = assemble(raw, "", ExtractionMethod::GenericTable);
        let keys: Vec<&str> = doc.tees.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["red", "white"]);
        assert_eq!(doc.tee("white").unwrap().total_yardage, 540);
        assert_eq!(doc.tee("white").unwrap().display_name, "White");
        assert_eq!(doc.total_yardage[&TeeKey::from("red")], 300);
    }

    #[test]
    fn test_metadata_tees_kept_without_yardage() {
        let mut blue = Tee::from_key(TeeKey::from("Blue"));
        blue.rating = Some(71.2);
        blue.slope = Some(128);

        let raw = RawCourse {
            holes: vec![hole(1, Some(4), &[("White", 380)])],
            tees: vec![blue],
            ..Default::default()
        };

        let doc = assemble(raw, "", ExtractionMethod::EmbeddedJson);
        assert_eq!(doc.tees.len(), 2);
        assert_eq!(doc.tees[0].key.as_str(), "Blue");
        assert_eq!(doc.tees[0].rating, Some(71.2));
        assert_eq!(doc.tees[0].total_yardage, 0);
        assert_eq!(doc.tee("white").unwrap().total_yardage, 380);
    }
}
