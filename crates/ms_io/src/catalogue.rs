//! Discipline catalogue files.
//!
//! ```json
//! { "disciplines": [
//!     { "ref": "5N1", "label": "5-Minute Numbers (Trial 1)", "standard": 547 },
//!     { "ref": "SC1", "label": "Speed Cards", "family": "time_based", "group": "SC",
//!       "standard": { "part1": 6862, "part2": 0.75, "part3": 95.83 } }
//! ] }
//! ```
//!
//! `family` and `group` fall back to the legacy code conventions when absent.
//! Order in the file is display/export order.

use std::path::Path;

use serde::Deserialize;

use ms_core::{Discipline, DisciplineCatalogue, DisciplineRef, ScoringFamily, ScoringStandard};

use crate::{IoError, IoResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCatalogue {
    disciplines: Vec<RawDiscipline>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDiscipline {
    #[serde(rename = "ref")]
    reference: String,
    label: String,
    #[serde(default)]
    family: Option<ScoringFamily>,
    /// `Some(None)` (explicit `null`) means "no group"; absent means "infer".
    #[serde(default, with = "explicit_null")]
    group: Option<Option<String>>,
    #[serde(default)]
    standard: Option<ScoringStandard>,
}

mod explicit_null {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(d).map(Some)
    }
}

pub fn load_catalogue(path: &Path) -> IoResult<DisciplineCatalogue> {
    parse_catalogue(&crate::snapshot::read_text(path)?)
}

pub fn parse_catalogue(text: &str) -> IoResult<DisciplineCatalogue> {
    let raw: RawCatalogue = serde_json::from_str(text)?;
    let mut out = Vec::with_capacity(raw.disciplines.len());
    for (i, d) in raw.disciplines.into_iter().enumerate() {
        let at = |field: &str| format!("/disciplines/{i}/{field}");
        let reference: DisciplineRef = d
            .reference
            .parse()
            .map_err(|e: ms_core::CoreError| IoError::Json { pointer: at("ref"), msg: e.to_string() })?;
        let code = reference.as_str();
        let family = d.family.unwrap_or_else(|| ms_core::discipline::infer_family(code));
        let group = d.group.unwrap_or_else(|| ms_core::discipline::infer_group(code));
        let discipline = Discipline::new(reference, d.label, family, group, d.standard)
            .map_err(|e| IoError::Json { pointer: at("standard"), msg: e.to_string() })?;
        out.push(discipline);
    }
    Ok(DisciplineCatalogue::new(out)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_family_and_group_from_legacy_codes() {
        let cat = parse_catalogue(
            r#"{"disciplines": [
                {"ref": "K1", "label": "Spoken 1", "standard": 47.7},
                {"ref": "15W", "label": "Words", "standard": 312},
                {"ref": "5N2", "label": "Numbers 2", "standard": 547}
            ]}"#,
        )
        .unwrap();
        let k1 = cat.get(&"K1".parse().unwrap()).unwrap();
        assert_eq!(k1.family, ScoringFamily::SquareRoot);
        assert_eq!(k1.group.as_deref(), Some("K"));
        let w = cat.by_label("words").unwrap();
        assert_eq!(w.family, ScoringFamily::WordMemory);
        assert_eq!(w.group, None);
        assert_eq!(cat.get(&"5N2".parse().unwrap()).unwrap().group.as_deref(), Some("5N"));
    }

    #[test]
    fn explicit_fields_override_inference() {
        let cat = parse_catalogue(
            r#"{"disciplines": [
                {"ref": "SPD", "label": "Speed", "family": "time_based", "group": null,
                 "standard": {"part1": 6862, "part2": 0.75, "part3": 95.83}},
                {"ref": "K9", "label": "Kings", "family": "linear", "group": null}
            ]}"#,
        )
        .unwrap();
        let spd = cat.get(&"SPD".parse().unwrap()).unwrap();
        assert_eq!(spd.family, ScoringFamily::TimeBased);
        assert!(matches!(spd.standard, Some(ScoringStandard::Timed { .. })));
        let k9 = cat.get(&"K9".parse().unwrap()).unwrap();
        assert_eq!(k9.family, ScoringFamily::Linear);
        assert_eq!(k9.group, None);
        assert_eq!(k9.standard, None);
    }

    #[test]
    fn rejects_mismatched_standard_with_pointer() {
        let err = parse_catalogue(r#"{"disciplines": [{"ref": "SC1", "label": "Speed", "standard": 10}]}"#)
            .unwrap_err();
        assert!(matches!(err, IoError::Json { ref pointer, .. } if pointer == "/disciplines/0/standard"));
    }

    #[test]
    fn rejects_duplicates_and_unknown_fields() {
        let dup = r#"{"disciplines": [{"ref": "5B", "label": "a"}, {"ref": "5B", "label": "b"}]}"#;
        assert!(matches!(parse_catalogue(dup), Err(IoError::Invalid(_))));
        let extra = r#"{"disciplines": [{"ref": "5B", "label": "a", "weight": 2}]}"#;
        assert!(matches!(parse_catalogue(extra), Err(IoError::Json { .. })));
    }
}
