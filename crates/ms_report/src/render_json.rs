//! JSON export (competition → disciplines → standings → leaderboards → completion).
//!
//! Key order is part of the output contract. It relies on serde_json's
//! `preserve_order` feature: objects keep insertion order.

use serde_json::{Map as JsonMap, Value};

use crate::structure::{BoardSection, CompletionSection, DisciplineColumn, ReportRow, ScoreCell, StandingsReport};
use crate::ReportError;

pub fn render_json(report: &StandingsReport) -> Value {
    let mut root = obj();

    let mut competition = obj();
    competition.insert("id".into(), opt_str(report.competition_id.as_deref()));
    competition.insert("name".into(), Value::String(report.competition.clone()));
    competition.insert("snapshot_sha256".into(), Value::String(report.snapshot_sha256.clone()));
    root.insert("competition".into(), Value::Object(competition));

    root.insert(
        "disciplines".into(),
        Value::Array(report.disciplines.iter().map(discipline_json).collect()),
    );
    root.insert(
        "standings".into(),
        Value::Array(report.rows.iter().map(|r| row_json(r, &report.disciplines)).collect()),
    );
    root.insert(
        "leaderboards".into(),
        Value::Array(report.leaderboards.iter().map(board_json).collect()),
    );
    root.insert("completion".into(), completion_json(&report.completion));

    Value::Object(root)
}

/// Pretty-printed with a trailing newline.
pub fn render_json_string(report: &StandingsReport) -> Result<String, ReportError> {
    let mut s = serde_json::to_string_pretty(&render_json(report)).map_err(|e| ReportError::Serialize(e.to_string()))?;
    s.push('\n');
    Ok(s)
}

fn discipline_json(d: &DisciplineColumn) -> Value {
    let mut o = obj();
    o.insert("ref".into(), Value::String(d.reference.clone()));
    o.insert("label".into(), Value::String(d.label.clone()));
    o.insert("timed".into(), Value::Bool(d.timed));
    Value::Object(o)
}

fn row_json(r: &ReportRow, columns: &[DisciplineColumn]) -> Value {
    let mut o = obj();
    o.insert("position".into(), r.position.into());
    o.insert("competitor_id".into(), Value::String(r.competitor_id.clone()));
    o.insert("name".into(), Value::String(r.name.clone()));
    o.insert("total".into(), r.total.into());
    o.insert("unrounded_total".into(), Value::String(r.unrounded_total.clone()));

    // Keyed by discipline ref, in column order; missing results are null.
    let mut scores = obj();
    for (col, cell) in columns.iter().zip(&r.scores) {
        scores.insert(col.reference.clone(), cell.as_ref().map(cell_json).unwrap_or(Value::Null));
    }
    o.insert("scores".into(), Value::Object(scores));
    Value::Object(o)
}

fn cell_json(c: &ScoreCell) -> Value {
    let mut o = obj();
    o.insert("score".into(), number(c.raw_score));
    if let Some(t) = c.time {
        o.insert("time".into(), number(t));
    }
    o.insert("points".into(), Value::String(c.points.clone()));
    o.insert("provisional".into(), Value::Bool(c.provisional));
    o.insert("counted".into(), Value::Bool(c.counted));
    Value::Object(o)
}

fn board_json(b: &BoardSection) -> Value {
    let entries = b
        .entries
        .iter()
        .map(|e| {
            let mut o = obj();
            o.insert("position".into(), e.position.into());
            o.insert("competitor_id".into(), Value::String(e.competitor_id.clone()));
            o.insert("name".into(), Value::String(e.name.clone()));
            o.insert("score".into(), number(e.raw_score));
            if let Some(t) = e.time {
                o.insert("time".into(), number(t));
            }
            o.insert("points".into(), Value::String(e.points.clone()));
            o.insert("provisional".into(), Value::Bool(e.provisional));
            Value::Object(o)
        })
        .collect();

    let mut o = obj();
    o.insert("ref".into(), Value::String(b.reference.clone()));
    o.insert("label".into(), Value::String(b.label.clone()));
    o.insert("entries".into(), Value::Array(entries));
    Value::Object(o)
}

fn completion_json(c: &CompletionSection) -> Value {
    let mut per = obj();
    for (d, status) in &c.per_discipline {
        per.insert(d.clone(), Value::String((*status).to_string()));
    }
    let mut o = obj();
    o.insert("per_discipline".into(), Value::Object(per));
    o.insert("complete".into(), Value::Bool(c.complete));
    Value::Object(o)
}

/* ----------------------- helpers ----------------------- */

#[inline]
fn obj() -> JsonMap<String, Value> {
    JsonMap::new()
}

#[inline]
fn opt_str(s: Option<&str>) -> Value {
    s.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null)
}

/// Whole scores stay integers in JSON; non-finite values become null.
fn number(v: f64) -> Value {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        serde_json::Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{build_report, fixture};
    use assert_json_diff::assert_json_include;
    use serde_json::json;

    #[test]
    fn sections_in_fixed_order() {
        let (c, cat, pass) = fixture::scenario();
        let v = render_json(&build_report(&c, &cat, &pass).unwrap());
        let keys: Vec<&str> = v.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["competition", "disciplines", "standings", "leaderboards", "completion"]);
    }

    #[test]
    fn standings_and_completion_content() {
        let (c, cat, pass) = fixture::scenario();
        let v = render_json(&build_report(&c, &cat, &pass).unwrap());
        assert_json_include!(
            actual: v,
            expected: json!({
                "competition": { "id": "open", "name": "Open" },
                "standings": [{
                    "position": 1,
                    "name": "Ada King",
                    "total": 1500,
                    "unrounded_total": "1500.00",
                    "scores": {
                        "5N1": { "score": 547, "points": "1000.00", "counted": true },
                        "5N2": { "score": 273.5, "counted": false },
                        "15W": { "provisional": true },
                        "SC1": null
                    }
                }],
                "completion": {
                    "per_discipline": { "5N1": "pending", "15W": "pending", "SC1": "pending" },
                    "complete": false
                }
            })
        );
    }

    #[test]
    fn string_output_ends_with_newline() {
        let (c, cat, pass) = fixture::scenario();
        let s = render_json_string(&build_report(&c, &cat, &pass).unwrap()).unwrap();
        assert!(s.ends_with("}\n"));
    }
}
