//! CSV export.
//!
//! Header: `Name,Total,Unrounded Total,<label>…,<label> Time…` with one score
//! column per discipline and one time column per time-based discipline, both
//! in column order. Missing values are empty cells. Lines end with `\n`.

use crate::structure::StandingsReport;

pub fn render_csv(report: &StandingsReport) -> String {
    let timed: Vec<usize> = report
        .disciplines
        .iter()
        .enumerate()
        .filter(|(_, d)| d.timed)
        .map(|(i, _)| i)
        .collect();

    let mut header: Vec<String> = vec!["Name".into(), "Total".into(), "Unrounded Total".into()];
    header.extend(report.disciplines.iter().map(|d| d.label.clone()));
    header.extend(timed.iter().map(|&i| format!("{} Time", report.disciplines[i].label)));

    let mut out = String::new();
    push_record(&mut out, &header);

    for row in &report.rows {
        let mut record: Vec<String> = vec![row.name.clone(), row.total.to_string(), row.unrounded_total.clone()];
        record.extend(row.scores.iter().map(|c| c.as_ref().map(|c| c.raw_score.to_string()).unwrap_or_default()));
        record.extend(timed.iter().map(|&i| {
            row.scores
                .get(i)
                .and_then(|c| c.as_ref())
                .and_then(|c| c.time)
                .map(|t| t.to_string())
                .unwrap_or_default()
        }));
        push_record(&mut out, &record);
    }
    out
}

fn push_record(out: &mut String, fields: &[String]) {
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, f);
    }
    out.push('\n');
}

/// RFC 4180 quoting: only fields containing a delimiter, quote or line break.
fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{build_report, fixture};

    #[test]
    fn header_and_rows() {
        let (c, cat, pass) = fixture::scenario();
        let csv = render_csv(&build_report(&c, &cat, &pass).unwrap());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Name,Total,Unrounded Total,5-Minute Numbers (Trial 1),5-Minute Numbers (Trial 2),15-Minute Words,\
             Speed Cards (Trial 1),Speed Cards (Trial 1) Time"
        );
        assert_eq!(lines[1], "Ada King,1500,1500.00,547,273.5,156,,");
        assert!(lines[2].starts_with("Bo Li,"));
        assert!(lines[2].ends_with(",,,,52,60"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn quotes_only_when_needed() {
        let mut out = String::new();
        push_record(&mut out, &["plain".into(), "a,b".into(), "say \"hi\"".into()]);
        assert_eq!(out, "plain,\"a,b\",\"say \"\"hi\"\"\"\n");
    }
}
