//! Pasted participant tables (spreadsheet copy/paste or plain CSV).
//!
//! Tab-separated when the text contains any tab, comma-separated otherwise.
//! Cells may be double-quoted; `""` inside quotes is a literal quote.
//! Column layouts:
//! - 4+ columns: `first, last, country, birth_year` (extra columns ignored)
//! - 3 columns: `full name, country, birth_year`
//! - 2 columns: `first, last`
//! - 1 column: `full name`
//!
//! Full names split at the first whitespace. A first row whose first cell
//! mentions "name" is a header and is skipped.

use ms_core::ImportedRow;

use crate::{IoError, IoResult};

pub fn parse_pasted_rows(text: &str) -> IoResult<Vec<ImportedRow>> {
    let delimiter = if text.contains('\t') { '\t' } else { ',' };
    let mut rows = Vec::new();
    let mut seen_data = false;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let cells = split_cells(line, delimiter).map_err(|msg| IoError::Table { line: line_no, msg })?;
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        if !seen_data && cells[0].to_lowercase().contains("name") {
            seen_data = true;
            continue;
        }
        seen_data = true;
        rows.push(row_from_cells(&cells, line_no)?);
    }
    Ok(rows)
}

fn row_from_cells(cells: &[String], line: usize) -> IoResult<ImportedRow> {
    let (first_name, last_name, country, year) = match cells {
        [full] => {
            let (f, l) = split_full_name(full);
            (f, l, None, None)
        }
        [first, last] => (first.clone(), last.clone(), None, None),
        [full, country, year] => {
            let (f, l) = split_full_name(full);
            (f, l, Some(country), Some(year))
        }
        [first, last, country, year, rest @ ..] => {
            if !rest.is_empty() {
                tracing::warn!(line, extra = rest.len(), "ignoring extra columns in pasted row");
            }
            (first.clone(), last.clone(), Some(country), Some(year))
        }
        [] => return Err(IoError::Table { line, msg: "empty row".into() }),
    };
    if first_name.is_empty() && last_name.is_empty() {
        return Err(IoError::Table { line, msg: "row has no name".into() });
    }
    Ok(ImportedRow {
        first_name,
        last_name,
        country: country.filter(|c| !c.is_empty()).cloned(),
        birth_year: parse_year(year.map(String::as_str), line)?,
    })
}

fn split_full_name(full: &str) -> (String, String) {
    match full.split_once(char::is_whitespace) {
        Some((first, last)) => (first.to_string(), last.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

fn parse_year(cell: Option<&str>, line: usize) -> IoResult<Option<u16>> {
    match cell {
        None | Some("") => Ok(None),
        Some(y) => y
            .parse::<u16>()
            .map(Some)
            .map_err(|_| IoError::Table { line, msg: format!("birth year {y:?} is not a year") }),
    }
}

/// Split one line into trimmed cells, honoring double quotes.
fn split_cells(line: &str, delimiter: char) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if cell.trim().is_empty() => {
                cell.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                cells.push(cell.trim().to_string());
                cell.clear();
            }
            c => cell.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quote".into());
    }
    cells.push(cell.trim().to_string());
    Ok(cells)
}
