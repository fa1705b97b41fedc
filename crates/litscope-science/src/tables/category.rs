use std::collections::HashSet;
use std::fmt::Write as _;

use csv::StringRecord;

use crate::error::{Result, ScienceError};
use crate::tables::TableMaps;

fn read_matrix(input: &str) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(input.as_bytes());
    let headers = reader.headers()?.clone();
    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((headers, rows))
}

fn map_cell(cell: &str) -> &str {
    match cell {
        "TRUE" => "\\cross{}",
        "FALSE" => "",
        other => other,
    }
}

/// Full matrix: one `l` column per header field, `TRUE` cells as crosses.
pub fn generate(input: &str) -> Result<String> {
    let (headers, rows) = read_matrix(input)?;
    let Some(first) = headers.get(0) else {
        return Err(ScienceError::MalformedTable("empty header row".to_string()));
    };

    let mut out = String::new();
    let _ = writeln!(out, "\\begin{{tabular}}{{{}}}", "l".repeat(headers.len()));
    out.push_str("\\toprule\n");

    let rotated: Vec<String> = headers
        .iter()
        .skip(1)
        .map(|h| {
            if h.is_empty() {
                String::new()
            } else {
                format!("\\theadr{{{h}}}")
            }
        })
        .collect();
    let _ = writeln!(out, "\\thead{{{first}}} & {}\\\\", rotated.join(" & "));
    out.push_str("\\midrule\n");

    for row in &rows {
        let cells: Vec<&str> = row.iter().map(map_cell).collect();
        let _ = writeln!(out, "{}\\\\", cells.join(" & "));
    }

    out.push_str("\\bottomrule\n\\end{tabular}\n");
    Ok(out)
}

struct Theme<'a> {
    column: usize,
    question: &'a str,
    name: &'a str,
    citations: Vec<String>,
}

/// Theme-per-row table. Headers after the first are `RQ|Theme`; papers are
/// cited by their mapped key under every theme marked `TRUE`.
pub fn generate_compressed(input: &str, maps: &TableMaps) -> Result<String> {
    let (headers, rows) = read_matrix(input)?;
    let title_column = headers
        .iter()
        .position(|h| h == "Title")
        .ok_or_else(|| ScienceError::MalformedTable("no Title column".to_string()))?;

    let mut themes = Vec::new();
    for (column, header) in headers.iter().enumerate().skip(1) {
        if header.is_empty() {
            continue;
        }
        let (question, name) = header.split_once('|').ok_or_else(|| {
            ScienceError::MalformedTable(format!("theme header {header:?} is not RQ|Theme"))
        })?;
        themes.push(Theme {
            column,
            question,
            name,
            citations: Vec::new(),
        });
    }

    for row in &rows {
        let title = row.get(title_column).unwrap_or_default();
        for theme in &mut themes {
            if row.get(theme.column) != Some("TRUE") {
                continue;
            }
            let key = maps.cite_key(title)?;
            if !theme.citations.iter().any(|c| **c == *key) {
                theme.citations.push(key.into_owned());
            }
        }
    }

    let mut out = String::new();
    out.push_str("\\begin{tabular}{lll}\n\\toprule\n");
    out.push_str("& \\thead{Theme} & \\thead{Citation(s)} \\\\\n\\midrule\n");

    let mut written: HashSet<&str> = HashSet::new();
    for theme in &themes {
        let mut question_cell = String::new();
        if !written.contains(theme.question) {
            if !written.is_empty() {
                out.push_str("\\midrule\n");
            }
            written.insert(theme.question);
            question_cell = format!("\\thead{{{}}}", theme.question);
        }
        let _ = writeln!(out, "{question_cell} & {} & ", theme.name);
        if !theme.citations.is_empty() {
            let _ = writeln!(out, "\\cite{{{}}}", theme.citations.join(", "));
        }
        out.push_str("\\\\\n");
    }

    out.push_str("\\bottomrule\n\\end{tabular}\n");
    Ok(out)
}
