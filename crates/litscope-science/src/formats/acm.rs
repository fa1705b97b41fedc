use litscope_core::LitscopeError;

use super::bibtex::{self, BibEntry};
use super::{ACM_COLUMNS, RawRecord, RecordLocation, RecordResult};

fn raw_record(entry: &BibEntry) -> RawRecord {
    let get = |name: &str| entry.field(name).map(str::to_string);
    RawRecord {
        title: get(ACM_COLUMNS.title).map(|t| t.replace(['{', '}'], "")),
        doi: get(ACM_COLUMNS.doi),
        issn: get(ACM_COLUMNS.issn),
        isbn: get(ACM_COLUMNS.isbn),
        // url is optional in ACM exports
        url: Some(get(ACM_COLUMNS.url).unwrap_or_default()),
        year: get(ACM_COLUMNS.year),
    }
}

/// Records in file order. A broken entry is rejected in place, so `index`
/// stays the entry's position in the file.
pub fn parse(contents: &str, file: &str, query_id: &str) -> Vec<RecordResult> {
    let bib = bibtex::parse(contents);

    let mut blocks: Vec<(usize, Option<&BibEntry>)> = bib
        .entries
        .iter()
        .map(|entry| (entry.line, Some(entry)))
        .chain(bib.error_lines.iter().map(|&line| (line, None)))
        .collect();
    blocks.sort_by_key(|(line, _)| *line);

    blocks
        .into_iter()
        .enumerate()
        .map(|(index, (line, entry))| match entry {
            Some(entry) => raw_record(entry).into_record(
                &ACM_COLUMNS,
                RecordLocation {
                    file,
                    query_id,
                    index,
                },
            ),
            None => {
                tracing::warn!("{file}: unparseable BibTeX entry at line {line}");
                Err(LitscopeError::InvalidField {
                    file: file.to_string(),
                    index,
                    field: "entry".to_string(),
                    value: format!("unparseable BibTeX at line {line}"),
                })
            }
        })
        .collect()
}
