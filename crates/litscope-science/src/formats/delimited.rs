use csv::{ReaderBuilder, StringRecord};

use crate::error::Result;

use super::{ColumnMap, RawRecord, RecordLocation, RecordResult};

struct ColumnIndex {
    title: Option<usize>,
    doi: Option<usize>,
    issn: Option<usize>,
    isbn: Option<usize>,
    url: Option<usize>,
    year: Option<usize>,
}

impl ColumnIndex {
    fn new(headers: &StringRecord, columns: &ColumnMap) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            title: find(columns.title),
            doi: find(columns.doi),
            issn: find(columns.issn),
            isbn: find(columns.isbn),
            url: find(columns.url),
            year: find(columns.year),
        }
    }
}

fn cell(row: &StringRecord, idx: Option<usize>) -> Option<String> {
    idx.and_then(|i| row.get(i)).map(str::to_string)
}

/// Parse a delimited export. With `url_prefix`, the URL column holds a record
/// key that is appended to the prefix.
pub fn parse(
    contents: &str,
    delimiter: u8,
    columns: ColumnMap,
    file: &str,
    query_id: &str,
    url_prefix: Option<&str>,
) -> Result<Vec<RecordResult>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(contents.as_bytes());

    let headers = reader.headers()?.clone();
    let index = ColumnIndex::new(&headers, &columns);

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        let url = cell(&row, index.url).map(|value| match url_prefix {
            Some(prefix) => format!("{prefix}{}", value.trim()),
            None => value,
        });
        let raw = RawRecord {
            title: cell(&row, index.title),
            doi: cell(&row, index.doi),
            issn: cell(&row, index.issn),
            isbn: cell(&row, index.isbn),
            url,
            year: cell(&row, index.year),
        };
        records.push(raw.into_record(
            &columns,
            RecordLocation {
                file,
                query_id,
                index: i,
            },
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{IEEE_COLUMNS, WOS_COLUMNS, WOS_RECORD_URL};
    use litscope_core::{IdentKind, LitscopeError};

    #[test]
    fn test_ieee_export() {
        let csv = "\"Document Title\",Authors,DOI,ISSN,ISBNs,\"PDF Link\",\"Publication Year\"\n\
                   \"Fuzzing, Revisited\",\"A. B\",10.1109/SP.2020.1,1081-6011,,https://ieeexplore.ieee.org/stamp/1,2020\n\
                   \"Old Work\",,,,978-0-306-40615-7,https://ieeexplore.ieee.org/stamp/2,2008\n";
        let records = parse(csv, b',', IEEE_COLUMNS, "IEEE_q.csv", "IEEE_q", None).unwrap();
        assert_eq!(records.len(), 2);

        let first = records[0].as_ref().unwrap();
        assert_eq!(first.title(), "Fuzzing, Revisited");
        assert_eq!(first.ident().to_string(), "DOI:10.1109/sp.2020.1");
        assert_eq!(first.year(), 2020);

        let second = records[1].as_ref().unwrap();
        assert_eq!(second.ident().kind(), Some(IdentKind::Isbn));
        assert_eq!(second.query_index(), 1);
    }

    #[test]
    fn test_wos_builds_record_url() {
        let tsv = "PT\tTI\tDI\tSN\tBN\tPY\tUT\n\
                   J\tBinary Lifting\t\t0164-1212\t\t2016\tWOS:000372000000001\n";
        let records = parse(tsv, b'\t', WOS_COLUMNS, "WOS_q.txt", "WOS_q", Some(WOS_RECORD_URL)).unwrap();
        let record = records[0].as_ref().unwrap();
        assert_eq!(
            record.url(),
            "https://www.webofscience.com/wos/woscc/full-record/WOS:000372000000001"
        );
        assert_eq!(record.ident().to_string(), "ISSN:0164-1212");
    }

    #[test]
    fn test_missing_required_column_fails_each_record() {
        let csv = "\"Document Title\",DOI,\"Publication Year\"\nA,,2020\nB,,2021\n";
        let records = parse(csv, b',', IEEE_COLUMNS, "IEEE_q.csv", "IEEE_q", None).unwrap();
        assert_eq!(records.len(), 2);
        for (i, r) in records.iter().enumerate() {
            match r {
                Err(LitscopeError::MissingField { index, field, .. }) => {
                    assert_eq!(*index, i);
                    assert_eq!(field, "PDF Link");
                }
                other => panic!("expected missing field, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_short_row_is_tolerated() {
        let csv = "\"Document Title\",\"PDF Link\",\"Publication Year\",DOI\nA,https://x,2020\n";
        let records = parse(csv, b',', IEEE_COLUMNS, "IEEE_q.csv", "IEEE_q", None).unwrap();
        let record = records[0].as_ref().unwrap();
        assert!(record.ident().is_missing());
    }
}
