pub mod acm;
pub mod bibtex;
pub mod delimited;

use std::fs;
use std::path::{Path, PathBuf};

use litscope_core::{LitscopeError, Record, SourceKind};

use crate::error::Result;
use crate::identifiers::select_ident;
use crate::text::strip_markup;

/// Outcome of one input record; `Err` carries file name and record index.
pub type RecordResult = std::result::Result<Record, LitscopeError>;

/// Column (or BibTeX field) names of one export format.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub title: &'static str,
    pub doi: &'static str,
    pub issn: &'static str,
    pub isbn: &'static str,
    pub url: &'static str,
    pub year: &'static str,
}

pub const IEEE_COLUMNS: ColumnMap = ColumnMap {
    title: "Document Title",
    doi: "DOI",
    issn: "ISSN",
    isbn: "ISBNs",
    url: "PDF Link",
    year: "Publication Year",
};

pub const SCOPUS_COLUMNS: ColumnMap = ColumnMap {
    title: "Title",
    doi: "DOI",
    issn: "ISSN",
    isbn: "ISBN",
    url: "Link",
    year: "Year",
};

pub const WOS_COLUMNS: ColumnMap = ColumnMap {
    title: "TI",
    doi: "DI",
    issn: "SN",
    isbn: "BN",
    url: "UT",
    year: "PY",
};

pub const ACM_COLUMNS: ColumnMap = ColumnMap {
    title: "title",
    doi: "doi",
    issn: "issn",
    isbn: "isbn",
    url: "url",
    year: "year",
};

pub const WOS_RECORD_URL: &str = "https://www.webofscience.com/wos/woscc/full-record/";

/// Column names of the export format a source kind produces.
pub fn columns(kind: SourceKind) -> ColumnMap {
    match kind {
        SourceKind::Ieee => IEEE_COLUMNS,
        SourceKind::Scopus => SCOPUS_COLUMNS,
        SourceKind::WebOfScience => WOS_COLUMNS,
        SourceKind::AcmDl => ACM_COLUMNS,
    }
}

/// Field values of one export record before validation.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub title: Option<String>,
    pub doi: Option<String>,
    pub issn: Option<String>,
    pub isbn: Option<String>,
    pub url: Option<String>,
    pub year: Option<String>,
}

/// Identifies the record being validated in error messages.
#[derive(Debug, Clone, Copy)]
pub struct RecordLocation<'a> {
    pub file: &'a str,
    pub query_id: &'a str,
    pub index: usize,
}

impl RawRecord {
    /// Validate required fields, strip title markup and pick the identifier.
    pub fn into_record(self, columns: &ColumnMap, at: RecordLocation<'_>) -> RecordResult {
        let missing = |field: &str| LitscopeError::MissingField {
            file: at.file.to_string(),
            index: at.index,
            field: field.to_string(),
        };

        let title = self.title.ok_or_else(|| missing(columns.title))?;
        let url = self.url.ok_or_else(|| missing(columns.url))?;
        let year_raw = self
            .year
            .filter(|y| !y.trim().is_empty())
            .ok_or_else(|| missing(columns.year))?;
        let year = year_raw
            .trim()
            .parse::<i32>()
            .map_err(|_| LitscopeError::InvalidField {
                file: at.file.to_string(),
                index: at.index,
                field: columns.year.to_string(),
                value: year_raw.clone(),
            })?;

        let ident = select_ident(self.doi.as_deref(), self.issn.as_deref(), self.isbn.as_deref());

        Ok(Record::new(
            at.query_id,
            at.index,
            strip_markup(&title),
            ident,
            url.trim(),
            year,
        ))
    }
}

/// Query id of an export file: its name without directory or extension.
pub fn query_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Files in `dir` named `<PREFIX>_*`, sorted by name.
pub fn discover_query_files(dir: &Path, kind: SourceKind) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(LitscopeError::DirectoryNotFound(dir.display().to_string()).into());
    }

    let prefix = format!("{}_", kind.prefix());
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&prefix));
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read an export file, tolerating a UTF-8 byte order mark and stray invalid bytes.
pub(crate) fn read_export(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(text.strip_prefix('\u{feff}').unwrap_or(&text).to_string())
}

/// Parse one export file of the given kind.
///
/// File-level failures (unreadable file, broken header) are returned as
/// `Err`; each record carries its own result.
pub fn parse_file(kind: SourceKind, path: &Path) -> Result<Vec<RecordResult>> {
    let contents = read_export(path)?;
    let file = path.display().to_string();
    let query_id = query_id(path);

    match kind {
        SourceKind::Ieee | SourceKind::Scopus => {
            delimited::parse(&contents, b',', columns(kind), &file, &query_id, None)
        }
        SourceKind::WebOfScience => delimited::parse(
            &contents,
            b'\t',
            columns(kind),
            &file,
            &query_id,
            Some(WOS_RECORD_URL),
        ),
        SourceKind::AcmDl => Ok(acm::parse(&contents, &file, &query_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litscope_core::IdentKind;
    use tempfile::TempDir;

    fn at(index: usize) -> RecordLocation<'static> {
        RecordLocation {
            file: "queries/IEEE_q1.csv",
            query_id: "IEEE_q1",
            index,
        }
    }

    #[test]
    fn test_into_record_builds_clean_record() {
        let raw = RawRecord {
            title: Some("Taint <i>tracking</i>".into()),
            doi: Some("10.1109/X.1".into()),
            issn: Some("1234-5678".into()),
            url: Some(" https://ieee.example/1 ".into()),
            year: Some("2018".into()),
            ..Default::default()
        };
        let record = raw.into_record(&IEEE_COLUMNS, at(3)).unwrap();
        assert_eq!(record.title(), "Taint tracking");
        assert_eq!(record.ident().kind(), Some(IdentKind::Doi));
        assert_eq!(record.ident().value(), Some("10.1109/x.1"));
        assert_eq!(record.url(), "https://ieee.example/1");
        assert_eq!(record.year(), 2018);
        assert_eq!(record.query_index(), 3);
    }

    #[test]
    fn test_missing_year_names_column_and_index() {
        let raw = RawRecord {
            title: Some("T".into()),
            url: Some(String::new()),
            year: Some("  ".into()),
            ..Default::default()
        };
        let err = raw.into_record(&IEEE_COLUMNS, at(7)).unwrap_err();
        match err {
            LitscopeError::MissingField { file, index, field } => {
                assert_eq!(file, "queries/IEEE_q1.csv");
                assert_eq!(index, 7);
                assert_eq!(field, "Publication Year");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_year_is_invalid_field() {
        let raw = RawRecord {
            title: Some("T".into()),
            url: Some(String::new()),
            year: Some("20x1".into()),
            ..Default::default()
        };
        assert!(matches!(
            raw.into_record(&SCOPUS_COLUMNS, at(0)),
            Err(LitscopeError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_discover_filters_prefix_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["IEEE_b.csv", "IEEE_a.csv", "SCP_a.csv", "IEEEX.csv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("IEEE_dir")).unwrap();

        let files = discover_query_files(dir.path(), SourceKind::Ieee).unwrap();
        let names: Vec<String> = files.iter().map(|p| query_id(p)).collect();
        assert_eq!(names, vec!["IEEE_a", "IEEE_b"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = discover_query_files(&dir.path().join("nope"), SourceKind::Ieee);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_file_strips_bom() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SCP_q2.csv");
        std::fs::write(
            &path,
            "\u{feff}Title,DOI,ISSN,ISBN,Link,Year\nA Paper,,,,https://scopus.example/1,2020\n",
        )
        .unwrap();

        let records = parse_file(SourceKind::Scopus, &path).unwrap();
        assert_eq!(records.len(), 1);
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.query_id(), "SCP_q2");
        assert!(record.ident().is_missing());
    }
}
