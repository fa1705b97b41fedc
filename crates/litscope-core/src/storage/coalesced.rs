use std::path::Path;

use crate::error::Result;
use crate::models::Record;

use super::write_atomic;

pub const HEADER: [&str; 7] = ["QueryID", "Index", "ID", "Title", "URL", "Year", "Citations"];

/// A retained record paired with its citation count, if known.
#[derive(Debug, Clone, Copy)]
pub struct CoalescedRow<'a> {
    pub record: &'a Record,
    pub citations: Option<u64>,
}

impl<'a> CoalescedRow<'a> {
    pub fn new(record: &'a Record, citations: Option<u64>) -> Self {
        Self { record, citations }
    }

    fn fields(&self) -> [String; 7] {
        let r = self.record;
        [
            r.query_id().to_string(),
            (r.query_index() + 1).to_string(),
            r.ident().to_string(),
            r.title().to_string(),
            r.url().to_string(),
            r.year().to_string(),
            self.citations.map(|c| c.to_string()).unwrap_or_default(),
        ]
    }
}

/// Serialize rows to CSV bytes, header first.
pub fn to_csv<'a>(rows: impl IntoIterator<Item = CoalescedRow<'a>>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer
        .into_inner()
        .map_err(|e| e.into_error().into())
}

/// Write the coalesced output file. Returns the number of rows written.
pub fn write_coalesced<'a>(
    path: &Path,
    rows: impl IntoIterator<Item = CoalescedRow<'a>>,
) -> Result<usize> {
    let rows: Vec<_> = rows.into_iter().collect();
    let count = rows.len();
    let bytes = to_csv(rows)?;
    write_atomic(path, &bytes)?;
    tracing::info!("wrote {count} records to {}", path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordIdent;
    use tempfile::TempDir;

    fn sample() -> Vec<Record> {
        vec![
            Record::new(
                "IEEE_q1",
                0,
                "Foo, Bar",
                RecordIdent::select(Some("10.1/x"), None, None),
                "https://ieee.example/1",
                2015,
            ),
            Record::new("ACM_q2", 4, "Baz", RecordIdent::Missing, "", 2019),
        ]
    }

    #[test]
    fn test_index_is_one_based_and_unknown_citations_are_empty() {
        let records = sample();
        let rows = [
            CoalescedRow::new(&records[0], Some(12)),
            CoalescedRow::new(&records[1], None),
        ];
        let text = String::from_utf8(to_csv(rows).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "QueryID,Index,ID,Title,URL,Year,Citations");
        assert_eq!(
            lines[1],
            "IEEE_q1,1,DOI:10.1/x,\"Foo, Bar\",https://ieee.example/1,2015,12"
        );
        assert_eq!(lines[2], "ACM_q2,5,,Baz,,2019,");
    }

    #[test]
    fn test_write_coalesced_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("coalpaper.csv");
        let records = sample();

        let n = write_coalesced(&path, records.iter().map(|r| CoalescedRow::new(r, None))).unwrap();
        assert_eq!(n, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        assert_eq!(reader.records().count(), 2);
    }
}
