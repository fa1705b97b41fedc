use std::collections::HashMap;
use std::path::{Path, PathBuf};

use litscope_core::{PersistentId, Record, SourceKind};
use serde::Serialize;

use crate::Result;
use crate::formats::{self, RecordResult};

pub const DEFAULT_MIN_YEAR: i32 = 2010;

#[derive(Debug, Clone, Copy)]
pub struct DedupOptions {
    /// Records published before this year are dropped.
    pub min_year: i32,
    /// Fail on the first malformed record instead of skipping it.
    pub strict: bool,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoalesceReport {
    /// Records that passed the year filter.
    pub hits: usize,
    pub duplicates: usize,
    pub retained: usize,
    pub filtered: usize,
    /// Malformed records skipped in lenient mode.
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Retained,
    /// Duplicate of the accumulated record at this index.
    Duplicate { of: usize },
    Filtered,
}

/// Accumulator that keeps the first record of each logical paper.
///
/// Two records are the same paper when their identifiers match or their
/// canonical titles are equal. Both keys are indexed so a membership test
/// never scans the accumulated records.
#[derive(Debug)]
pub struct Coalescer {
    min_year: i32,
    records: Vec<Record>,
    by_ident: HashMap<PersistentId, usize>,
    by_title: HashMap<String, usize>,
    report: CoalesceReport,
}

impl Default for Coalescer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_YEAR)
    }
}

impl Coalescer {
    pub fn new(min_year: i32) -> Self {
        Self {
            min_year,
            records: Vec::new(),
            by_ident: HashMap::new(),
            by_title: HashMap::new(),
            report: CoalesceReport::default(),
        }
    }

    /// Index of an accumulated record equal to `record`, if any.
    pub fn find_match(&self, record: &Record) -> Option<usize> {
        let by_ident = record
            .ident()
            .persistent()
            .and_then(|id| self.by_ident.get(id).copied());
        let by_title = self.by_title.get(record.canonical_title()).copied();

        match (by_ident, by_title) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn offer(&mut self, record: Record) -> Admission {
        if record.year() < self.min_year {
            self.report.filtered += 1;
            return Admission::Filtered;
        }
        self.report.hits += 1;

        if let Some(of) = self.find_match(&record) {
            self.report.duplicates += 1;
            tracing::debug!("dropping duplicate {record} (matches {})", self.records[of]);
            return Admission::Duplicate { of };
        }

        let index = self.records.len();
        if let Some(id) = record.ident().persistent() {
            self.by_ident.insert(id.clone(), index);
        }
        self.by_title.insert(record.canonical_title().to_string(), index);
        self.records.push(record);
        self.report.retained += 1;
        Admission::Retained
    }

    pub fn note_rejected(&mut self) {
        self.report.rejected += 1;
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn report(&self) -> CoalesceReport {
        self.report
    }
}

/// Walk every export file of every source kind, in order.
///
/// `visit` receives each well-formed record. Malformed records are logged
/// and reported through `on_rejected`, or returned as an error when
/// `strict` is set.
fn visit_queries(
    dir: &Path,
    order: &[SourceKind],
    strict: bool,
    mut visit: impl FnMut(SourceKind, &Path, Record),
    mut on_rejected: impl FnMut(),
) -> Result<()> {
    for &kind in order {
        for path in formats::discover_query_files(dir, kind)? {
            tracing::info!("processing {}", path.display());
            for result in formats::parse_file(kind, &path)? {
                match result {
                    Ok(record) => visit(kind, &path, record),
                    Err(e) if strict => return Err(e.into()),
                    Err(e) => {
                        tracing::warn!("skipping record: {e}");
                        on_rejected();
                    }
                }
            }
        }
    }
    Ok(())
}

/// Coalesce all export files under `dir`, sources taken in `order`.
pub fn coalesce_queries(dir: &Path, order: &[SourceKind], options: &DedupOptions) -> Result<Coalescer> {
    let mut coalescer = Coalescer::new(options.min_year);
    let mut rejected = 0usize;

    visit_queries(
        dir,
        order,
        options.strict,
        |_, _, record| {
            coalescer.offer(record);
        },
        || rejected += 1,
    )?;

    for _ in 0..rejected {
        coalescer.note_rejected();
    }

    let report = coalescer.report();
    tracing::info!(
        "coalesced {} hits: {} duplicates removed, {} retained",
        report.hits,
        report.duplicates,
        report.retained
    );
    Ok(coalescer)
}

/// Coalesce already-parsed records, e.g. from an in-memory source.
pub fn coalesce_records(records: impl IntoIterator<Item = RecordResult>, min_year: i32) -> Coalescer {
    let mut coalescer = Coalescer::new(min_year);
    for result in records {
        match result {
            Ok(record) => {
                coalescer.offer(record);
            }
            Err(e) => {
                tracing::warn!("skipping record: {e}");
                coalescer.note_rejected();
            }
        }
    }
    coalescer
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryHits {
    pub query_id: String,
    pub path: PathBuf,
    pub hits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceHits {
    pub source: SourceKind,
    pub queries: Vec<QueryHits>,
    pub total: usize,
}

/// Per-query counts of records passing the year filter, without deduplication.
pub fn count_hits(dir: &Path, order: &[SourceKind], options: &DedupOptions) -> Result<Vec<SourceHits>> {
    let mut sources = Vec::with_capacity(order.len());

    for &kind in order {
        let mut queries = Vec::new();
        for path in formats::discover_query_files(dir, kind)? {
            queries.push(QueryHits {
                query_id: formats::query_id(&path),
                path,
                hits: 0,
            });
        }

        visit_queries(
            dir,
            &[kind],
            options.strict,
            |_, path, record| {
                if record.year() >= options.min_year
                    && let Some(q) = queries.iter_mut().find(|q| q.path == path)
                {
                    q.hits += 1;
                }
            },
            || {},
        )?;

        let total = queries.iter().map(|q| q.hits).sum();
        sources.push(SourceHits {
            source: kind,
            queries,
            total,
        });
    }

    Ok(sources)
}
