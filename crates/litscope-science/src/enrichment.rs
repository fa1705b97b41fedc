use std::collections::HashSet;

use litscope_core::Record;
use serde::Serialize;

use crate::cache::CitationCache;
use crate::error::Result;
use crate::sources::CitationSource;

/// Lookup result for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "count", rename_all = "snake_case")]
pub enum CitationStatus {
    Known(u64),
    NotFound,
    /// No DOI, or the lookup failed this run.
    Unknown,
}

impl CitationStatus {
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Known(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub cached: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub failed: usize,
    pub without_doi: usize,
}

/// Resolve citation counts for `records`, in order.
///
/// Each distinct identifier is looked up at most once per run. Answers
/// (including not-found) are stored in `cache`; failed lookups are not, so
/// a later run retries them.
pub async fn enrich(
    records: &[Record],
    source: &dyn CitationSource,
    cache: &mut CitationCache,
) -> Result<(Vec<CitationStatus>, EnrichmentReport)> {
    let mut report = EnrichmentReport::default();
    let mut failed_this_run: HashSet<String> = HashSet::new();
    let mut statuses = Vec::with_capacity(records.len());

    for record in records {
        let Some(doi) = record.ident().doi() else {
            report.without_doi += 1;
            statuses.push(CitationStatus::Unknown);
            continue;
        };
        let key = record.ident().to_string();

        if let Some(cached) = cache.get(&key) {
            report.cached += 1;
            statuses.push(match cached {
                Some(info) => CitationStatus::Known(info.citation_count),
                None => CitationStatus::NotFound,
            });
            continue;
        }
        if failed_this_run.contains(&key) {
            statuses.push(CitationStatus::Unknown);
            continue;
        }

        match source.citation_count(doi).await {
            Ok(Some(info)) => {
                report.fetched += 1;
                let count = info.citation_count;
                cache.insert(key, Some(info))?;
                statuses.push(CitationStatus::Known(count));
            }
            Ok(None) => {
                report.not_found += 1;
                tracing::info!("{} has no record of {key}", source.name());
                cache.insert(key, None)?;
                statuses.push(CitationStatus::NotFound);
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!("citation lookup for {key} failed: {e}");
                failed_this_run.insert(key);
                statuses.push(CitationStatus::Unknown);
            }
        }
    }

    cache.flush()?;
    Ok((statuses, report))
}
