use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;
use crate::identifiers::doi::normalize_doi;
use crate::sources::CrossRefSource;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkReferences {
    /// Every DOI the work references, sorted.
    pub references: Vec<String>,
    /// The subset of `references` that is also in the input set.
    pub within_set: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceReport {
    pub works: BTreeMap<String, WorkReferences>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<String>,
}

/// DOIs from an identifiers file with one `KIND:value` per line.
///
/// Non-DOI lines are skipped; order is kept and repeats are dropped.
pub fn read_idents(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let mut seen = BTreeSet::new();
    let mut dois = Vec::new();

    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((kind, value)) = line.split_once(':') else {
            tracing::debug!("ignoring identifier line without kind: {line:?}");
            continue;
        };
        if !kind.trim().eq_ignore_ascii_case("DOI") {
            continue;
        }
        if let Some(doi) = normalize_doi(value)
            && seen.insert(doi.clone())
        {
            dois.push(doi);
        }
    }
    Ok(dois)
}

pub async fn collect_references(source: &CrossRefSource, dois: &[String]) -> ReferenceReport {
    let input: BTreeSet<&str> = dois.iter().map(String::as_str).collect();
    let mut report = ReferenceReport::default();

    for doi in dois {
        let work = match source.fetch_by_doi(doi).await {
            Ok(work) => work,
            Err(e) => {
                tracing::warn!("CrossRef lookup for {doi} failed: {e}");
                report.failed.push(doi.clone());
                continue;
            }
        };

        let references = work.reference_dois();
        let within_set = references
            .iter()
            .filter(|r| r.as_str() != doi && input.contains(r.as_str()))
            .cloned()
            .collect();
        tracing::debug!("{doi}: {} references", references.len());

        report.works.insert(
            doi.clone(),
            WorkReferences {
                references,
                within_set,
            },
        );
    }

    report
}
