use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod crossref;
pub mod semantic_scholar;

pub use crossref::{CrossRefSource, CrossRefWork};
pub use semantic_scholar::SemanticScholarSource;

/// Citation data for one paper, as stored in the citation cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub citation_count: u64,
}

/// A service that reports how often a paper has been cited.
#[async_trait]
pub trait CitationSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` means the service confirmed it does not know the DOI.
    async fn citation_count(&self, doi: &str) -> Result<Option<CitationInfo>>;
}
