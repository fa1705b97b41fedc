//! litscope science: export parsing, deduplication, citation lookups, PDF
//! text, cross-references and review tables.

pub mod cache;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod formats;
pub mod http;
pub mod identifiers;
pub mod pdf;
pub mod references;
pub mod sources;
pub mod tables;
pub mod text;

pub use error::{Result, ScienceError};
