pub mod doi_refs;
pub mod matrix;

pub use doi_refs::{ReferenceReport, WorkReferences, collect_references, read_idents};
pub use matrix::{CrossReferenceMatrix, MatchMethod, cross_reference, read_titles};
