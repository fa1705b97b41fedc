use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of persistent identifier, in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentKind {
    Doi,
    Issn,
    Isbn,
}

impl IdentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Doi => "DOI",
            Self::Issn => "ISSN",
            Self::Isbn => "ISBN",
        }
    }
}

impl fmt::Display for IdentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed identifier value. Used as a lookup key during coalescing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersistentId {
    pub kind: IdentKind,
    pub value: String,
}

/// The single identifier kept for a record.
///
/// Only the highest-priority candidate survives: DOI, then ISSN, then ISBN.
/// `PartialEq` is intentionally not derived; two `Missing` identifiers must
/// never compare as the same paper. Use [`RecordIdent::matches`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum RecordIdent {
    Persistent(PersistentId),
    #[default]
    Missing,
}

impl RecordIdent {
    /// Pick DOI if present, else ISSN, else ISBN. Blank candidates are absent.
    pub fn select(doi: Option<&str>, issn: Option<&str>, isbn: Option<&str>) -> Self {
        let candidates = [
            (IdentKind::Doi, doi),
            (IdentKind::Issn, issn),
            (IdentKind::Isbn, isbn),
        ];

        candidates
            .into_iter()
            .find_map(|(kind, value)| {
                value
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(|v| PersistentId {
                        kind,
                        value: v.to_string(),
                    })
            })
            .map(Self::Persistent)
            .unwrap_or(Self::Missing)
    }

    pub fn persistent(&self) -> Option<&PersistentId> {
        match self {
            Self::Persistent(id) => Some(id),
            Self::Missing => None,
        }
    }

    pub fn kind(&self) -> Option<IdentKind> {
        self.persistent().map(|id| id.kind)
    }

    pub fn value(&self) -> Option<&str> {
        self.persistent().map(|id| id.value.as_str())
    }

    /// The DOI value, if this identifier is a DOI.
    pub fn doi(&self) -> Option<&str> {
        self.persistent()
            .filter(|id| id.kind == IdentKind::Doi)
            .map(|id| id.value.as_str())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Same kind and value on both sides. Missing never matches.
    pub fn matches(&self, other: &RecordIdent) -> bool {
        match (self, other) {
            (Self::Persistent(a), Self::Persistent(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for RecordIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistent(id) => write!(f, "{}:{}", id.kind, id.value),
            Self::Missing => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_prefers_doi_then_issn_then_isbn() {
        let cases: [(Option<&str>, Option<&str>, Option<&str>, Option<IdentKind>); 8] = [
            (Some("10.1/x"), Some("1234-5678"), Some("9780306406157"), Some(IdentKind::Doi)),
            (Some("10.1/x"), None, Some("9780306406157"), Some(IdentKind::Doi)),
            (Some("10.1/x"), Some("1234-5678"), None, Some(IdentKind::Doi)),
            (Some("10.1/x"), None, None, Some(IdentKind::Doi)),
            (None, Some("1234-5678"), Some("9780306406157"), Some(IdentKind::Issn)),
            (None, Some("1234-5678"), None, Some(IdentKind::Issn)),
            (None, None, Some("9780306406157"), Some(IdentKind::Isbn)),
            (None, None, None, None),
        ];

        for (doi, issn, isbn, expected) in cases {
            let ident = RecordIdent::select(doi, issn, isbn);
            assert_eq!(ident.kind(), expected, "doi={doi:?} issn={issn:?} isbn={isbn:?}");
        }
    }

    #[test]
    fn blank_candidates_fall_through() {
        let ident = RecordIdent::select(Some("   "), Some(""), Some("0306406152"));
        assert_eq!(ident.kind(), Some(IdentKind::Isbn));
        assert_eq!(ident.value(), Some("0306406152"));
    }

    #[test]
    fn missing_never_matches() {
        let a = RecordIdent::Missing;
        let b = RecordIdent::Missing;
        assert!(!a.matches(&b));
        assert!(!a.matches(&RecordIdent::select(Some("10.1/x"), None, None)));
    }

    #[test]
    fn same_value_different_kind_does_not_match() {
        let doi = RecordIdent::select(Some("1234"), None, None);
        let issn = RecordIdent::select(None, Some("1234"), None);
        assert!(!doi.matches(&issn));
        assert!(doi.matches(&RecordIdent::select(Some("1234"), Some("x"), None)));
    }

    #[test]
    fn display_form() {
        assert_eq!(RecordIdent::select(Some("10.1/x"), None, None).to_string(), "DOI:10.1/x");
        assert_eq!(RecordIdent::Missing.to_string(), "");
    }
}
