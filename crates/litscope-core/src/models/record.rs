use std::fmt;

use serde::Serialize;

use super::identifier::RecordIdent;

/// One search hit from an exported query file.
///
/// Built once per input line and never mutated. The canonical title is
/// derived at construction and reused for every comparison.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    query_id: String,
    query_index: usize,
    title: String,
    ident: RecordIdent,
    url: String,
    year: i32,
    #[serde(skip)]
    canonical_title: String,
}

impl Record {
    /// `title` must already be stripped of markup.
    pub fn new(
        query_id: impl Into<String>,
        query_index: usize,
        title: impl Into<String>,
        ident: RecordIdent,
        url: impl Into<String>,
        year: i32,
    ) -> Self {
        let title = title.into();
        let canonical_title = canonical_title(&title);
        Self {
            query_id: query_id.into(),
            query_index,
            title,
            ident,
            url: url.into(),
            year,
            canonical_title,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.query_id
    }

    /// Zero-based position within the query file.
    pub fn query_index(&self) -> usize {
        self.query_index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn ident(&self) -> &RecordIdent {
        &self.ident
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn canonical_title(&self) -> &str {
        &self.canonical_title
    }

    /// Identifier match OR canonical title match; either one is enough.
    pub fn is_duplicate_of(&self, other: &Record) -> bool {
        self.ident.matches(&other.ident) || self.canonical_title == other.canonical_title
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.ident, self.title, self.canonical_title)
    }
}

/// Lowercase and drop everything outside `[a-z0-9]`.
pub fn canonical_title(title: &str) -> String {
    title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, ident: RecordIdent) -> Record {
        Record::new("IEEE_q1", 0, title, ident, "https://example.org", 2015)
    }

    #[test]
    fn canonical_title_strips_case_and_punctuation() {
        assert_eq!(canonical_title("A Study On X!!"), "astudyonx");
        assert_eq!(canonical_title("a study on x"), "astudyonx");
        assert_eq!(canonical_title("Rotalumé: naïve"), "rotalumnave");
    }

    #[test]
    fn identifier_match_alone_is_a_duplicate() {
        let a = record("Foo Bar", RecordIdent::select(Some("10.1/x"), None, None));
        let b = record("Foo Baz", RecordIdent::select(Some("10.1/x"), None, None));
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn title_match_without_identifiers_is_a_duplicate() {
        let a = record("A Study On X!!", RecordIdent::Missing);
        let b = record("a study on x", RecordIdent::Missing);
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn title_match_overrides_differing_identifiers() {
        let a = record("Same Title", RecordIdent::select(Some("10.1/a"), None, None));
        let b = record("same title.", RecordIdent::select(Some("10.1/b"), None, None));
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn different_titles_and_identifiers_are_distinct() {
        let a = record("First", RecordIdent::select(Some("10.1/a"), None, None));
        let b = record("Second", RecordIdent::Missing);
        assert!(!a.is_duplicate_of(&b));
    }
}
