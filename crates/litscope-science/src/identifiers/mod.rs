pub mod doi;
pub mod isbn;
pub mod issn;

use litscope_core::RecordIdent;

pub use doi::normalize_doi;
pub use isbn::normalize_isbn;
pub use issn::normalize_issn;

/// Normalize each candidate, then select by priority DOI > ISSN > ISBN.
pub fn select_ident(doi: Option<&str>, issn: Option<&str>, isbn: Option<&str>) -> RecordIdent {
    let doi = doi.and_then(normalize_doi);
    let issn = issn.and_then(normalize_issn);
    let isbn = isbn.and_then(normalize_isbn);
    RecordIdent::select(doi.as_deref(), issn.as_deref(), isbn.as_deref())
}

/// First non-blank entry of a `;` or `,` separated list.
pub(crate) fn first_listed(raw: &str) -> Option<&str> {
    raw.split([';', ','])
        .map(str::trim)
        .find(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use litscope_core::IdentKind;

    #[test]
    fn doi_wins_after_normalization() {
        let ident = select_ident(
            Some("https://doi.org/10.1109/ABC.2020.1"),
            Some("12345678"),
            Some("9780306406157"),
        );
        assert_eq!(ident.to_string(), "DOI:10.1109/abc.2020.1");
    }

    #[test]
    fn blank_doi_falls_back_to_issn() {
        let ident = select_ident(Some("  "), Some("1234567x"), None);
        assert_eq!(ident.kind(), Some(IdentKind::Issn));
        assert_eq!(ident.value(), Some("1234-567X"));
    }

    #[test]
    fn same_paper_from_two_exports_matches() {
        let ieee = select_ident(Some("10.1145/3359789.3359799"), None, None);
        let acm = select_ident(Some("doi:10.1145/3359789.3359799"), None, None);
        assert!(ieee.matches(&acm));

        let a = select_ident(None, None, Some("0-306-40615-2"));
        let b = select_ident(None, None, Some("978-0-306-40615-7; 9781234567897"));
        assert!(a.matches(&b));
    }

    #[test]
    fn first_listed_skips_blanks() {
        assert_eq!(first_listed(" ; 1234-5678, 8765-4321"), Some("1234-5678"));
        assert_eq!(first_listed(" , ;"), None);
    }
}
