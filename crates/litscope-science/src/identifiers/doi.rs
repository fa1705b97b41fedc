use once_cell::sync::Lazy;
use regex::Regex;

static DOI_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^10\.\d+(\.\d+)*/\S+$").expect("valid DOI regex")
});

const PREFIXES: [&str; 6] = [
    "https://doi.org/",
    "http://doi.org/",
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "dx.doi.org/",
    "doi.org/",
];

/// Remove URL and `doi:` prefixes without touching case.
pub fn strip_doi_prefix(input: &str) -> &str {
    let input = input.trim();
    for prefix in PREFIXES {
        if let Some(rest) = strip_prefix_ignore_case(input, prefix) {
            return rest.trim_start();
        }
    }
    strip_prefix_ignore_case(input, "doi:")
        .map(str::trim_start)
        .unwrap_or(input)
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}

pub fn is_doi(input: &str) -> bool {
    DOI_SHAPE.is_match(strip_doi_prefix(input))
}

/// Canonical DOI form: prefixes stripped and lowercased.
///
/// Values that are not DOI-shaped are kept trimmed but otherwise untouched.
/// Blank input yields `None`.
pub fn normalize_doi(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let stripped = strip_doi_prefix(trimmed);
    if DOI_SHAPE.is_match(stripped) {
        Some(stripped.to_lowercase())
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_doi() {
        assert_eq!(normalize_doi("10.1000/xyz123").as_deref(), Some("10.1000/xyz123"));
    }

    #[test]
    fn doi_with_https_prefix() {
        assert_eq!(
            normalize_doi("https://doi.org/10.1000/xyz123").as_deref(),
            Some("10.1000/xyz123")
        );
        assert_eq!(
            normalize_doi("http://dx.doi.org/10.1000/xyz123").as_deref(),
            Some("10.1000/xyz123")
        );
    }

    #[test]
    fn doi_with_colon_prefix() {
        assert_eq!(normalize_doi("doi:10.1000/xyz123").as_deref(), Some("10.1000/xyz123"));
        assert_eq!(normalize_doi("DOI: 10.1000/xyz123").as_deref(), Some("10.1000/xyz123"));
    }

    #[test]
    fn uppercase_is_lowered() {
        assert_eq!(normalize_doi("10.1000/XYZ123").as_deref(), Some("10.1000/xyz123"));
    }

    #[test]
    fn not_a_doi_is_kept_verbatim() {
        assert_eq!(normalize_doi("  Not-A-Doi ").as_deref(), Some("Not-A-Doi"));
        assert!(!is_doi("10.1000"));
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(normalize_doi(""), None);
        assert_eq!(normalize_doi("   "), None);
    }
}
