use super::first_listed;

/// First ISSN of a list, as `XXXX-XXXX` when it has eight characters.
pub fn normalize_issn(raw: &str) -> Option<String> {
    let first = first_listed(raw)?;
    let compact: String = first
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if compact.len() == 8 && compact.is_ascii() {
        Some(format!("{}-{}", &compact[..4], &compact[4..]))
    } else {
        Some(first.to_string())
    }
}
