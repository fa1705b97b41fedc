use scraper::Html;

/// Strip HTML/XML markup from an exported title and decode entities.
///
/// Whitespace runs left behind by removed tags collapse to a single space.
pub fn strip_markup(raw: &str) -> String {
    if !raw.contains(['<', '&']) {
        return normalize_whitespace(raw);
    }
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<Vec<_>>().join("");
    normalize_whitespace(&text)
}

fn normalize_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
