use std::collections::HashMap;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// 1-based line of the entry's `@`.
    pub line: usize,
    pub entry_type: String,
    pub cite_key: String,
    pub fields: HashMap<String, String>,
}

impl BibEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parsed entries plus the 1-based lines of entries that failed to parse,
/// one per broken entry.
#[derive(Debug, Clone, Default)]
pub struct BibFile {
    pub entries: Vec<BibEntry>,
    pub error_lines: Vec<usize>,
}

enum AtBlock {
    Entry(BibEntry),
    String(String, String),
    Skipped,
}

/// Reads `@type{...}` blocks. Anything between blocks is a comment, and a
/// block only starts at an `@` that opens a line or follows the previous
/// block, so addresses in comments or inside a broken entry are ignored.
pub fn parse(input: &str) -> BibFile {
    let mut file = BibFile::default();
    let mut strings: HashMap<String, String> = HashMap::new();
    let mut floor = 0;
    let mut cursor = 0;

    while let Some(at) = next_block(input, cursor, floor) {
        let line = input[..at].matches('\n').count() + 1;
        match parse_at_block(&input[at..], &strings) {
            Ok((rest, block)) => {
                match block {
                    AtBlock::Entry(mut entry) => {
                        entry.line = line;
                        file.entries.push(entry);
                    }
                    AtBlock::String(key, value) => {
                        strings.insert(key.to_lowercase(), value);
                    }
                    AtBlock::Skipped => {}
                }
                floor = input.len() - rest.len();
                cursor = floor;
            }
            Err(_) => {
                file.error_lines.push(line);
                cursor = at + 1;
            }
        }
    }

    file
}

/// Offset of the next `@` at or after `from` that has only whitespace
/// before it on its line (or since `floor`, the end of the last good block).
fn next_block(input: &str, from: usize, floor: usize) -> Option<usize> {
    input[from..]
        .match_indices('@')
        .map(|(i, _)| from + i)
        .find(|&at| {
            let line_start = input[..at].rfind('\n').map_or(0, |n| n + 1);
            input[line_start.max(floor)..at].trim().is_empty()
        })
}

fn parse_at_block<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, AtBlock> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, kind) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;
    let (rest, _) = multispace0(rest)?;

    match kind.to_ascii_lowercase().as_str() {
        "comment" | "preamble" => {
            let (rest, _) = braced(rest)?;
            Ok((rest, AtBlock::Skipped))
        }
        "string" => {
            let (rest, _) = char('{')(rest)?;
            let (rest, (key, value)) = field(rest, strings)?;
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = char('}')(rest)?;
            Ok((rest, AtBlock::String(key, value)))
        }
        _ => {
            let (rest, _) = char('{')(rest)?;
            let (rest, _) = multispace0(rest)?;
            let (rest, cite_key) =
                take_while1(|c: char| c != ',' && c != '}' && !c.is_whitespace())(rest)?;
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = char(',')(rest)?;
            let (rest, fields) = fields(rest, strings)?;
            let (rest, _) = multispace0(rest)?;
            let (rest, _) = char('}')(rest)?;

            Ok((
                rest,
                AtBlock::Entry(BibEntry {
                    line: 0,
                    entry_type: kind.to_ascii_lowercase(),
                    cite_key: cite_key.to_string(),
                    fields: fields.into_iter().collect(),
                }),
            ))
        }
    }
}

fn fields<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, Vec<(String, String)>> {
    let mut out = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        if rest.starts_with('}') {
            return Ok((rest, out));
        }
        let (rest, pair) = field(rest, strings)?;
        out.push(pair);

        let (rest, _) = multispace0(rest)?;
        remaining = rest.strip_prefix(',').unwrap_or(rest);
    }
}

fn field<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, key) = take_while1(|c: char| c.is_ascii_alphanumeric() || "_-:.".contains(c))(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, value) = value(rest, strings)?;
    Ok((rest, (key.to_ascii_lowercase(), value)))
}

fn value<'a>(input: &'a str, strings: &HashMap<String, String>) -> IResult<&'a str, String> {
    let mut result = String::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;
        let (rest, part) = alt((
            map(braced, |s: &str| s.to_string()),
            map(quoted, |s: &str| s.to_string()),
            map(
                take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                |s: &str| {
                    strings
                        .get(&s.to_lowercase())
                        .cloned()
                        .unwrap_or_else(|| s.to_string())
                },
            ),
        ))(rest)?;
        result.push_str(&part);

        let (rest, _) = multispace0(rest)?;
        match rest.strip_prefix('#') {
            Some(next) => remaining = next,
            None => return Ok((rest, result)),
        }
    }
}

/// `{...}` with nested braces; yields the inner text.
fn braced(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('{')(input)?;
    let mut depth = 1usize;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[i + 1..], &body[..i]));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

/// `"..."`; quotes inside braces do not terminate the value.
fn quoted(input: &str) -> IResult<&str, &str> {
    let (body, _) = char('"')(input)?;
    let mut depth = 0usize;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '"' if depth == 0 => return Ok((&body[i + 1..], &body[..i])),
            _ => {}
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Char)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acm_export_entry() {
        let input = r#"
@inproceedings{10.1145/3359789.3359799,
author = {Doe, Jane and Roe, Richard},
title = {Fuzzing {GPU} Drivers},
year = {2019},
isbn = {9781450376280},
publisher = {Association for Computing Machinery},
url = {https://doi.org/10.1145/3359789.3359799},
doi = {10.1145/3359789.3359799},
}
"#;
        let file = parse(input);
        assert!(file.error_lines.is_empty());
        assert_eq!(file.entries.len(), 1);

        let entry = &file.entries[0];
        assert_eq!(entry.entry_type, "inproceedings");
        assert_eq!(entry.cite_key, "10.1145/3359789.3359799");
        assert_eq!(entry.field("title"), Some("Fuzzing {GPU} Drivers"));
        assert_eq!(entry.field("year"), Some("2019"));
        assert_eq!(entry.field("doi"), Some("10.1145/3359789.3359799"));
    }

    #[test]
    fn test_quoted_values_and_uppercase_keys() {
        let input = r#"@article{k, TITLE = "Testing {"}Quotes{"}", Year = 2020}"#;
        let file = parse(input);
        let entry = &file.entries[0];
        assert_eq!(entry.field("title"), Some(r#"Testing {"}Quotes{"}"#));
        assert_eq!(entry.field("year"), Some("2020"));
    }

    #[test]
    fn test_string_macros_and_concatenation() {
        let input = r#"
@string{conf = "Proc. of "}
@comment{ exported by the ACM DL }
@inproceedings{a, booktitle = conf # {SOSP}, title = {A}, year = 2011}
"#;
        let file = parse(input);
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].field("booktitle"), Some("Proc. of SOSP"));
    }

    #[test]
    fn test_broken_entry_is_reported_and_skipped() {
        let input = "@article{bad, title = {unterminated\n\n@article{good, title = {Fine}, year = {2020}}\n";
        let file = parse(input);
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].cite_key, "good");
        assert_eq!(file.error_lines, vec![1]);
        assert_eq!(file.entries[0].line, 3);
    }

    #[test]
    fn test_at_sign_in_comment_is_not_an_entry() {
        let input = "% Exported by jane@example.org\n@article{k, title = {A}, year = {2020}}\n";
        let file = parse(input);
        assert!(file.error_lines.is_empty());
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].cite_key, "k");
    }

    #[test]
    fn test_broken_entry_with_addresses_reports_once() {
        let input = "@article{bad, note = {mail a@b.c and x@y.z,\n  then w@v.u\n\n  @article{good, title = {Fine}, year = {2020}}\n";
        let file = parse(input);
        assert_eq!(file.error_lines, vec![1]);
        assert_eq!(file.entries.len(), 1);
        assert_eq!(file.entries[0].cite_key, "good");
    }

    #[test]
    fn test_blocks_on_one_line() {
        let input = r#"@string{v = "Vol"} @misc{m, title = v # { 2}, year = 2001}"#;
        let file = parse(input);
        assert!(file.error_lines.is_empty());
        assert_eq!(file.entries[0].field("title"), Some("Vol 2"));
    }
}
