use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use litscope_core::{canonical_title, write_atomic};
use serde::Serialize;

use crate::error::{Result, ScienceError};
use crate::pdf::{sort_titles, text_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    /// Lowercased title as a substring of the lowercased text.
    #[default]
    Exact,
    /// Canonical title as a substring of the canonical text.
    Canonical,
}

impl MatchMethod {
    fn prepare_title(&self, title: &str) -> String {
        match self {
            Self::Exact => title.trim().to_lowercase(),
            Self::Canonical => canonical_title(title),
        }
    }

    fn prepare_text(&self, text: &str) -> String {
        match self {
            Self::Exact => text.to_lowercase(),
            Self::Canonical => canonical_title(text),
        }
    }
}

impl FromStr for MatchMethod {
    type Err = ScienceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "canonical" => Ok(Self::Canonical),
            other => Err(ScienceError::Parse(format!("unknown match method: {other}"))),
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => f.write_str("exact"),
            Self::Canonical => f.write_str("canonical"),
        }
    }
}

/// Square matrix; `cells[row][col]` is true when paper `row` mentions paper `col`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReferenceMatrix {
    pub titles: Vec<String>,
    pub cells: Vec<Vec<bool>>,
}

impl CrossReferenceMatrix {
    /// `texts[i]` is the full text of the paper titled `titles[i]`.
    pub fn build(titles: &[String], texts: &[String], method: MatchMethod) -> Self {
        let needles: Vec<String> = titles.iter().map(|t| method.prepare_title(t)).collect();

        let cells = texts
            .iter()
            .enumerate()
            .map(|(row, text)| {
                let haystack = method.prepare_text(text);
                needles
                    .iter()
                    .enumerate()
                    .map(|(col, needle)| {
                        row != col && !needle.is_empty() && haystack.contains(needle.as_str())
                    })
                    .collect()
            })
            .collect();

        Self {
            titles: titles.to_vec(),
            cells,
        }
    }

    /// Number of true cells.
    pub fn mentions(&self) -> usize {
        self.cells.iter().flatten().filter(|c| **c).count()
    }

    pub fn to_tsv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(Vec::new());

        let mut header = Vec::with_capacity(self.titles.len() + 1);
        header.push("");
        header.extend(self.titles.iter().map(String::as_str));
        writer.write_record(&header)?;

        for (title, row) in self.titles.iter().zip(&self.cells) {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(title.as_str());
            record.extend(row.iter().map(|c| if *c { "TRUE" } else { "FALSE" }));
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| ScienceError::Io(e.into_error()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, &self.to_tsv()?)?;
        Ok(())
    }
}

/// Titles index: blank lines dropped, sorted case-insensitively.
pub fn read_titles(path: &Path) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    let mut titles: Vec<String> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect();
    sort_titles(&mut titles);
    Ok(titles)
}

/// Build the matrix from a titles index and the text files named after it.
///
/// A title without a text file contributes an empty row.
pub fn cross_reference(
    text_dir: &Path,
    titles_path: &Path,
    method: MatchMethod,
) -> Result<CrossReferenceMatrix> {
    let titles = read_titles(titles_path)?;
    let texts = titles
        .iter()
        .map(|title| {
            let path = text_path(text_dir, title);
            match fs::read(&path) {
                Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!("no text for {title:?} at {}", path.display());
                    Ok(String::new())
                }
                Err(e) => Err(e.into()),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!("cross-referencing {} papers ({method})", titles.len());
    Ok(CrossReferenceMatrix::build(&titles, &texts, method))
}
