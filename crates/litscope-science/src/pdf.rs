use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use litscope_core::write_atomic;
use lopdf::Document;
use serde::Serialize;

use crate::error::{Result, ScienceError};

/// Page separator in extracted text files.
pub const PAGE_BREAK: char = '\x0c';

const MAX_FILE_STEM: usize = 200;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfDocumentText {
    pub metadata_title: Option<String>,
    pub pages: Vec<String>,
}

impl PdfDocumentText {
    pub fn text(&self) -> String {
        self.pages.join(&PAGE_BREAK.to_string())
    }

    /// Metadata title if non-blank, else the first non-blank line of text.
    pub fn title(&self) -> Option<String> {
        self.metadata_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.pages
                    .iter()
                    .flat_map(|page| page.lines())
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string)
            })
    }
}

pub trait PdfTextExtractor: Send + Sync {
    fn extract(&self, pdf_path: &Path) -> Result<PdfDocumentText>;
}

/// Pure-Rust extraction with `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PdfTextExtractor for LopdfExtractor {
    fn extract(&self, pdf_path: &Path) -> Result<PdfDocumentText> {
        let document = Document::load(pdf_path).map_err(|err| {
            ScienceError::PdfExtraction(format!("lopdf failed to open {}: {err}", pdf_path.display()))
        })?;

        let pages = document
            .get_pages()
            .keys()
            .map(|&number| {
                document.extract_text(&[number]).unwrap_or_else(|err| {
                    tracing::debug!("no text on page {number} of {}: {err}", pdf_path.display());
                    String::new()
                })
            })
            .collect();

        let metadata_title = match Document::load_metadata(pdf_path) {
            Ok(metadata) => metadata.title,
            Err(err) => {
                tracing::debug!("no metadata in {}: {err}", pdf_path.display());
                None
            }
        };

        Ok(PdfDocumentText {
            metadata_title,
            pages,
        })
    }
}

/// File name stem for a paper title, safe on common filesystems.
pub fn file_safe_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => ' ',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.');

    let mut end = cleaned.len().min(MAX_FILE_STEM);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    let stem = cleaned[..end].trim_end();
    if stem.is_empty() {
        "untitled".to_string()
    } else {
        stem.to_string()
    }
}

/// Location of the text file written for `title`.
pub fn text_path(out_dir: &Path, title: &str) -> PathBuf {
    out_dir.join(format!("{}.txt", file_safe_title(title)))
}

/// Case-insensitive title order used by the titles index.
pub fn sort_titles(titles: &mut [String]) {
    titles.sort_by_cached_key(|t| t.to_lowercase());
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractReport {
    pub extracted: usize,
    pub failed: Vec<PathBuf>,
    pub titles: Vec<String>,
}

/// Extract every regular file in `papers_dir` into `out_dir` and write the
/// sorted titles index to `titles_path`.
pub fn extract_directory(
    extractor: &dyn PdfTextExtractor,
    papers_dir: &Path,
    out_dir: &Path,
    titles_path: &Path,
) -> Result<ExtractReport> {
    let mut files: Vec<PathBuf> = fs::read_dir(papers_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    fs::create_dir_all(out_dir)?;

    let mut report = ExtractReport::default();
    let mut written: HashSet<PathBuf> = HashSet::new();

    for path in files {
        let doc = match extractor.extract(&path) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("skipping {}: {e}", path.display());
                report.failed.push(path);
                continue;
            }
        };

        let title = doc.title().unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let target = text_path(out_dir, &title);
        if !written.insert(target.clone()) {
            tracing::warn!("{} overwrites text of an earlier paper titled {title:?}", path.display());
        }
        fs::write(&target, doc.text())?;
        tracing::info!("extracted {} -> {}", path.display(), target.display());

        report.extracted += 1;
        report.titles.push(title);
    }

    sort_titles(&mut report.titles);
    let mut index = report.titles.join("\n");
    if !index.is_empty() {
        index.push('\n');
    }
    write_atomic(titles_path, index.as_bytes())?;

    Ok(report)
}
