//! PDF discovery and text extraction.
//!
//! Scans the configured documents directory for PDF files and extracts
//! their plain text. Files that are not PDFs are skipped silently; files
//! that fail extraction are reported by the ingestion pipeline and skipped.

use anyhow::{bail, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

use crate::models::PdfFile;

/// Extracted document content: plain text plus page count.
#[derive(Debug)]
pub struct ExtractedPdf {
    pub text: String,
    pub pages: i64,
}

/// Scan a directory recursively for PDF files, sorted by relative path.
pub fn scan_documents(dir: &Path) -> Result<Vec<PdfFile>> {
    if !dir.exists() {
        bail!("Documents directory does not exist: {}", dir.display());
    }

    let include_set = build_globset(&["**/*.pdf".to_string()])?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(dir).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(PdfFile {
            path: path.to_path_buf(),
            file_name: rel_str,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(files)
}

/// Extract plain text and page count from a PDF on disk.
///
/// Page count comes from the PDF page tree; if the document parses for
/// text extraction but the page tree is unreadable, the count is 0.
pub fn extract_pdf(path: &Path) -> Result<ExtractedPdf> {
    let bytes = std::fs::read(path)?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .map_err(|e| anyhow::anyhow!("PDF extraction failed: {}", e))?;

    let pages = lopdf::Document::load_mem(&bytes)
        .map(|doc| doc.get_pages().len() as i64)
        .unwrap_or(0);

    Ok(ExtractedPdf { text, pages })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_skips_non_pdfs() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "plain text").unwrap();
        fs::write(tmp.path().join("guide.pdf"), b"%PDF-1.4 stub").unwrap();
        fs::write(tmp.path().join("SCAN.PDF"), b"%PDF-1.4 stub").unwrap();

        let files = scan_documents(tmp.path()).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["SCAN.PDF", "guide.pdf"]);
    }

    #[test]
    fn test_scan_recurses_subdirectories() {
        let tmp = tempfile::TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("archive")).unwrap();
        fs::write(tmp.path().join("archive/old.pdf"), b"%PDF-1.4 stub").unwrap();

        let files = scan_documents(tmp.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name, "archive/old.pdf");
    }

    #[test]
    fn test_scan_missing_dir_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(scan_documents(&missing).is_err());
    }

    #[test]
    fn test_extract_invalid_pdf_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        fs::write(&path, b"not a pdf at all").unwrap();
        assert!(extract_pdf(&path).is_err());
    }
}
