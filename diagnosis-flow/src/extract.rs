//! Document-to-text extraction.
//!
//! Extraction is best-effort text linearization only: PDF page text is
//! concatenated in document order, DOCX paragraphs are joined with newlines,
//! and plain text is decoded as strict UTF-8. There is no OCR and no layout
//! or table reconstruction.

use std::path::Path;

use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use tracing::debug;

use crate::error::{ExtractError, ExtractResult};
use crate::models::{DocumentFormat, SourceDocument};

/// Extract the text of the document at `path`, resolving the format from the
/// file extension.
pub fn extract_file(path: &Path) -> ExtractResult<String> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let format = DocumentFormat::from_extension(extension)
        .ok_or_else(|| ExtractError::UnsupportedFormat(extension.to_string()))?;
    extract_document(&SourceDocument::new(path, format))
}

/// Extract the text of a document whose format is already known.
pub fn extract_document(document: &SourceDocument) -> ExtractResult<String> {
    if !document.path.exists() {
        return Err(ExtractError::NotFound(document.path.clone()));
    }
    let bytes = std::fs::read(&document.path)?;
    debug!(
        path = %document.path.display(),
        format = %document.declared_format,
        size_bytes = bytes.len(),
        "extracting document text"
    );
    extract_bytes(&bytes, document.declared_format)
}

/// Extract text from raw document bytes. Pure; touches no filesystem state.
pub fn extract_bytes(bytes: &[u8], format: DocumentFormat) -> ExtractResult<String> {
    match format {
        DocumentFormat::Txt => extract_txt(bytes),
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Docx => extract_docx(bytes),
    }
}

fn extract_txt(bytes: &[u8]) -> ExtractResult<String> {
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn extract_pdf(bytes: &[u8]) -> ExtractResult<String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> ExtractResult<String> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            paragraphs.push(paragraph_text(paragraph));
        }
    }
    Ok(paragraphs.join("\n"))
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                if let RunChild::Text(t) = run_child {
                    text.push_str(&t.text);
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use std::io::Cursor;

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for paragraph in paragraphs {
            let mut p = Paragraph::new();
            if !paragraph.is_empty() {
                p = p.add_run(Run::new().add_text(*paragraph));
            }
            docx = docx.add_paragraph(p);
        }
        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn txt_bytes_come_back_verbatim() {
        let content = "Patient: Jane Doe\nReports fever and cough for 3 days.\n";
        let text = extract_bytes(content.as_bytes(), DocumentFormat::Txt).unwrap();
        assert_eq!(text, content);
    }

    #[test]
    fn txt_rejects_invalid_utf8() {
        let err = extract_bytes(&[0x66, 0x65, 0xff, 0xfe], DocumentFormat::Txt).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidEncoding(_)));
    }

    #[test]
    fn docx_paragraphs_join_with_newlines_in_order() {
        let bytes = docx_bytes(&["Patient: Jane Doe", "", "Reports fever and cough."]);
        let text = extract_bytes(&bytes, DocumentFormat::Docx).unwrap();
        assert_eq!(text, "Patient: Jane Doe\n\nReports fever and cough.");
    }

    #[test]
    fn docx_rejects_garbage_bytes() {
        let err = extract_bytes(b"not a zip archive", DocumentFormat::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn file_extraction_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "headache and fatigue").unwrap();
        assert_eq!(extract_file(&path).unwrap(), "headache and fatigue");
    }

    #[test]
    fn unknown_extension_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "a,b,c").unwrap();
        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(ext) if ext == "csv"));
    }

    #[test]
    fn missing_file_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");
        let err = extract_file(&path).unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(p) if p == path));
    }

    // Exercises the real PDF path against a local fixture. Set PDF_TEST_PATH
    // to a PDF with known text to run it.
    #[test]
    fn pdf_extraction_with_local_fixture() {
        let Ok(path) = std::env::var("PDF_TEST_PATH") else {
            return;
        };
        let bytes = std::fs::read(&path).unwrap();
        let text = extract_bytes(&bytes, DocumentFormat::Pdf).unwrap();
        assert!(!text.trim().is_empty());
    }
}
