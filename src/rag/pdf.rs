//! PDF text extraction using lopdf.

use lopdf::Document as PdfDocument;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    Load(String),
    #[error("PDF has no pages")]
    NoPages,
    #[error("No text extracted from PDF.")]
    NoText,
}

/// An uploaded document after text extraction. The raw bytes are not kept.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub page_count: usize,
    pub text: String,
}

/// Parse `content` as a PDF and extract the text of every page, in page order.
pub fn extract_document(id: &str, content: &[u8]) -> Result<Document, PdfError> {
    let doc = PdfDocument::load_mem(content).map_err(|e| PdfError::Load(e.to_string()))?;

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(PdfError::NoPages);
    }

    // BTreeMap keys are already in page order
    let mut text = String::new();
    for page_num in pages.keys() {
        match doc.extract_text(&[*page_num]) {
            Ok(page_text) => {
                let trimmed = page_text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(trimmed);
            }
            Err(e) => {
                tracing::debug!("Skipping page {} of {}: {}", page_num, id, e);
            }
        }
    }

    if text.trim().is_empty() {
        return Err(PdfError::NoText);
    }

    Ok(Document {
        id: id.to_string(),
        page_count: pages.len(),
        text,
    })
}
