use super::ExtractionError;

/// Text layer of a PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfText {
    pub text: String,
    pub page_count: u32,
}

/// Extract the embedded text of every page, joined by blank lines.
///
/// Scanned PDFs without a text layer yield empty text, not an error.
pub fn extract_pdf_text(pdf_bytes: &[u8]) -> Result<PdfText, ExtractionError> {
    // pdf-extract can panic on malformed input
    let result = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(pdf_bytes));

    let pages = match result {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(ExtractionError::PdfParsing(e.to_string())),
        Err(_) => {
            return Err(ExtractionError::PdfParsing(
                "PDF parser panicked (malformed file)".into(),
            ))
        }
    };

    let page_count = pages.len() as u32;
    let text = pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(PdfText { text, page_count })
}
