use std::io::{Cursor, Read};

use quick_xml::events::Event;

use super::ExtractionError;

/// Raw text of a DOCX document, one paragraph per blank-line-separated block.
pub fn extract_docx_text(docx_bytes: &[u8]) -> Result<String, ExtractionError> {
    // DOCX is a ZIP archive; the body lives in word/document.xml
    let mut archive = zip::ZipArchive::new(Cursor::new(docx_bytes))
        .map_err(|e| ExtractionError::DocxParsing(format!("zip: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::DocxParsing(format!("missing document.xml: {e}")))?
        .read_to_string(&mut xml)?;

    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => current.push('\t'),
                b"br" => current.push('\n'),
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let paragraph = current.trim();
                    if !paragraph.is_empty() {
                        paragraphs.push(paragraph.to_string());
                    }
                    current.clear();
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                if let Ok(s) = e.unescape() {
                    current.push_str(&s);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractionError::DocxParsing(format!("xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    let tail = current.trim();
    if !tail.is_empty() {
        paragraphs.push(tail.to_string());
    }
    Ok(paragraphs.join("\n\n"))
}
