//! Document collaborator: turn an uploaded `.txt`, `.docx` or `.pdf` file
//! into plain text for the codec.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::error::{ChromaError, Result};

/// Supported upload formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Txt,
    Docx,
    Pdf,
}

impl DocumentKind {
    /// Pick the extractor from a file name (extension is case-insensitive).
    pub fn from_filename(name: &str) -> Result<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let ext = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        match ext {
            "txt" => Ok(DocumentKind::Txt),
            "docx" => Ok(DocumentKind::Docx),
            "pdf" => Ok(DocumentKind::Pdf),
            _ => Err(ChromaError::UnsupportedInputFormat(format!(
                "{name:?} (expected .txt, .docx or .pdf)"
            ))),
        }
    }
}

/// Extract the text of `bytes` as `kind`. Documents without any visible
/// text are rejected with [`ChromaError::EmptyInput`].
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String> {
    let text = match kind {
        DocumentKind::Txt => String::from_utf8(bytes.to_vec())
            .map_err(|e| ChromaError::Document(format!("text file is not valid UTF-8: {e}")))?,
        DocumentKind::Docx => read_docx(bytes)?,
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ChromaError::Document(format!("pdf: {e}")))?,
    };
    if text.trim().is_empty() {
        return Err(ChromaError::EmptyInput);
    }
    debug!("extracted {} characters from {:?} upload", text.chars().count(), kind);
    Ok(text)
}

/// Filename-driven convenience over [`DocumentKind::from_filename`] and
/// [`extract_text`].
pub fn extract_file(name: &str, bytes: &[u8]) -> Result<String> {
    extract_text(DocumentKind::from_filename(name)?, bytes)
}

/// Paragraph text of a WordprocessingML package, one line per paragraph.
fn read_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ChromaError::Document(format!("docx container: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ChromaError::Document(format!("docx body: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| ChromaError::Document(format!("docx body: {e}")))?;

    let mut reader = Reader::from_str(&xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ChromaError::Document(format!("docx xml: {e}")))?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ChromaError::Document(format!("docx xml: {e}"))),
            _ => {}
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n"))
}
