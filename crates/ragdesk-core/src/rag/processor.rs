//! Document loading and chunking.

use std::io::{Cursor, Read};
use std::path::Path;

use regex::Regex;

use super::document::{Document, CHUNK_KEY, SOURCE_KEY, TYPE_KEY};
use super::error::ProcessorError;
use super::splitter::RecursiveTextSplitter;

/// File extensions `load_document` understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "docx"];

const DOCX_PARAGRAPH: &str = r"(?s)<w:p(?:\s[^>/]*)?>(.*?)</w:p>";
const DOCX_RUN_TEXT: &str = r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>";
const BLANK_RUNS: &str = r"\n{3,}";

/// Loads files and raw text and splits them into chunk documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    splitter: RecursiveTextSplitter,
}

impl DocumentProcessor {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ProcessorError> {
        Ok(Self {
            splitter: RecursiveTextSplitter::new(chunk_size, chunk_overlap)?,
        })
    }

    pub fn splitter(&self) -> &RecursiveTextSplitter {
        &self.splitter
    }

    /// Loads a file from disk and splits it, dispatching on its extension.
    pub fn load_document(&self, path: impl AsRef<Path>) -> Result<Vec<Document>, ProcessorError> {
        let path = path.as_ref();
        let extension = extension_of(path);

        // Reject before touching the file system.
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ProcessorError::UnsupportedFileType(display_extension(&extension)));
        }

        let bytes = std::fs::read(path).map_err(|e| ProcessorError::io(path, e))?;
        self.load_bytes(&path.to_string_lossy(), &bytes)
    }

    /// Splits in-memory file content; `file_name` selects the loader and
    /// becomes the chunks' source.
    pub fn load_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<Document>, ProcessorError> {
        let extension = extension_of(Path::new(file_name));

        let text = match extension.as_str() {
            "pdf" => extract_pdf_text(bytes)?,
            "txt" | "md" => String::from_utf8(bytes.to_vec())
                .map_err(|_| ProcessorError::Encoding(file_name.to_string()))?,
            "docx" => extract_docx_text(bytes)?,
            _ => return Err(ProcessorError::UnsupportedFileType(display_extension(&extension))),
        };

        let document = Document::new(text)
            .with_metadata(SOURCE_KEY, file_name)
            .with_metadata(TYPE_KEY, extension);

        let chunks = self.split_documents(&[document]);
        tracing::info!(file = file_name, chunks = chunks.len(), "Processed document");
        Ok(chunks)
    }

    /// Wraps raw text as a document of type "text" and splits it.
    pub fn process_text_input(&self, text: &str, source: &str) -> Vec<Document> {
        let document = Document::new(text)
            .with_metadata(SOURCE_KEY, source)
            .with_metadata(TYPE_KEY, "text");
        self.split_documents(&[document])
    }

    /// Splits each document, copying its metadata onto every chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.splitter
                    .split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(move |(i, content)| Document {
                        content,
                        metadata: doc.metadata.clone(),
                    }
                    .with_metadata(CHUNK_KEY, i.to_string()))
            })
            .collect()
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(none)".to_string()
    } else {
        format!(".{}", extension)
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String, ProcessorError> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| ProcessorError::Pdf(e.to_string()))?;

    let cleaned = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");

    // Collapse runs of blank lines left by page breaks.
    let collapsed = match Regex::new(BLANK_RUNS) {
        Ok(re) => re.replace_all(&cleaned, "\n\n").into_owned(),
        Err(_) => cleaned,
    };
    Ok(collapsed.trim().to_string())
}

/// Reads paragraph text from `word/document.xml`, one line per paragraph.
fn extract_docx_text(bytes: &[u8]) -> Result<String, ProcessorError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ProcessorError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ProcessorError::Docx(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ProcessorError::Docx(e.to_string()))?;

    Ok(docx_xml_to_text(&xml))
}

fn docx_xml_to_text(xml: &str) -> String {
    let (paragraph, run_text) = match (Regex::new(DOCX_PARAGRAPH), Regex::new(DOCX_RUN_TEXT)) {
        (Ok(p), Ok(t)) => (p, t),
        _ => return String::new(),
    };

    paragraph
        .captures_iter(xml)
        .map(|p| {
            run_text
                .captures_iter(&p[1])
                .map(|t| unescape_xml(&t[1]))
                .collect::<String>()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
