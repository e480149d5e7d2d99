use lazy_static::lazy_static;
use log::debug;
use lopdf::{Dictionary, Document, Object, StringFormat};
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::panic::{self, UnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_KEYPHRASE: &str = "No keyphrase";

lazy_static! {
    static ref CREATION_YEAR: Regex = Regex::new(r"D:(\d{4})").expect("valid creation date regex");
    static ref PANIC_HOOK: Mutex<()> = Mutex::new(());
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF parse error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Text extraction failed: {0}")]
    Extraction(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    pub path: PathBuf,
    pub filename: String,
    pub title: String,
    pub author: String,
    pub year: String,
    pub subject: String,
    pub text: String,
    pub topics: Vec<String>,
    pub main_keyphrase: String,
    pub doi: String,
}

impl Default for Paper {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            filename: String::new(),
            title: String::new(),
            author: String::new(),
            year: String::new(),
            subject: String::new(),
            text: String::new(),
            topics: Vec::new(),
            main_keyphrase: DEFAULT_KEYPHRASE.to_string(),
            doi: String::new(),
        }
    }
}

impl Paper {
    /// Read a PDF from disk, pulling the information dictionary and the text of every page.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;

        let document = Document::load_mem(&bytes)?;
        let info = info_dictionary(&document);
        let field = |key: &[u8]| {
            info.map(|dict| info_string(&document, dict, key))
                .unwrap_or_default()
        };

        let title = field(b"Title");
        let author = field(b"Author");
        let subject = field(b"Subject");
        let year = creation_year(&field(b"CreationDate"));

        let text = extract_text(&bytes)?;

        Ok(Self {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            title,
            author,
            year,
            subject,
            text,
            ..Self::default()
        })
    }
}

fn extract_text(bytes: &[u8]) -> Result<String, DocumentError> {
    // pdf-extract panics on some malformed content streams
    match catch_quietly(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(DocumentError::Extraction(e.to_string())),
        Err(_) => Err(DocumentError::Extraction(
            "text extractor aborted on malformed content".to_string(),
        )),
    }
}

/// Run `f`, catching a panic without the default hook printing over the prompt.
/// The panic message goes to the debug log instead.
fn catch_quietly<T>(f: impl FnOnce() -> T + UnwindSafe) -> std::thread::Result<T> {
    let _guard = PANIC_HOOK.lock();
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| debug!("Text extraction panicked: {}", info)));
    let result = panic::catch_unwind(f);
    panic::set_hook(previous);
    result
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

fn info_dictionary(document: &Document) -> Option<&Dictionary> {
    let info = document.trailer.get(b"Info").ok()?;
    resolve(document, info)?.as_dict().ok()
}

fn info_string(document: &Document, dict: &Dictionary, key: &[u8]) -> String {
    match dict.get(key).ok().and_then(|value| resolve(document, value)) {
        Some(Object::String(bytes, _)) => decode_pdf_string(bytes),
        Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
        _ => String::new(),
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 when it carries a byte order mark,
/// otherwise PDFDocEncoding.
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    let decoded = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        let literal = Object::String(bytes.to_vec(), StringFormat::Literal);
        lopdf::decode_text_string(&literal)
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned())
    };

    decoded.trim_end_matches('\0').to_string()
}

/// First four digits after `D:` in a PDF date string.
pub fn creation_year(date: &str) -> String {
    CREATION_YEAR
        .captures(date)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
