//! Turns a file on disk into a [`Document`]

use bankfusion_core::{Document, ExtractionError};
use std::fs;
use std::path::Path;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "json", "txt"];

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "statement".to_string())
}

/// Read a PDF text layer, a pre-extracted JSON document, or plain text
pub fn load_document(path: &Path) -> Result<Document, ExtractionError> {
    let stem = document_stem(path);
    let unreadable = |e: String| ExtractionError::Unreadable(format!("{}: {e}", path.display()));
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let doc = match ext.as_str() {
        "pdf" => {
            let text = pdf_extract::extract_text(path).map_err(|e| unreadable(e.to_string()))?;
            Document::from_text(stem, &text)
        }
        "json" => {
            let raw = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
            let mut doc: Document = serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))?;
            if doc.name.is_empty() {
                doc.name = stem;
            }
            doc
        }
        "txt" => {
            let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
            Document::from_text(stem, &text)
        }
        other => return Err(unreadable(format!("unsupported extension '{other}'"))),
    };

    if doc.pages.is_empty() {
        return Err(unreadable("no text layer".into()));
    }
    Ok(doc)
}
