//! Extracted document model: pages of text plus any tables recovered from them

use serde::{Deserialize, Serialize};

/// A table row; `None` marks an empty cell.
pub type Row = Vec<Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// One statement document as delivered by the upstream text extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source name (usually the file stem); used for filename-based holder fallback
    #[serde(default)]
    pub name: String,
    pub pages: Vec<Page>,
}

impl Document {
    /// Build a text-only document. Form feeds separate pages.
    pub fn from_text(name: impl Into<String>, text: &str) -> Self {
        let pages = text
            .split('\u{c}')
            .filter(|p| !p.trim().is_empty())
            .map(|p| Page {
                text: p.to_string(),
                tables: Vec::new(),
            })
            .collect();
        Self {
            name: name.into(),
            pages,
        }
    }

    /// All page text joined by newlines
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Text of the first `n` pages
    pub fn leading_text(&self, n: usize) -> String {
        self.pages
            .iter()
            .take(n)
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.pages.iter().flat_map(|p| p.tables.iter())
    }

    /// Tables on the first `n` pages
    pub fn leading_tables(&self, n: usize) -> impl Iterator<Item = &Table> {
        self.pages.iter().take(n).flat_map(|p| p.tables.iter())
    }

    pub fn has_tables(&self) -> bool {
        self.tables().any(|t| !t.is_empty())
    }
}

/// Render a cell as trimmed text
pub fn cell_text(row: &Row, idx: Option<usize>) -> &str {
    idx.and_then(|i| row.get(i))
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .unwrap_or("")
}
