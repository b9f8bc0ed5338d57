//! Table reconstruction for text-only pages.
//!
//! Statement text from a PDF text layer keeps column alignment as runs of
//! spaces. A header line fixes the column label spans; every later line is
//! split on runs of two or more spaces and each piece goes to the label it
//! overlaps most. Amount columns are usually right-aligned, so a cell can
//! start well left of its label while still ending under it.

use bankfusion_core::{Document, Row, Table};
use std::cmp::Reverse;
use tracing::debug;

/// Minimum cells for a line to count as a table header
const MIN_HEADER_CELLS: usize = 3;

/// Split a line on runs of two or more spaces, keeping each cell's start offset
pub fn split_cells(line: &str) -> Vec<(usize, String)> {
    let line = line.replace('\t', "    ");
    let mut cells = Vec::new();
    let mut start: Option<usize> = None;
    let mut spaces = 0;
    let chars: Vec<char> = line.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            spaces += 1;
            if spaces >= 2 {
                if let Some(s) = start.take() {
                    let cell: String = chars[s..i + 1 - spaces].iter().collect();
                    cells.push((s, cell));
                }
            }
        } else {
            if start.is_none() {
                start = Some(i);
            }
            spaces = 0;
        }
    }
    if let Some(s) = start {
        let cell: String = chars[s..].iter().collect();
        cells.push((s, cell.trim_end().to_string()));
    }
    cells
}

fn looks_like_header(cells: &[(usize, String)]) -> bool {
    cells.len() >= MIN_HEADER_CELLS
        && cells
            .iter()
            .any(|(_, c)| c.to_uppercase().contains("DATE"))
}

/// Index of the column for a cell spanning `[start, end)`: the header label
/// it overlaps most, else the label with the nearest edge. Ties go left.
fn column_for(labels: &[(usize, usize)], start: usize, end: usize) -> usize {
    let overlap = |&(s, e): &(usize, usize)| end.min(e).saturating_sub(start.max(s));
    let gap = |&(s, e): &(usize, usize)| {
        if end <= s {
            s - end
        } else {
            start.saturating_sub(e)
        }
    };
    labels
        .iter()
        .enumerate()
        .max_by_key(|(i, label)| (overlap(*label), Reverse(gap(*label)), Reverse(*i)))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn span(offset: usize, cell: &str) -> (usize, usize) {
    (offset, offset + cell.chars().count())
}

/// Rebuild one table from a page's text, if it has a recognizable header.
pub fn table_from_text(text: &str) -> Option<Table> {
    let lines: Vec<&str> = text.lines().collect();
    let header_idx = lines
        .iter()
        .position(|l| looks_like_header(&split_cells(l)))?;
    let header = split_cells(lines[header_idx]);
    let labels: Vec<(usize, usize)> = header.iter().map(|(s, c)| span(*s, c)).collect();

    let mut rows: Vec<Row> = vec![header.into_iter().map(|(_, c)| Some(c)).collect()];
    for line in &lines[header_idx + 1..] {
        let cells = split_cells(line);
        if cells.is_empty() {
            continue;
        }
        let mut row: Row = vec![None; labels.len()];
        for (offset, cell) in cells {
            let (start, end) = span(offset, &cell);
            let col = column_for(&labels, start, end);
            match &mut row[col] {
                Some(existing) => {
                    existing.push(' ');
                    existing.push_str(&cell);
                }
                slot => *slot = Some(cell),
            }
        }
        rows.push(row);
    }
    debug!(rows = rows.len(), columns = labels.len(), "table rebuilt from text");
    Some(Table::new(rows))
}

/// Add reconstructed tables to pages that have text but no tables
pub fn with_layout_tables(mut doc: Document) -> Document {
    for page in doc.pages.iter_mut().filter(|p| p.tables.is_empty()) {
        if let Some(table) = table_from_text(&page.text) {
            page.tables.push(table);
        }
    }
    doc
}
