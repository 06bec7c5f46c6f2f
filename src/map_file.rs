//! Linker map symbol table extraction.
//!
//! The map report carries an address-sorted symbol table introduced by a
//! `sorted on address` heading, a fixed block of column headers, pipe-delimited
//! rows and a closing `+---` rule. Everything outside that span is ignored.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::error::{MapError, Result};

/// Symbol name -> padded hex address, in first-seen order.
pub type SymbolMap = IndexMap<String, String>;

pub const DEFAULT_START_MARKER: &str = "sorted on address";
pub const DEFAULT_HEADER_SKIP: usize = 7;
pub const DEFAULT_ADDRESS_WIDTH: usize = 10;

/// Closing rule of the symbol table.
const TABLE_END_MARKER: &str = "+---";

macro_rules! static_regex {
    ($name:ident, $str:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($str).unwrap());
    };
}

// | 0x00001000 | some_symbol |
static_regex!(ROW_RE, r"^\s*\|\s*([0-9a-fA-Fx]+)\s*\|\s*([^|]+)\s*\|");
// \r\n, lone \r and \n all end a line
static_regex!(LINE_BREAK_RE, r"\r\n|\r|\n");

/// Dialect constants for the map table layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Substring identifying the heading of the address-sorted table
    pub start_marker: String,
    /// Lines between the heading and the first data row
    pub header_skip: usize,
    /// Addresses shorter than this are right-padded with '0'
    pub address_width: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            start_marker: DEFAULT_START_MARKER.to_string(),
            header_skip: DEFAULT_HEADER_SKIP,
            address_width: DEFAULT_ADDRESS_WIDTH,
        }
    }
}

/// Half-open line range `[start, end)` holding the table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpan {
    pub start: usize,
    pub end: usize,
}

impl TableSpan {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Result of extracting a map file on disk.
#[derive(Debug, Clone)]
pub struct MapExtraction {
    pub span: TableSpan,
    pub symbols: SymbolMap,
}

/// Find the table span. A missing heading starts the scan at line 0; a
/// missing closing rule yields `end == 0`.
pub fn locate_span<S: AsRef<str>>(lines: &[S], config: &ExtractorConfig) -> TableSpan {
    let start = lines
        .iter()
        .position(|l| l.as_ref().contains(config.start_marker.as_str()))
        .map(|i| i.saturating_add(config.header_skip))
        .unwrap_or(0);

    let end = (start..lines.len())
        .find(|&i| lines[i].as_ref().contains(TABLE_END_MARKER))
        .unwrap_or(0);

    TableSpan { start, end }
}

/// Split a report into lines. A trailing line break does not start an empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = LINE_BREAK_RE.split(text).collect();
    if lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Right-pad `raw` with '0' up to `width` characters. Longer input is kept whole.
pub fn pad_address(raw: &str, width: usize) -> String {
    format!("{:0<width$}", raw, width = width)
}

/// Parse one table row into `(name, raw_address)`.
fn parse_row(line: &str) -> Option<(&str, &str)> {
    let caps = ROW_RE.captures(line)?;
    let address = caps.get(1)?.as_str();
    let name = caps.get(2)?.as_str().trim();
    Some((name, address))
}

/// Extract the symbol table from the lines of a map report.
pub fn extract<S: AsRef<str>>(lines: &[S], config: &ExtractorConfig) -> SymbolMap {
    let span = locate_span(lines, config);
    extract_span(lines, span, config)
}

fn extract_span<S: AsRef<str>>(lines: &[S], span: TableSpan, config: &ExtractorConfig) -> SymbolMap {
    let mut symbols = SymbolMap::new();
    if span.is_empty() {
        debug!("Symbol table span is empty ({}..{})", span.start, span.end);
        return symbols;
    }

    for line in &lines[span.start..span.end] {
        if let Some((name, address)) = parse_row(line.as_ref()) {
            symbols.insert(name.to_string(), pad_address(address, config.address_width));
        }
    }

    debug!("Extracted {} symbols from lines {}..{}", symbols.len(), span.start, span.end);
    symbols
}

/// Convenience wrapper over [`extract`] for a whole report held as text.
pub fn extract_str(text: &str, config: &ExtractorConfig) -> SymbolMap {
    let lines = split_lines(text);
    extract(&lines, config)
}

/// Read a whole map report. Invalid UTF-8 is replaced rather than rejected.
pub fn read_report(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(MapError::FileNotFound(path.display().to_string()));
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read and extract a map file.
pub fn extract_file(path: &Path, config: &ExtractorConfig) -> Result<MapExtraction> {
    let text = read_report(path)?;
    let lines = split_lines(&text);
    let span = locate_span(&lines, config);
    let symbols = extract_span(&lines, span, config);
    Ok(MapExtraction { span, symbols })
}
