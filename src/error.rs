//! Error types for the map-symbols MCP server

use thiserror::Error;

/// Main error type for map file extraction and export
#[derive(Error, Debug)]
pub enum MapError {
    #[error("Map file not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MapError>;
