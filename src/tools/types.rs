use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::export::OutputFormat;

// ============================================================================
// extract_symbols
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractSymbolsArgs {
    /// Path to linker map file
    pub map_path: String,
    /// Case-insensitive substring that symbol names must contain
    #[serde(default)]
    pub filter: Option<String>,
    /// Maximum number of symbols to return (default: all)
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ExtractSymbolsResult {
    pub map_path: String,
    /// First table line (1-based)
    pub start_line: usize,
    /// Line of the closing rule (1-based), 0 when none was found
    pub end_line: usize,
    /// Symbols in the table before filtering
    pub total: usize,
    pub symbols: Vec<SymbolInfo>,
}

// ============================================================================
// export_symbols
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportSymbolsArgs {
    /// Path to linker map file
    pub map_path: String,
    /// Output format: "text", "source_stub" or "spreadsheet" (default: server setting)
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Serialize)]
pub struct ExportSymbolsResult {
    pub map_path: String,
    pub output_path: String,
    pub format: OutputFormat,
    pub symbol_count: usize,
}

// ============================================================================
// lookup_symbol
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LookupSymbolArgs {
    /// Path to linker map file
    pub map_path: String,
    /// Exact symbol name
    pub name: String,
}

// ============================================================================
// Shared types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct SymbolInfo {
    pub name: String,
    pub address: String,
}
