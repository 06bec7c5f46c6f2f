use rmcp::{
    tool, tool_router, tool_handler, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    ErrorData as McpError,
};
use serde::Serialize;
use tracing::info;
use std::future::Future;
use std::path::{Path, PathBuf};

use super::types::*;
use crate::config::Config;
use crate::error::MapError;
use crate::export;
use crate::map_file::{self, MapExtraction};

#[derive(Clone)]
pub struct MapSymbolsToolHandler {
    #[allow(dead_code)]
    tool_router: ToolRouter<MapSymbolsToolHandler>,
    config: Config,
}

impl MapSymbolsToolHandler {
    pub fn new(config: Config) -> Self {
        Self {
            tool_router: Self::tool_router(),
            config,
        }
    }

    /// Validate that a map file exists.
    fn validate_map(path: &str) -> Result<PathBuf, McpError> {
        let p = PathBuf::from(path);
        if !p.exists() {
            return Err(McpError::invalid_params(
                format!("Map file not found: {}", path),
                None,
            ));
        }
        Ok(p)
    }

    fn extract(&self, map_path: &Path) -> Result<MapExtraction, McpError> {
        map_file::extract_file(map_path, &self.config.extractor).map_err(to_mcp_error)
    }
}

impl Default for MapSymbolsToolHandler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn to_mcp_error(e: MapError) -> McpError {
    match e {
        MapError::FileNotFound(_) => McpError::invalid_params(e.to_string(), None),
        _ => McpError::internal_error(e.to_string(), None),
    }
}

fn json_result<T: Serialize>(result: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[tool_router]
impl MapSymbolsToolHandler {
    #[tool(description = "Extract the address-sorted symbol table from a linker map file. Returns symbol names with their zero-padded hex addresses in table order.")]
    async fn extract_symbols(&self, Parameters(args): Parameters<ExtractSymbolsArgs>) -> Result<CallToolResult, McpError> {
        let map_path = Self::validate_map(&args.map_path)?;
        info!("extract_symbols: {}", map_path.display());

        let extraction = self.extract(&map_path)?;
        let total = extraction.symbols.len();
        let filter = args.filter.as_deref().map(str::to_lowercase);
        let limit = args.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        let symbols: Vec<SymbolInfo> = extraction.symbols.into_iter()
            .filter(|(name, _)| match &filter {
                Some(f) => name.to_lowercase().contains(f.as_str()),
                None => true,
            })
            .take(limit)
            .map(|(name, address)| SymbolInfo { name, address })
            .collect();

        let span = extraction.span;
        let result = ExtractSymbolsResult {
            map_path: args.map_path,
            start_line: span.start + 1,
            end_line: if span.end == 0 { 0 } else { span.end + 1 },
            total,
            symbols,
        };

        json_result(&result)
    }

    #[tool(description = "Export the symbol table of a linker map file next to it as a text listing (_variables.txt), Python source stub (_variables.py) or spreadsheet (_variables.xlsx).")]
    async fn export_symbols(&self, Parameters(args): Parameters<ExportSymbolsArgs>) -> Result<CallToolResult, McpError> {
        let map_path = Self::validate_map(&args.map_path)?;
        let format = args.format.unwrap_or(self.config.default_format);
        info!("export_symbols: {} format={}", map_path.display(), format);

        let extraction = self.extract(&map_path)?;
        let output_path = export::export(&extraction.symbols, &map_path, format)
            .map_err(to_mcp_error)?;

        let result = ExportSymbolsResult {
            map_path: args.map_path,
            output_path: output_path.display().to_string(),
            format,
            symbol_count: extraction.symbols.len(),
        };

        json_result(&result)
    }

    #[tool(description = "Look up the address of a single symbol in a linker map file.")]
    async fn lookup_symbol(&self, Parameters(args): Parameters<LookupSymbolArgs>) -> Result<CallToolResult, McpError> {
        let map_path = Self::validate_map(&args.map_path)?;
        info!("lookup_symbol: {} name={}", map_path.display(), args.name);

        let mut extraction = self.extract(&map_path)?;
        let address = extraction.symbols.swap_remove(&args.name).ok_or_else(|| {
            McpError::invalid_params(
                format!("Symbol '{}' not found in {}", args.name, args.map_path),
                None,
            )
        })?;

        json_result(&SymbolInfo { name: args.name, address })
    }
}

#[tool_handler]
impl ServerHandler for MapSymbolsToolHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Map Symbols MCP Server - Extract symbol addresses from linker map files. \
                 3 tools available: extract_symbols, export_symbols, lookup_symbol.".to_string()
            ),
        }
    }
}
