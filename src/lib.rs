//! Map Symbols MCP Server
//!
//! Extracts symbol-to-address tables from linker map files and exports them
//! as a text listing, a Python source stub, or a spreadsheet.

pub mod config;
pub mod error;
pub mod export;
pub mod map_file;
pub mod tools;

pub use config::Config;
pub use error::{MapError, Result};
pub use export::{parse, OutputFormat};
pub use map_file::{ExtractorConfig, SymbolMap, TableSpan};
pub use tools::MapSymbolsToolHandler;
