//! Map symbols MCP tools module
//!
//! This module provides the tool handler that exposes map table extraction
//! and export using the RMCP 0.3.2 API patterns.

pub mod handler;
pub mod types;

pub use handler::*;
pub use types::*;
