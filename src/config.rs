//! Configuration for the map-symbols MCP server

use std::path::PathBuf;
use clap::Parser;

use crate::export::OutputFormat;
use crate::map_file::{ExtractorConfig, DEFAULT_ADDRESS_WIDTH, DEFAULT_HEADER_SKIP, DEFAULT_START_MARKER};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "map-symbols")]
#[command(about = "MCP server for extracting symbol addresses from linker map files")]
#[command(version)]
pub struct Args {
    /// Export a single map file and exit instead of serving MCP over stdio
    #[arg(long, value_name = "MAP")]
    pub export: Option<PathBuf>,

    /// Output format for --export (defaults to --default-format)
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Output format used when a request does not name one
    #[arg(long, value_enum, default_value_t = OutputFormat::SourceStub)]
    pub default_format: OutputFormat,

    /// Text marking the heading of the address-sorted symbol table
    #[arg(long, default_value = DEFAULT_START_MARKER)]
    pub start_marker: String,

    /// Lines between the table heading and the first symbol row
    #[arg(long, default_value_t = DEFAULT_HEADER_SKIP)]
    pub header_skip: usize,

    /// Width addresses are right-padded to with '0'
    #[arg(long, default_value_t = DEFAULT_ADDRESS_WIDTH)]
    pub address_width: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct Config {
    pub extractor: ExtractorConfig,
    pub default_format: OutputFormat,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            extractor: ExtractorConfig {
                start_marker: args.start_marker.clone(),
                header_skip: args.header_skip,
                address_width: args.address_width,
            },
            default_format: args.default_format,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            default_format: OutputFormat::SourceStub,
        }
    }
}
