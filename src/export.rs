//! Writers for extracted symbol tables and the one-call `parse` entry point.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::map_file::{self, ExtractorConfig, SymbolMap};

pub const HEADER_NAME: &str = "Variable Name";
pub const HEADER_ADDRESS: &str = "Hexadecimal Value";

/// Extra characters added to the longest cell of a spreadsheet column.
const COLUMN_MARGIN: usize = 2;

pub const TEMPLATE_SOURCE_STUB: &str = r#"
class MapVariables:
    def __init__(self):
{{ASSIGNMENTS}}
"#;

/// Output formats for an extracted symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum OutputFormat {
    /// `name: address` lines
    Text,
    /// Python class with one attribute per symbol
    SourceStub,
    /// Two-column xlsx workbook
    Spreadsheet,
}

impl OutputFormat {
    /// Suffix appended to the input file stem.
    pub fn suffix(&self) -> &'static str {
        match self {
            OutputFormat::Text => "_variables.txt",
            OutputFormat::SourceStub => "_variables.py",
            OutputFormat::Spreadsheet => "_variables.xlsx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::SourceStub => "source_stub",
            OutputFormat::Spreadsheet => "spreadsheet",
        };
        f.write_str(name)
    }
}

/// Input path with its extension replaced by the format suffix,
/// e.g. `build/app.map` -> `build/app_variables.txt`.
pub fn output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let mut path: OsString = input.with_extension("").into_os_string();
    path.push(format.suffix());
    PathBuf::from(path)
}

pub fn render_text(symbols: &SymbolMap) -> String {
    symbols
        .iter()
        .map(|(name, address)| format!("{}: {}\n", name, address))
        .collect()
}

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break",
    "class", "continue", "def", "del", "elif", "else", "except", "finally", "for",
    "from", "global", "if", "import", "in", "is", "lambda", "nonlocal", "not",
    "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Turn a symbol name into a Python attribute name: characters outside
/// `[A-Za-z0-9_]` become `_`, a leading digit gets a `_` prefix and keywords
/// get a `_` suffix. `.text` -> `_text`, `foo::bar` -> `foo__bar`.
pub fn python_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if PYTHON_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

pub fn render_source_stub(symbols: &SymbolMap) -> String {
    let assignments = if symbols.is_empty() {
        "        pass".to_string()
    } else {
        symbols
            .iter()
            .map(|(name, address)| format!("        self.{} = '{}'", python_identifier(name), address))
            .collect::<Vec<_>>()
            .join("\n")
    };
    TEMPLATE_SOURCE_STUB.replace("{{ASSIGNMENTS}}", &assignments)
}

/// Width of each spreadsheet column: longest cell (header included) plus a margin.
pub fn column_widths(symbols: &SymbolMap) -> [f64; 2] {
    let name_len = symbols
        .keys()
        .map(|k| k.chars().count())
        .chain(std::iter::once(HEADER_NAME.len()))
        .max()
        .unwrap_or(0);
    let address_len = symbols
        .values()
        .map(|v| v.chars().count())
        .chain(std::iter::once(HEADER_ADDRESS.len()))
        .max()
        .unwrap_or(0);

    [(name_len + COLUMN_MARGIN) as f64, (address_len + COLUMN_MARGIN) as f64]
}

pub fn write_spreadsheet(symbols: &SymbolMap, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string_with_format(0, 0, HEADER_NAME, &bold)?;
    worksheet.write_string_with_format(0, 1, HEADER_ADDRESS, &bold)?;

    for (row, (name, address)) in (1u32..).zip(symbols.iter()) {
        worksheet.write_string(row, 0, name.as_str())?;
        worksheet.write_string(row, 1, address.as_str())?;
    }

    let [name_width, address_width] = column_widths(symbols);
    worksheet.set_column_width(0, name_width)?;
    worksheet.set_column_width(1, address_width)?;

    workbook.save(path)?;
    Ok(())
}

/// Write `symbols` next to `input` in the given format and return the output path.
pub fn export(symbols: &SymbolMap, input: &Path, format: OutputFormat) -> Result<PathBuf> {
    let out = output_path(input, format);
    match format {
        OutputFormat::Text => std::fs::write(&out, render_text(symbols))?,
        OutputFormat::SourceStub => std::fs::write(&out, render_source_stub(symbols))?,
        OutputFormat::Spreadsheet => write_spreadsheet(symbols, &out)?,
    }
    info!("Wrote {} symbols as {} to {}", symbols.len(), format, out.display());
    Ok(out)
}

/// Extract the symbol table from a map file and export it.
pub fn parse(path: &Path, format: OutputFormat, config: &ExtractorConfig) -> Result<PathBuf> {
    let extraction = map_file::extract_file(path, config)?;
    export(&extraction.symbols, path, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Read one part of an xlsx (zip) container as text.
    fn read_xlsx_part(path: &Path, part: &str) -> String {
        use std::io::Read;
        let file = std::fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(part).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    /// Assert every `needle` occurs in `haystack`, in the given order.
    fn assert_in_order(haystack: &str, needles: &[&str]) {
        let mut from = 0;
        for needle in needles {
            let pos = haystack[from..]
                .find(needle)
                .unwrap_or_else(|| panic!("{} missing or out of order", needle));
            from += pos + needle.len();
        }
    }

    fn sample_symbols() -> SymbolMap {
        let mut map = SymbolMap::new();
        map.insert("foo_var".to_string(), "0x00001000".to_string());
        map.insert("a_much_longer_symbol_name".to_string(), "1a2b000000".to_string());
        map
    }

    const SAMPLE_MAP: &str = "\
header
sorted on address
h1
h2
h3
h4
h5
h6
| 0x00001000 | foo_var |
| 0x2000 | bar_var |
+---
";

    #[test]
    fn test_output_path_replaces_extension() {
        let input = Path::new("/tmp/build/app.map");
        assert_eq!(output_path(input, OutputFormat::Text), PathBuf::from("/tmp/build/app_variables.txt"));
        assert_eq!(output_path(input, OutputFormat::SourceStub), PathBuf::from("/tmp/build/app_variables.py"));
        assert_eq!(output_path(input, OutputFormat::Spreadsheet), PathBuf::from("/tmp/build/app_variables.xlsx"));
    }

    #[test]
    fn test_output_path_without_extension() {
        let input = Path::new("firmware");
        assert_eq!(output_path(input, OutputFormat::Text), PathBuf::from("firmware_variables.txt"));
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_symbols());
        assert_eq!(text, "foo_var: 0x00001000\na_much_longer_symbol_name: 1a2b000000\n");
    }

    #[test]
    fn test_render_source_stub() {
        let stub = render_source_stub(&sample_symbols());
        assert!(stub.contains("class MapVariables:"));
        assert!(stub.contains("    def __init__(self):"));
        let foo = stub.find("        self.foo_var = '0x00001000'").unwrap();
        let longer = stub.find("        self.a_much_longer_symbol_name = '1a2b000000'").unwrap();
        assert!(foo < longer);
    }

    #[test]
    fn test_render_source_stub_exact_layout() {
        let stub = render_source_stub(&sample_symbols());
        assert_eq!(
            stub,
            "\nclass MapVariables:\n    def __init__(self):\n        \
             self.foo_var = '0x00001000'\n        \
             self.a_much_longer_symbol_name = '1a2b000000'\n"
        );
    }

    #[test]
    fn test_python_identifier() {
        assert_eq!(python_identifier("foo_var"), "foo_var");
        assert_eq!(python_identifier(".text"), "_text");
        assert_eq!(python_identifier("foo::bar"), "foo__bar");
        assert_eq!(python_identifier("my var"), "my_var");
        assert_eq!(python_identifier("1st_entry"), "_1st_entry");
        assert_eq!(python_identifier("class"), "class_");
        assert_eq!(python_identifier(""), "_");
    }

    #[test]
    fn test_render_source_stub_sanitizes_names() {
        let mut map = SymbolMap::new();
        map.insert(".bss".to_string(), "0x20000000".to_string());
        map.insert("ns::counter".to_string(), "0x20000004".to_string());
        let stub = render_source_stub(&map);
        assert!(stub.contains("        self._bss = '0x20000000'\n"));
        assert!(stub.contains("        self.ns__counter = '0x20000004'\n"));
    }

    #[test]
    fn test_render_source_stub_empty() {
        let stub = render_source_stub(&SymbolMap::new());
        assert!(stub.contains("        pass"));
        assert!(!stub.contains("{{"));
    }

    #[test]
    fn test_column_widths() {
        let [name, address] = column_widths(&sample_symbols());
        assert_eq!(name, 27.0); // "a_much_longer_symbol_name" + 2
        assert_eq!(address, 19.0); // header is the longest cell
    }

    #[test]
    fn test_column_widths_empty_uses_headers() {
        assert_eq!(column_widths(&SymbolMap::new()), [15.0, 19.0]);
    }

    #[test]
    fn test_export_text() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("app.map");
        let out = export(&sample_symbols(), &input, OutputFormat::Text).unwrap();
        assert_eq!(out, dir.path().join("app_variables.txt"));
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("foo_var: 0x00001000\n"));
    }

    #[test]
    fn test_export_spreadsheet() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("app.map");
        let out = export(&sample_symbols(), &input, OutputFormat::Spreadsheet).unwrap();
        let bytes = std::fs::read(&out).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_write_spreadsheet_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fw_variables.xlsx");
        let mut map = SymbolMap::new();
        map.insert("zeta".to_string(), "0x10000000".to_string());
        map.insert("alpha_long_name".to_string(), "0x20000000".to_string());
        write_spreadsheet(&map, &path).unwrap();

        let strings = read_xlsx_part(&path, "xl/sharedStrings.xml");
        assert_in_order(&strings, &[
            "<t>Variable Name</t>",
            "<t>Hexadecimal Value</t>",
            "<t>zeta</t>",
            "<t>0x10000000</t>",
            "<t>alpha_long_name</t>",
            "<t>0x20000000</t>",
        ]);

        let sheet = read_xlsx_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"<dimension ref="A1:B3"/>"#));
        // header row carries the bold format
        assert!(sheet.contains(r#"r="A1" s="1""#));
        assert!(sheet.contains(r#"r="B1" s="1""#));
        // "alpha_long_name" + 2 and "Hexadecimal Value" + 2
        assert!(sheet.contains(r#"<col min="1" max="1" width="17.71"#));
        assert!(sheet.contains(r#"<col min="2" max="2" width="19.71"#));
    }

    #[test]
    fn test_parse_end_to_end() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("fw.map");
        std::fs::write(&input, SAMPLE_MAP).unwrap();

        let out = parse(&input, OutputFormat::Text, &ExtractorConfig::default()).unwrap();
        let content = std::fs::read_to_string(out).unwrap();
        assert_eq!(content, "foo_var: 0x00001000\nbar_var: 0x20000000\n");
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse(Path::new("/nonexistent/fw.map"), OutputFormat::Text, &ExtractorConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_format_display_matches_serde() {
        for format in [OutputFormat::Text, OutputFormat::SourceStub, OutputFormat::Spreadsheet] {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format));
        }
    }
}
