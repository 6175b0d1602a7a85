//! Shared CLI definitions for materai.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};
use std::path::{Path, PathBuf};

/// Spreadsheet formats accepted for the SID/Account reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook (.xlsx, .xlsm)
    Xlsx,
    /// Legacy Excel workbook (.xls)
    Xls,
    /// Excel binary workbook (.xlsb)
    Xlsb,
    /// OpenDocument spreadsheet (.ods)
    Ods,
}

impl SpreadsheetFormat {
    /// Detect spreadsheet format from path extension. Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "xlsx", "xls").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::Xls),
            "xlsb" => Some(Self::Xlsb),
            "ods" => Some(Self::Ods),
            _ => None,
        }
    }
}

/// Command-line arguments for materai
#[derive(Clone, Parser, Debug)]
#[command(
    name = "materai",
    version,
    about = "Combine pipe-delimited stamp duty exports into one Excel workbook"
)]
pub struct Args {
    /// Pipe-delimited text export(s) to combine, in order.
    /// Rows keep file order, then in-file order.
    #[arg(num_args = 0.., value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Excel lookup file with `SID` and `Account` columns
    #[arg(short = 'r', long = "reference", value_name = "PATH")]
    pub reference: Option<PathBuf>,

    /// Where to write the combined workbook (default: combined_data.xlsx from config)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Read configuration from this file instead of the user config directory
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Do not print the formatted preview table
    #[arg(long = "no-preview", action)]
    pub no_preview: bool,

    /// Number of rows to show in the preview (default: 50)
    #[arg(long = "preview-rows", value_name = "N")]
    pub preview_rows: Option<usize>,

    /// Log stage progress to stderr (RUST_LOG overrides)
    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,

    /// Write the default configuration to the user config directory and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing config file (with --generate-config)
    #[arg(long = "force", action, requires = "generate_config")]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            format!("[{placeholder}]...")
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if arg.get_action().takes_values() && !placeholder.is_empty() {
                format!("{op} {placeholder}")
            } else {
                op
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}
