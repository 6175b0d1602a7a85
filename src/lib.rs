//! Combines pipe-delimited stamp duty exports into one Excel workbook.
//!
//! Text exports are parsed, concatenated and renumbered, optionally joined to
//! an SID → Account lookup workbook, given a "Description" column and
//! normalized account codes, then written to a "CombinedData" sheet.

pub mod combine;
pub mod config;
pub mod describe;
pub mod display;
pub mod error;
pub mod error_display;
pub mod export;
pub mod join;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod preview;
pub mod reference;
pub mod table;

pub use config::{ConfigManager, PipelineConfig};
pub use error::{ExportError, FormatError, InvalidDelimiter, JoinError, ParseError};
pub use export::{export_workbook, plan_columns, ColumnLayout, ExportArtifact};
pub use parser::{parse_source, ParseOptions, SourceFile};
pub use pipeline::{Notice, Pipeline, PipelineOutput, Severity, SkipReason, Stage, StageOutcome};
pub use table::{Cell, Column, Table};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "materai";
