//! Runs the stages in order and collects what went wrong along the way.
//!
//! Parse, lookup, derive, normalize and format problems never abort a run:
//! each becomes a [`Notice`] and the stage's input is carried forward.
//! Only a failed export ends the run with an error.

use crate::combine::{combine_tables, with_provenance};
use crate::config::PipelineConfig;
use crate::describe::derive_description;
use crate::display::format_for_display;
use crate::error::{ExportError, FormatError, JoinError};
use crate::export::{export_workbook, ExportArtifact};
use crate::join::join_reference;
use crate::normalize::normalize_accounts;
use crate::parser::{parse_source, ParseOptions, SourceFile};
use crate::reference::load_reference;
use crate::table::Table;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use tracing::{info, warn};

/// Why a stage left its input unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoReference,
    MissingColumns(Vec<String>),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoReference => f.write_str("no lookup file was provided"),
            SkipReason::MissingColumns(cols) => {
                write!(f, "missing column(s): {}", cols.join(", "))
            }
        }
    }
}

/// Result of one table-to-table stage.
#[derive(Debug)]
pub enum StageOutcome<E = Infallible> {
    Applied(Table),
    Skipped(SkipReason),
    Failed(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => f.write_str("info"),
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Join,
    Derive,
    Normalize,
    Format,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::Join => "lookup",
            Stage::Derive => "description",
            Stage::Normalize => "account",
            Stage::Format => "format",
        };
        f.write_str(name)
    }
}

/// A user-facing message produced while running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub stage: Stage,
    /// File the notice is about, when there is one.
    pub source: Option<String>,
    pub message: String,
}

impl Notice {
    fn new(severity: Severity, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            severity,
            stage,
            source: None,
            message: message.into(),
        }
    }

    fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.stage)?;
        if let Some(source) = &self.source {
            write!(f, " {}:", source)?;
        }
        write!(f, " {}", self.message)
    }
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Final table with numeric monetary columns; this is what was exported.
    pub table: Table,
    /// Copy of `table` with grouped monetary strings, for showing to the user.
    pub display: Table,
    pub artifact: ExportArtifact,
    pub notices: Vec<Notice>,
}

impl PipelineOutput {
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(|n| n.severity == Severity::Error)
    }
}

/// One invocation: the uploaded text files, an optional lookup workbook
/// and the configuration to run them with.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
    sources: Vec<SourceFile>,
    reference: Option<SourceFile>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            reference: None,
        }
    }

    pub fn with_sources(mut self, sources: Vec<SourceFile>) -> Self {
        self.sources = sources;
        self
    }

    pub fn add_source(&mut self, source: SourceFile) {
        self.sources.push(source);
    }

    pub fn with_reference(mut self, reference: SourceFile) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn run(self) -> Result<PipelineOutput, ExportError> {
        let mut notices = Vec::new();
        info!(
            sources = self.sources.len(),
            reference = self.reference.is_some(),
            "starting pipeline"
        );

        let combined = self.parse_and_combine(&mut notices);
        let joined = self.apply_reference(combined, &mut notices);

        let derived = match derive_description(&joined) {
            StageOutcome::Applied(table) => table,
            StageOutcome::Skipped(reason) => {
                notices.push(Notice::new(
                    Severity::Info,
                    Stage::Derive,
                    format!("descriptions not added: {}", reason),
                ));
                joined
            }
            StageOutcome::Failed(never) => match never {},
        };

        let table = match normalize_accounts(&derived) {
            StageOutcome::Applied(table) => table,
            StageOutcome::Skipped(reason) => {
                notices.push(Notice::new(
                    Severity::Info,
                    Stage::Normalize,
                    format!("account codes not normalized: {}", reason),
                ));
                derived
            }
            StageOutcome::Failed(never) => match never {},
        };

        let display = format_for_display(&table, &self.config.export.money_columns);
        notices.extend(format_notices(&display.format_errors));

        let artifact = export_workbook(&table, &self.config.export)?;
        info!(
            rows = table.height(),
            notices = notices.len(),
            file = %artifact.file_name,
            "pipeline finished"
        );

        Ok(PipelineOutput {
            table,
            display: display.table,
            artifact,
            notices,
        })
    }

    /// Parse every source independently; a file that fails is reported and
    /// left out, the rest are combined in upload order.
    fn parse_and_combine(&self, notices: &mut Vec<Notice>) -> Table {
        let options = match ParseOptions::try_from(&self.config.input) {
            Ok(options) => options,
            Err(err) => {
                warn!(error = %err, "no source can be parsed");
                notices.push(Notice::new(
                    Severity::Error,
                    Stage::Parse,
                    format!("Error reading uploaded files: {}", err),
                ));
                return combine_tables(Vec::new());
            }
        };
        let mut parsed = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match parse_source(source, &options) {
                Ok(table) => parsed.push(with_provenance(table, &source.name)),
                Err(err) => {
                    warn!(source = %source.name, error = %err, "skipping unreadable source");
                    notices.push(
                        Notice::new(
                            Severity::Error,
                            Stage::Parse,
                            format!("Error reading {}: {}", source.name, err),
                        )
                        .with_source(source.name.clone()),
                    );
                }
            }
        }

        combine_tables(parsed)
    }

    fn apply_reference(&self, table: Table, notices: &mut Vec<Notice>) -> Table {
        match self.lookup(&table) {
            StageOutcome::Applied(joined) => joined,
            StageOutcome::Skipped(reason) => {
                notices.push(Notice::new(
                    Severity::Info,
                    Stage::Join,
                    format!("accounts not looked up: {}", reason),
                ));
                table
            }
            StageOutcome::Failed(err) => {
                warn!(error = %err, "lookup failed, continuing without accounts");
                let mut notice = Notice::new(
                    Severity::Error,
                    Stage::Join,
                    format!("Error processing lookup file: {}", err),
                );
                if let Some(reference) = &self.reference {
                    notice = notice.with_source(reference.name.clone());
                }
                notices.push(notice);
                table
            }
        }
    }

    fn lookup(&self, table: &Table) -> StageOutcome<JoinError> {
        let Some(reference) = &self.reference else {
            return StageOutcome::Skipped(SkipReason::NoReference);
        };
        let result = load_reference(reference, &self.config.reference)
            .and_then(|lookup| join_reference(table, &lookup));
        match result {
            Ok(joined) => StageOutcome::Applied(joined),
            Err(err) => StageOutcome::Failed(err),
        }
    }
}

/// One warning per column, naming the first bad value and how many there were.
fn format_notices(errors: &[FormatError]) -> Vec<Notice> {
    let mut by_column: BTreeMap<&str, Vec<&FormatError>> = BTreeMap::new();
    for err in errors {
        by_column.entry(err.column.as_str()).or_default().push(err);
    }
    by_column
        .into_iter()
        .map(|(column, errs)| {
            let first = errs[0];
            let message = if errs.len() == 1 {
                format!("could not format {}", first)
            } else {
                format!(
                    "could not format {} value(s) in '{}', first at {}",
                    errs.len(),
                    column,
                    first
                )
            };
            Notice::new(Severity::Warning, Stage::Format, message)
        })
        .collect()
}
