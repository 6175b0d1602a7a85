//! User-facing error message formatting.
//!
//! Uses typed error matching (PolarsError variants, calamine errors,
//! io::ErrorKind) rather than Debug output to produce short, actionable
//! messages for notices.

use polars::prelude::PolarsError;
use std::io;

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PE::Duplicate(msg) => format!("Duplicate column: {}", msg),
        PE::IO { error, msg } => {
            user_message_from_io(error.as_ref(), msg.as_ref().map(|m| m.as_ref()))
        }
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ShapeMismatch(msg) => format!("Row shape mismatch: {}", msg),
        PE::ComputeError(msg) => simplify_compute_message(msg),
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => first_line(&err.to_string()),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error, context: Option<&str>) -> String {
    use std::io::ErrorKind;

    let base: String = match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        ErrorKind::OutOfMemory => "Out of memory.".to_string(),
        _ => err.to_string(),
    };

    match context {
        Some(ctx) if !ctx.is_empty() => format!("{} {}", base, ctx),
        _ => base,
    }
}

/// Format a calamine error for the lookup file.
pub fn user_message_from_calamine(err: &calamine::Error) -> String {
    match err {
        calamine::Error::Io(e) => user_message_from_io(e, None),
        calamine::Error::Msg(msg) => {
            if msg.contains("Cannot detect file format") {
                "not a recognised Excel file (expected .xlsx or .xls)".to_string()
            } else {
                msg.to_string()
            }
        }
        other => first_line(&other.to_string()),
    }
}

/// Format a color_eyre Report by downcasting to known error types.
/// Walks the cause chain to find PolarsError or io::Error.
pub fn user_message_from_report(report: &color_eyre::eyre::Report) -> String {
    for cause in report.chain() {
        if let Some(pe) = cause.downcast_ref::<PolarsError>() {
            return user_message_from_polars(pe);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return user_message_from_io(io_err, None);
        }
    }

    // Fallback: use first line of display to avoid long tracebacks
    first_line(&report.to_string())
}

/// Map the CSV reader's compute errors to plain descriptions; drop reader-option hints.
fn simplify_compute_message(msg: &str) -> String {
    let lower = msg.to_lowercase();
    if lower.contains("more fields than defined") {
        return "A row has more fields than the header line.".to_string();
    }
    if lower.contains("utf-8") || lower.contains("utf8") {
        return "File is not valid UTF-8 text.".to_string();
    }
    first_line(msg)
}

fn first_line(msg: &str) -> String {
    msg.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("An error occurred")
        .to_string()
}
