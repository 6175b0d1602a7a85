//! Plain-text rendering of the display copy for the terminal.

use crate::table::Table;
use std::fmt::Write;

/// Longest rendered cell before it is cut with "…".
const MAX_CELL_WIDTH: usize = 40;

fn clip(value: &str) -> String {
    if value.chars().count() <= MAX_CELL_WIDTH {
        value.to_string()
    } else {
        let mut clipped: String = value.chars().take(MAX_CELL_WIDTH - 1).collect();
        clipped.push('…');
        clipped
    }
}

fn pad(out: &mut String, value: &str, width: usize, right: bool) {
    let fill = width.saturating_sub(value.chars().count());
    if right {
        out.push_str(&" ".repeat(fill));
        out.push_str(value);
    } else {
        out.push_str(value);
        out.push_str(&" ".repeat(fill));
    }
}

/// Render up to `max_rows` rows as an aligned table with a header rule and a
/// trailing "(N of M rows)" line when rows were left out.
///
/// Numeric cells are right-aligned, everything else left-aligned.
pub fn render_preview(table: &Table, max_rows: usize) -> String {
    let header: Vec<String> = table.column_names().iter().map(|n| clip(n)).collect();
    let body: Vec<Vec<(String, bool)>> = table
        .rows()
        .take(max_rows)
        .map(|row| {
            row.iter()
                .map(|cell| (clip(&cell.to_string()), cell.is_numeric()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|idx| {
            body.iter()
                .map(|row| row[idx].0.chars().count())
                .chain(std::iter::once(header[idx].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let separator = " | ";

    for (idx, name) in header.iter().enumerate() {
        if idx > 0 {
            out.push_str(separator);
        }
        pad(&mut out, name, widths[idx], false);
    }
    out.truncate(out.trim_end().len());
    out.push('\n');

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');

    for row in &body {
        let start = out.len();
        for (idx, (value, numeric)) in row.iter().enumerate() {
            if idx > 0 {
                out.push_str(separator);
            }
            pad(&mut out, value, widths[idx], *numeric);
        }
        out.truncate(start + out[start..].trim_end().len());
        out.push('\n');
    }

    if table.height() > body.len() {
        let _ = writeln!(out, "({} of {} rows)", body.len(), table.height());
    }
    out
}
