//! Display copy of the final table with grouped monetary amounts.
//!
//! The copy is string-typed in the monetary columns and must never reach the
//! exporter; [`format_for_display`] only borrows the table it formats.

use crate::error::FormatError;
use crate::table::{Cell, Column, Table};

/// The display copy plus the cells that could not be formatted.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTable {
    pub table: Table,
    pub format_errors: Vec<FormatError>,
}

/// Insert "," every three digits of an unsigned digit string.
fn group_digits(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Group the integer part of a plain decimal rendering, keeping sign and fraction.
fn group_rendered(rendered: &str) -> String {
    let (sign, unsigned) = match rendered.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rendered),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, group_digits(int_part), frac),
        None => format!("{}{}", sign, group_digits(int_part)),
    }
}

/// Format an amount: whole numbers without decimals ("1,200,000"), anything
/// else with exactly two ("1,200,000.50"). `None` for NaN and infinities.
pub fn format_amount(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let rendered = if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    };
    Some(group_rendered(&rendered))
}

/// Format one monetary cell for display. Integers are grouped exactly;
/// text is coerced when it parses as a number.
pub fn format_money_cell(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Int(v) => Some(group_rendered(&v.to_string())),
        other => other.to_f64().and_then(format_amount),
    }
}

/// Build the display copy. Each monetary column present in the table is
/// rewritten to text; cells that cannot be read as numbers become "" and
/// are reported. Null cells become "" without a report.
pub fn format_for_display(table: &Table, money_columns: &[String]) -> DisplayTable {
    let mut display = table.clone();
    let mut format_errors = Vec::new();

    for name in money_columns {
        let column = Column::from_name(name);
        let mut row = 0usize;
        display.map_column(&column, |cell| {
            row += 1;
            if cell.is_null() {
                return Cell::Text(String::new());
            }
            match format_money_cell(cell) {
                Some(text) => Cell::Text(text),
                None => {
                    format_errors.push(FormatError {
                        column: name.clone(),
                        row,
                        value: cell.to_string(),
                    });
                    Cell::Text(String::new())
                }
            }
        });
    }

    DisplayTable {
        table: display,
        format_errors,
    }
}
