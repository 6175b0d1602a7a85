//! Reads one pipe-delimited export into a [`Table`].
//!
//! The polars CSV reader does the tokenizing (quoting, UTF-8 validation,
//! ragged rows) with every field read as a string. Types are then decided
//! per column here, so a column is numeric only when all of its values are.

use crate::error::{InvalidDelimiter, ParseError};
use crate::table::{Cell, Column, Table};
use polars::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// One uploaded file: a display name plus its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming it by its file name.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Options for reading the text exports.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub delimiter: u8,
    pub text_columns: Vec<String>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            delimiter: b'|',
            text_columns: vec![
                Column::SidNumber.name().to_string(),
                Column::Account.name().to_string(),
            ],
        }
    }
}

impl TryFrom<&crate::config::InputConfig> for ParseOptions {
    type Error = InvalidDelimiter;

    fn try_from(config: &crate::config::InputConfig) -> Result<Self, Self::Error> {
        let delimiter = u8::try_from(config.delimiter)
            .ok()
            .filter(|&b| b.is_ascii() && !matches!(b, b'"' | b'\n' | b'\r'))
            .ok_or(InvalidDelimiter(config.delimiter))?;
        Ok(Self {
            delimiter,
            text_columns: config.text_columns.clone(),
        })
    }
}

/// Parse one source into a typed table.
///
/// An empty source yields an empty table; a header-only source yields its
/// columns with no rows. Blank lines, and lines whose fields are all empty,
/// are not records and are dropped.
pub fn parse_source(source: &SourceFile, options: &ParseOptions) -> Result<Table, ParseError> {
    if source.bytes.iter().all(|b| b.is_ascii_whitespace()) {
        debug!(source = %source.name, "empty source");
        return Ok(Table::default());
    }

    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| {
            opts.with_separator(options.delimiter)
                .with_quote_char(Some(b'"'))
                .with_truncate_ragged_lines(false)
        });

    let df = CsvReader::new(Cursor::new(source.bytes.as_slice()))
        .with_options(read_options)
        .finish()
        .map_err(|error| ParseError {
            source_name: source.name.clone(),
            error,
        })?;

    let table = frame_to_table(&df, options).map_err(|error| ParseError {
        source_name: source.name.clone(),
        error,
    })?;
    debug!(
        source = %source.name,
        rows = table.height(),
        columns = table.width(),
        "parsed source"
    );
    Ok(table)
}

/// Convert a string-typed frame into a table, typing each column.
fn frame_to_table(df: &DataFrame, options: &ParseOptions) -> PolarsResult<Table> {
    let mut columns = Vec::with_capacity(df.width());
    let mut typed: Vec<Vec<Cell>> = Vec::with_capacity(df.width());

    for col in df.get_columns() {
        let name = col.name().to_string();
        let raw: Vec<Option<&str>> = col.str()?.into_iter().collect();
        let keep_text = options.text_columns.iter().any(|c| *c == name);
        typed.push(type_column(&raw, keep_text));
        columns.push(Column::from_name(&name));
    }

    let height = df.height();
    let mut table = Table::new(columns);
    for row in 0..height {
        let cells: Vec<Cell> = typed.iter_mut().map(|c| std::mem::take(&mut c[row])).collect();
        // blank lines come back from the reader as all-null rows
        if cells.iter().all(Cell::is_null) {
            continue;
        }
        table.push_row(cells);
    }
    Ok(table)
}

/// Decide a column's type from all of its values.
///
/// Empty fields are null. The column is `Int` when every other value parses as
/// i64, `Float` when every other value parses as a finite f64, else `Text`.
fn type_column(raw: &[Option<&str>], keep_text: bool) -> Vec<Cell> {
    let present = || raw.iter().flatten().filter(|s| !s.is_empty());

    let as_int = !keep_text && present().all(|s| s.parse::<i64>().is_ok());
    let as_float = !keep_text
        && !as_int
        && present().all(|s| s.parse::<f64>().map(f64::is_finite).unwrap_or(false));

    raw.iter()
        .map(|value| match value {
            None => Cell::Null,
            Some(s) if s.is_empty() => Cell::Null,
            Some(s) if as_int => s.parse::<i64>().map(Cell::Int).unwrap_or(Cell::Null),
            Some(s) if as_float => s.parse::<f64>().map(Cell::Float).unwrap_or(Cell::Null),
            Some(s) => Cell::Text(s.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Table, ParseError> {
        parse_source(&SourceFile::new("test.txt", text), &ParseOptions::default())
    }

    #[test]
    fn test_parse_pipe_delimited_with_types() {
        let table = parse(
            "No.|SID Number|Transaction Type|Stamp Duty Fee\n\
             1|00123|SUBSCRIPTION|10000\n\
             2|00456|REDEMPTION|10000.5\n",
        )
        .unwrap();

        assert_eq!(
            table.column_names(),
            vec!["No.", "SID Number", "Transaction Type", "Stamp Duty Fee"]
        );
        assert_eq!(table.height(), 2);
        // identifiers stay text and keep their leading zeros
        assert_eq!(table.cell(0, &Column::SidNumber), Some(&Cell::from("00123")));
        assert_eq!(table.cell(0, &Column::RowNumber), Some(&Cell::Int(1)));
        assert_eq!(table.cell(0, &Column::StampDutyFee), Some(&Cell::Float(10000.0)));
        assert_eq!(table.cell(1, &Column::StampDutyFee), Some(&Cell::Float(10000.5)));
    }

    #[test]
    fn test_empty_fields_are_null() {
        let table = parse("A|B\nx|\n|2\n").unwrap();
        assert_eq!(table.cell(0, &"B".into()), Some(&Cell::Null));
        assert_eq!(table.cell(1, &"A".into()), Some(&Cell::Null));
        assert_eq!(table.cell(1, &"B".into()), Some(&Cell::Int(2)));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let table = parse("A\n1\nx\n").unwrap();
        assert_eq!(table.cell(0, &"A".into()), Some(&Cell::from("1")));
    }

    #[test]
    fn test_header_only_source_has_columns_and_no_rows() {
        let table = parse("A|B\n").unwrap();
        assert_eq!(table.column_names(), vec!["A", "B"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_source_is_empty_table() {
        let table = parse("").unwrap();
        assert_eq!(table.width(), 0);
        assert_eq!(table.height(), 0);
    }

    #[test]
    fn test_row_with_extra_fields_is_parse_error() {
        let err = parse("A|B\n1|2|3\n").unwrap_err();
        assert_eq!(err.source_name, "test.txt");
        assert!(err.to_string().starts_with("test.txt: "));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let source = SourceFile::new("bad.txt", vec![b'A', b'\n', 0xff, 0xfe, b'\n']);
        assert!(parse_source(&source, &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_quoted_field_may_contain_delimiter() {
        let table = parse("A|B\n\"x|y\"|1\n").unwrap();
        assert_eq!(table.cell(0, &"A".into()), Some(&Cell::from("x|y")));
    }

    #[test]
    fn test_blank_lines_are_not_records() {
        let table = parse("A|B\n1|2\n\n3|4\n\n\n").unwrap();
        assert_eq!(table.height(), 2);
        let rows: Vec<Vec<Cell>> = table.rows().map(<[Cell]>::to_vec).collect();
        assert_eq!(
            rows,
            vec![
                vec![Cell::Int(1), Cell::Int(2)],
                vec![Cell::Int(3), Cell::Int(4)],
            ]
        );
    }

    #[test]
    fn test_partly_empty_rows_are_kept() {
        let table = parse("A|B\n|x\n\n").unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.cell(0, &"A".into()), Some(&Cell::Null));
        assert_eq!(table.cell(0, &"B".into()), Some(&Cell::from("x")));
    }

    #[test]
    fn test_options_from_input_config() {
        let mut config = crate::config::InputConfig::default();
        let options = ParseOptions::try_from(&config).unwrap();
        assert_eq!(options.delimiter, b'|');

        config.delimiter = 'é';
        assert_eq!(
            ParseOptions::try_from(&config).unwrap_err(),
            InvalidDelimiter('é')
        );

        // 'Ĭ' (U+012C) would truncate to b',' with a plain cast
        config.delimiter = 'Ĭ';
        assert!(ParseOptions::try_from(&config).is_err());

        config.delimiter = '"';
        assert!(ParseOptions::try_from(&config).is_err());
    }

    #[test]
    fn test_custom_delimiter() {
        let options = ParseOptions {
            delimiter: b';',
            ..ParseOptions::default()
        };
        let table = parse_source(&SourceFile::new("t.txt", "A;B\n1;2\n"), &options).unwrap();
        assert_eq!(table.column_names(), vec!["A", "B"]);
    }
}
