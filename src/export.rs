//! Excel export of the final (numeric) table.
//!
//! Numbers are written as numbers so the workbook keeps full precision; the
//! money columns only get a cell number format and a fixed width.

use crate::config::ExportConfig;
use crate::error::ExportError;
use crate::table::{Cell, Table};
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Worksheet limits: 1,048,576 rows (one used by the header) and 16,384 columns.
const MAX_DATA_ROWS: usize = 1_048_575;
const MAX_COLUMNS: usize = 16_384;

/// The serialized workbook, ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Width and format decisions for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub index: u16,
    pub width: f64,
    pub money_format: bool,
}

/// Plan column widths: money columns get the fixed money width, every other
/// column gets its longest value (or header) plus padding, in characters.
pub fn plan_columns(table: &Table, config: &ExportConfig) -> Vec<ColumnLayout> {
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let index = idx as u16;
            if config.is_money_column(column) {
                return ColumnLayout {
                    index,
                    width: config.money_width,
                    money_format: true,
                };
            }
            let longest = table
                .rows()
                .map(|row| width_text(&row[idx]).chars().count())
                .max()
                .unwrap_or(0);
            let header = column.name().chars().count();
            ColumnLayout {
                index,
                width: (longest.max(header) + config.width_padding) as f64,
                money_format: false,
            }
        })
        .collect()
}

/// Text a cell is measured by. Whole floats keep their ".0" so a float
/// column is sized as it renders, not as an integer would.
fn width_text(cell: &Cell) -> String {
    match cell {
        Cell::Float(v) if v.is_finite() && v.fract() == 0.0 => format!("{:.1}", v),
        other => other.to_string(),
    }
}

/// Serialize the table to an xlsx workbook held in memory.
///
/// Money cells are written as formatted numbers. In a money column that
/// was read as text (one bad value keeps the whole column textual), every
/// value that still reads as a number is written as one.
pub fn export_workbook(table: &Table, config: &ExportConfig) -> Result<ExportArtifact, ExportError> {
    if table.height() > MAX_DATA_ROWS || table.width() > MAX_COLUMNS {
        return Err(ExportError::TooLarge {
            rows: table.height(),
            columns: table.width(),
        });
    }

    let layout = plan_columns(table, config);
    let header_format = Format::new().set_bold();
    let money_format = Format::new().set_num_format(&config.money_format);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(&config.sheet_name)?;

    for (col, column) in layout.iter().zip(table.columns()) {
        worksheet.write_string_with_format(0, col.index, column.name(), &header_format)?;
        worksheet.set_column_width(col.index, col.width)?;
        if col.money_format {
            worksheet.set_column_format(col.index, &money_format)?;
        }
    }

    for (row_idx, row) in table.rows().enumerate() {
        let row_num = row_idx as u32 + 1;
        for (col, cell) in layout.iter().zip(row) {
            match cell {
                Cell::Null => {}
                Cell::Int(v) if col.money_format => {
                    worksheet.write_number_with_format(row_num, col.index, *v as f64, &money_format)?;
                }
                Cell::Float(v) if col.money_format => {
                    worksheet.write_number_with_format(row_num, col.index, *v, &money_format)?;
                }
                Cell::Int(v) => {
                    worksheet.write_number(row_num, col.index, *v as f64)?;
                }
                Cell::Float(v) => {
                    worksheet.write_number(row_num, col.index, *v)?;
                }
                Cell::Text(s) if col.money_format => match cell.to_f64() {
                    Some(v) => {
                        worksheet.write_number_with_format(row_num, col.index, v, &money_format)?;
                    }
                    None => {
                        worksheet.write_string(row_num, col.index, s)?;
                    }
                },
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col.index, s)?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    info!(
        rows = table.height(),
        columns = table.width(),
        bytes = bytes.len(),
        "exported workbook"
    );

    Ok(ExportArtifact {
        file_name: config.file_name.clone(),
        mime_type: XLSX_MIME_TYPE,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn sample() -> Table {
        Table::from_rows(
            vec![
                Column::RowNumber,
                Column::SidNumber,
                Column::StampDutyFee,
                Column::Description,
            ],
            vec![
                vec![
                    Cell::Int(1),
                    Cell::from("SID-0001"),
                    Cell::Float(10000.0),
                    Cell::from("Materai - Subscr at 05 March 2024"),
                ],
                vec![Cell::Int(2), Cell::Null, Cell::Float(1234.5678), Cell::Null],
            ],
        )
    }

    #[test]
    fn test_plan_columns() {
        let layout = plan_columns(&sample(), &ExportConfig::default());
        assert_eq!(layout.len(), 4);
        // "No." header (3) beats "1"/"2"
        assert_eq!(layout[0].width, 5.0);
        // "SID Number" header (10) beats "SID-0001" (8)
        assert_eq!(layout[1].width, 12.0);
        assert!(layout[2].money_format);
        assert_eq!(layout[2].width, 20.0);
        // longest description is 33 characters
        assert_eq!(layout[3].width, 35.0);
        assert!(!layout[3].money_format);
    }

    #[test]
    fn test_plan_columns_on_empty_table_uses_headers() {
        let table = Table::new(vec![Column::TransactionType]);
        let layout = plan_columns(&table, &ExportConfig::default());
        assert_eq!(layout[0].width, "Transaction Type".len() as f64 + 2.0);
    }

    #[test]
    fn test_plan_columns_measures_whole_floats_with_decimal() {
        let table = Table::from_rows(
            vec![Column::Other("Rate".into()), Column::Other("Count".into())],
            vec![
                vec![Cell::Float(10000.0), Cell::Int(10000)],
                vec![Cell::Float(2.5), Cell::Int(7)],
            ],
        );
        let layout = plan_columns(&table, &ExportConfig::default());
        // "10000.0" is 7 characters
        assert_eq!(layout[0].width, 9.0);
        // "10000" is 5 characters, the header "Count" ties
        assert_eq!(layout[1].width, 7.0);
    }

    #[test]
    fn test_width_text() {
        assert_eq!(width_text(&Cell::Float(10000.0)), "10000.0");
        assert_eq!(width_text(&Cell::Float(-3.0)), "-3.0");
        assert_eq!(width_text(&Cell::Float(1234.5678)), "1234.5678");
        assert_eq!(width_text(&Cell::Int(42)), "42");
        assert_eq!(width_text(&Cell::Null), "");
    }

    #[test]
    fn test_export_writes_numeric_text_in_money_columns_as_numbers() {
        let table = Table::from_rows(
            vec![Column::SidNumber, Column::GrossAmount],
            vec![
                vec![Cell::from("S1"), Cell::from("n/a")],
                vec![Cell::from("S2"), Cell::from("500")],
                vec![Cell::from("00123"), Cell::from(" 1200000.5 ")],
            ],
        );
        let artifact = export_workbook(&table, &ExportConfig::default()).unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(artifact.bytes)).unwrap();
        let range = workbook.worksheet_range("CombinedData").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        assert_eq!(rows[1][1], Data::String("n/a".to_string()));
        assert_eq!(rows[2][1], Data::Float(500.0));
        assert_eq!(rows[3][1], Data::Float(1200000.5));
        // text outside money columns is left alone
        assert_eq!(rows[3][0], Data::String("00123".to_string()));
    }

    #[test]
    fn test_export_writes_sheet_with_numbers() {
        let table = sample();
        let artifact = export_workbook(&table, &ExportConfig::default()).unwrap();
        assert_eq!(artifact.file_name, "combined_data.xlsx");
        assert_eq!(artifact.mime_type, XLSX_MIME_TYPE);

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(artifact.bytes)).unwrap();
        let range = workbook.worksheet_range("CombinedData").unwrap();
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][1], Data::String("SID Number".to_string()));
        assert_eq!(rows[1][1], Data::String("SID-0001".to_string()));
        match &rows[2][2] {
            Data::Float(v) => assert_eq!(*v, 1234.5678),
            other => panic!("expected a number, got {:?}", other),
        }
        assert_eq!(rows[2][1], Data::Empty);
    }

    #[test]
    fn test_export_rejects_oversized_table() {
        let columns: Vec<Column> = (0..=MAX_COLUMNS).map(|i| Column::Other(format!("c{}", i))).collect();
        let table = Table::new(columns);
        let err = export_workbook(&table, &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, ExportError::TooLarge { .. }));
    }
}
