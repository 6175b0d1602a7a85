use crate::table::{Cell, Column, Table};
use std::collections::HashMap;
use tracing::debug;

/// Transient per-row provenance column; never survives a combine.
pub const SOURCE_COLUMN: &str = "source_file";

/// Tag every row of `table` with the file it came from.
pub fn with_provenance(mut table: Table, source_name: &str) -> Table {
    let values = vec![Cell::from(source_name); table.height()];
    table.set_column(Column::Other(SOURCE_COLUMN.to_string()), values);
    table
}

/// Concatenate tables in order and renumber rows.
///
/// Columns are the union of all inputs in first-seen order; a row from a
/// table lacking a column gets a null there. Any "No." or provenance column
/// from the inputs is discarded and a fresh "No." (1..=N) becomes column 0.
pub fn combine_tables(tables: Vec<Table>) -> Table {
    let source = Column::Other(SOURCE_COLUMN.to_string());
    let mut columns: Vec<Column> = Vec::new();
    let mut positions: HashMap<Column, usize> = HashMap::new();

    for table in &tables {
        for column in table.columns() {
            if *column == Column::RowNumber || *column == source {
                continue;
            }
            if !positions.contains_key(column) {
                positions.insert(column.clone(), columns.len());
                columns.push(column.clone());
            }
        }
    }

    let width = columns.len();
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(tables.iter().map(Table::height).sum());
    let mut per_source: Vec<(String, usize)> = Vec::new();

    for table in tables {
        if let Some(cells) = table.column_values(&source) {
            for cell in cells {
                let name = cell.to_string();
                match per_source.last_mut() {
                    Some((last, count)) if *last == name => *count += 1,
                    _ => per_source.push((name, 1)),
                }
            }
        }

        let (table_columns, table_rows) = table.into_parts();
        let targets: Vec<Option<usize>> = table_columns
            .iter()
            .map(|c| positions.get(c).copied())
            .collect();

        for row in table_rows {
            let mut combined = vec![Cell::Null; width];
            for (cell, target) in row.into_iter().zip(&targets) {
                if let Some(idx) = target {
                    combined[*idx] = cell;
                }
            }
            rows.push(combined);
        }
    }

    for (name, count) in &per_source {
        debug!(source = %name, rows = count, "combined rows from source");
    }

    let mut combined = Table::from_rows(columns, rows);
    let numbers = (1..=combined.height() as i64).map(Cell::Int).collect();
    combined.insert_column(0, Column::RowNumber, numbers);
    combined
}
