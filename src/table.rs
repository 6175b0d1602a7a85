//! In-memory table model shared by every pipeline stage.
//!
//! Cells are typed on read (see [`crate::parser`]) and stay typed until the
//! presentation copy is produced, so the export path never sees display strings.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A single typed value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Numeric value of the cell. Text is coerced when it parses as a finite number.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            Cell::Null => None,
        }
    }

    /// String form used for key comparison. `None` for nulls.
    pub fn to_key(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(v) => write!(f, "{}", v),
            Cell::Float(v) => write!(f, "{}", v),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<i64> for Cell {
    fn from(v: i64) -> Self {
        Cell::Int(v)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Float(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Column identity. Headers the pipeline reads or writes by name are
/// enumerated; anything else is carried through as `Other`.
///
/// Equality and hashing go through [`Column::name`], so `Other("Account")`
/// and `Account` are the same column.
#[derive(Debug, Clone)]
pub enum Column {
    RowNumber,
    SidNumber,
    Account,
    TransactionType,
    TransactionDate,
    StampDutyFee,
    GrossAmount,
    Description,
    Other(String),
}

impl Column {
    pub const WELL_KNOWN: [Column; 8] = [
        Column::RowNumber,
        Column::SidNumber,
        Column::Account,
        Column::TransactionType,
        Column::TransactionDate,
        Column::StampDutyFee,
        Column::GrossAmount,
        Column::Description,
    ];

    /// Header text as it appears in source files and the exported sheet.
    pub fn name(&self) -> &str {
        match self {
            Column::RowNumber => "No.",
            Column::SidNumber => "SID Number",
            Column::Account => "Account",
            Column::TransactionType => "Transaction Type",
            Column::TransactionDate => "Transaction Date",
            Column::StampDutyFee => "Stamp Duty Fee",
            Column::GrossAmount => "Gross Transaction Amount (IDR Equivalent)",
            Column::Description => "Description",
            Column::Other(name) => name,
        }
    }

    /// Map a header to its well-known column, or `Other` when unrecognized.
    pub fn from_name(name: &str) -> Self {
        Self::WELL_KNOWN
            .iter()
            .find(|c| c.name() == name)
            .cloned()
            .unwrap_or_else(|| Column::Other(name.to_string()))
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::from_name(name)
    }
}

/// Borrowed view of one row, addressed by column.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [Column],
    cells: &'a [Cell],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: &Column) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|idx| self.cells.get(idx))
    }
}

/// Ordered columns plus ordered rows. Every row has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from rows, padding short rows with nulls and truncating long ones.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn position(&self, column: &Column) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &Column) -> bool {
        self.position(column).is_some()
    }

    /// Names of the given columns that this table lacks, in argument order.
    pub fn missing_columns(&self, required: &[Column]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Null);
        self.rows.push(row);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|cells| Record {
            columns: &self.columns,
            cells,
        })
    }

    pub fn cell(&self, row: usize, column: &Column) -> Option<&Cell> {
        let idx = self.position(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Values of one column in row order, or `None` when the column is absent.
    pub fn column_values(&self, column: &Column) -> Option<impl Iterator<Item = &Cell> + '_> {
        let idx = self.position(column)?;
        Some(self.rows.iter().map(move |r| &r[idx]))
    }

    /// Remove a column and its cells. Returns false when the column was absent.
    pub fn drop_column(&mut self, column: &Column) -> bool {
        let Some(idx) = self.position(column) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Insert a column at `index` with one value per row.
    ///
    /// Missing values are filled with nulls; extra values are ignored.
    pub fn insert_column(&mut self, index: usize, column: Column, values: Vec<Cell>) {
        let index = index.min(self.columns.len());
        self.columns.insert(index, column);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(index, values.next().unwrap_or_default());
        }
    }

    /// Replace a column's values in place, or append it as the last column.
    pub fn set_column(&mut self, column: Column, values: Vec<Cell>) {
        match self.position(&column) {
            Some(idx) => {
                let mut values = values.into_iter();
                for row in &mut self.rows {
                    row[idx] = values.next().unwrap_or_default();
                }
            }
            None => self.insert_column(self.columns.len(), column, values),
        }
    }

    /// Rewrite every cell of a column. Returns false when the column was absent.
    pub fn map_column<F>(&mut self, column: &Column, mut f: F) -> bool
    where
        F: FnMut(&Cell) -> Cell,
    {
        let Some(idx) = self.position(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    pub(crate) fn into_parts(self) -> (Vec<Column>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}
