//! SID → Account lookup loaded from an Excel workbook.

use crate::config::ReferenceConfig;
use crate::error::{JoinError, JoinSide};
use crate::parser::SourceFile;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

/// Identifier → account mapping, deduplicated by identifier (first row wins).
///
/// An account may be absent (blank cell) for a known identifier; joined rows
/// then get a null account just like unmatched rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    entries: HashMap<String, Option<String>>,
    duplicates_dropped: usize,
}

impl ReferenceTable {
    /// Build from (identifier, account) pairs in sheet order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
    {
        let mut table = ReferenceTable::default();
        for (key, account) in pairs {
            if table.entries.contains_key(&key) {
                table.duplicates_dropped += 1;
            } else {
                table.entries.insert(key, account);
            }
        }
        table
    }

    /// Account for an identifier; exact string comparison.
    pub fn account(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|a| a.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows dropped because their identifier was already seen.
    pub fn duplicates_dropped(&self) -> usize {
        self.duplicates_dropped
    }
}

/// Read the lookup workbook (xlsx, xls, xlsb or ods) into a [`ReferenceTable`].
///
/// The first row of the sheet is the header; it must contain the configured
/// key and value columns. Every cell is read as text.
pub fn load_reference(
    source: &SourceFile,
    config: &ReferenceConfig,
) -> Result<ReferenceTable, JoinError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(source.bytes.clone()))?;

    let range = match &config.sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(JoinError::MissingSheet(format!("'{}'", name)));
            }
            workbook.worksheet_range(name)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| JoinError::MissingSheet("(workbook has no sheets)".to_string()))??,
    };

    let reference = reference_from_range(&range, config)?;
    debug!(
        source = %source.name,
        entries = reference.len(),
        duplicates_dropped = reference.duplicates_dropped(),
        "loaded lookup table"
    );
    Ok(reference)
}

fn reference_from_range(
    range: &Range<Data>,
    config: &ReferenceConfig,
) -> Result<ReferenceTable, JoinError> {
    let mut rows = range.rows();
    let header: Vec<Option<String>> = rows
        .next()
        .ok_or(JoinError::EmptySheet)?
        .iter()
        .map(cell_text)
        .collect();

    let find = |name: &str| {
        header
            .iter()
            .position(|h| h.as_deref() == Some(name))
            .ok_or_else(|| JoinError::MissingColumn {
                side: JoinSide::Reference,
                column: name.to_string(),
            })
    };
    let key_idx = find(&config.key_column)?;
    let value_idx = find(&config.value_column)?;

    let pairs = rows.filter_map(|row| {
        let key = row.get(key_idx).and_then(cell_text)?;
        let account = row.get(value_idx).and_then(cell_text);
        Some((key, account))
    });

    Ok(ReferenceTable::from_pairs(pairs))
}

/// Text form of a workbook cell. Whole-number floats drop their fraction so an
/// identifier typed as a number in Excel still matches its text form.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{:.0}", v)),
        Data::Float(v) => Some(v.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        other => Some(other.to_string()),
    }
}
