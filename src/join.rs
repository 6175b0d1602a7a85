use crate::error::{JoinError, JoinSide};
use crate::reference::ReferenceTable;
use crate::table::{Cell, Column, Table};
use tracing::info;

/// Left-join the lookup's accounts onto the combined table by "SID Number".
///
/// Keys are compared as exact strings: no trimming and no case folding, so
/// "S1 " does not match "S1". Every input row is kept; rows without a match
/// (or with a null SID) get a null "Account". An existing "Account" column is
/// overwritten in place, otherwise the column is appended.
pub fn join_reference(table: &Table, reference: &ReferenceTable) -> Result<Table, JoinError> {
    let sids = table
        .column_values(&Column::SidNumber)
        .ok_or_else(|| JoinError::MissingColumn {
            side: JoinSide::Transactions,
            column: Column::SidNumber.name().to_string(),
        })?;

    let mut matched = 0usize;
    let accounts: Vec<Cell> = sids
        .map(|sid| {
            let account = sid
                .to_key()
                .and_then(|key| reference.account(&key).map(str::to_string));
            if account.is_some() {
                matched += 1;
            }
            Cell::from(account)
        })
        .collect();

    info!(
        rows = table.height(),
        matched,
        lookup_entries = reference.len(),
        "joined lookup accounts"
    );

    let mut joined = table.clone();
    joined.set_column(Column::Account, accounts);
    Ok(joined)
}
