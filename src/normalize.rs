use crate::pipeline::{SkipReason, StageOutcome};
use crate::table::{Cell, Column, Table};
use tracing::info;

/// Normalize one account code.
///
/// Single left-to-right pass: every non-overlapping "000000" becomes "0000",
/// then a leading "R10000" becomes "R10", then a leading "S10000" becomes "S10".
pub fn normalize_account(raw: &str) -> String {
    let mut value = raw.replace("000000", "0000");
    if let Some(rest) = value.strip_prefix("R10000") {
        value = format!("R10{}", rest);
    }
    if let Some(rest) = value.strip_prefix("S10000") {
        value = format!("S10{}", rest);
    }
    value
}

/// Rewrite text cells of the "Account" column; other cells pass through.
/// Skipped when the table has no "Account" column.
pub fn normalize_accounts(table: &Table) -> StageOutcome {
    if !table.has_column(&Column::Account) {
        return StageOutcome::Skipped(SkipReason::MissingColumns(vec![Column::Account
            .name()
            .to_string()]));
    }

    let mut changed = 0usize;
    let mut normalized = table.clone();
    normalized.map_column(&Column::Account, |cell| match cell {
        Cell::Text(s) => {
            let value = normalize_account(s);
            if value != *s {
                changed += 1;
            }
            Cell::Text(value)
        }
        other => other.clone(),
    });

    info!(changed, "normalized account codes");
    StageOutcome::Applied(normalized)
}
