use crate::pipeline::{SkipReason, StageOutcome};
use crate::table::{Cell, Column, Table};
use chrono::NaiveDate;
use tracing::info;

/// Short label for a transaction type: "Subscr", "Redemp", or the first six
/// characters of the raw type (case preserved).
pub fn classify(transaction_type: &str) -> String {
    let upper = transaction_type.to_uppercase();
    if upper.contains("SUBSCR") {
        "Subscr".to_string()
    } else if upper.contains("REDEMP") {
        "Redemp".to_string()
    } else {
        transaction_type.chars().take(6).collect()
    }
}

/// Render a strict `YYYYMMDD` date as "05 March 2024"; anything else is returned as is.
pub fn render_date(raw: &str) -> String {
    match parse_yyyymmdd(raw) {
        Some(date) => date.format("%d %B %Y").to_string(),
        None => raw.to_string(),
    }
}

fn parse_yyyymmdd(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Description for one transaction.
pub fn describe(transaction_type: &Cell, transaction_date: &Cell) -> String {
    format!(
        "Materai - {} at {}",
        classify(&transaction_type.to_string()),
        render_date(&transaction_date.to_string())
    )
}

/// Add the "Description" column. Skipped when either source column is missing.
pub fn derive_description(table: &Table) -> StageOutcome {
    let required = [Column::TransactionType, Column::TransactionDate];
    let missing = table.missing_columns(&required);
    if !missing.is_empty() {
        return StageOutcome::Skipped(SkipReason::MissingColumns(missing));
    }

    let descriptions: Vec<Cell> = table
        .records()
        .map(|record| {
            let ttype = record.get(&Column::TransactionType).unwrap_or(&Cell::Null);
            let tdate = record.get(&Column::TransactionDate).unwrap_or(&Cell::Null);
            Cell::Text(describe(ttype, tdate))
        })
        .collect();

    info!(rows = descriptions.len(), "derived descriptions");
    let mut derived = table.clone();
    derived.set_column(Column::Description, descriptions);
    StageOutcome::Applied(derived)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("SUBSCRIPTION"), "Subscr");
        assert_eq!(classify("Subscription Fee"), "Subscr");
        assert_eq!(classify("REDEMPTION"), "Redemp");
        assert_eq!(classify("partial redemp"), "Redemp");
        assert_eq!(classify("OTHERXYZ"), "OTHERX");
        assert_eq!(classify("switch-in"), "switch");
        assert_eq!(classify("SWI"), "SWI");
        assert_eq!(classify(""), "");
    }

    #[test]
    fn test_classify_counts_characters_not_bytes() {
        assert_eq!(classify("ÉCHANGE"), "ÉCHANG");
    }

    #[test]
    fn test_render_date() {
        assert_eq!(render_date("20240305"), "05 March 2024");
        assert_eq!(render_date("20231231"), "31 December 2023");
        assert_eq!(render_date("ABCDEFGH"), "ABCDEFGH");
        assert_eq!(render_date("2024-03-05"), "2024-03-05");
        assert_eq!(render_date("20240230"), "20240230");
        assert_eq!(render_date(""), "");
    }

    #[test]
    fn test_describe_numeric_date_cell() {
        let d = describe(&Cell::from("SUBSCRIPTION"), &Cell::Int(20240305));
        assert_eq!(d, "Materai - Subscr at 05 March 2024");
    }

    #[test]
    fn test_describe_unparsable_date_falls_back() {
        let d = describe(&Cell::from("REDEMPTION"), &Cell::from("ABCDEFGH"));
        assert!(d.ends_with("at ABCDEFGH"), "got: {}", d);
        assert_eq!(d, "Materai - Redemp at ABCDEFGH");
    }

    #[test]
    fn test_derive_appends_description_only() {
        let table = Table::from_rows(
            vec![Column::TransactionType, Column::TransactionDate],
            vec![vec![Cell::from("OTHERXYZ"), Cell::Int(20240101)]],
        );
        let StageOutcome::Applied(derived) = derive_description(&table) else {
            panic!("expected description to be derived");
        };
        assert_eq!(
            derived.column_names(),
            vec!["Transaction Type", "Transaction Date", "Description"]
        );
        assert_eq!(derived.cell(0, &Column::TransactionDate), Some(&Cell::Int(20240101)));
        assert_eq!(
            derived.cell(0, &Column::Description),
            Some(&Cell::from("Materai - OTHERX at 01 January 2024"))
        );
    }

    #[test]
    fn test_derive_skips_without_date_column() {
        let table = Table::from_rows(
            vec![Column::TransactionType],
            vec![vec![Cell::from("SUBSCRIPTION")]],
        );
        match derive_description(&table) {
            StageOutcome::Skipped(SkipReason::MissingColumns(cols)) => {
                assert_eq!(cols, vec!["Transaction Date".to_string()]);
            }
            other => panic!("expected skip, got {:?}", other),
        }
    }
}
