//! Spreadsheet export of purchase records.

use crate::error::Result;
use crate::format::format_date;
use crate::types::PurchaseRecord;
use rust_xlsxwriter::{Format, Workbook};

pub const SHEET_NAME: &str = "Purchases";

/// Column headers and widths (in characters), in output order.
pub const COLUMNS: [(&str, f64); 6] = [
    ("Buyer", 18.0),
    ("Purchase date", 16.0),
    ("Supplier", 28.0),
    ("Destination city", 22.0),
    ("Item", 30.0),
    ("Quantity", 12.0),
];

/// Write `records` to an in-memory .xlsx workbook with a single sheet.
///
/// Dates are written as dd/mm/yyyy text and quantities as numbers.
pub fn export_spreadsheet<'a, I>(records: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, (title, width)) in COLUMNS.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, *width)?;
    }

    let mut rows = 0u32;
    for record in records {
        rows += 1;
        sheet.write_string(rows, 0, &record.buyer)?;
        sheet.write_string(rows, 1, format_date(record.purchase_date))?;
        sheet.write_string(rows, 2, &record.supplier)?;
        sheet.write_string(rows, 3, &record.destination_city)?;
        sheet.write_string(rows, 4, &record.item_description)?;
        sheet.write_number(rows, 5, record.quantity)?;
    }

    let bytes = workbook.save_to_buffer()?;
    tracing::info!(rows, bytes = bytes.len(), "exported spreadsheet");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewPurchase, RecordId, Timestamp};
    use chrono::NaiveDate;

    fn record(id: u64) -> PurchaseRecord {
        NewPurchase {
            buyer: "Ana".into(),
            purchase_date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            supplier: "Acme".into(),
            destination_city: "Recife".into(),
            item_description: format!("item {}", id),
            quantity: 1.5,
        }
        .into_record(RecordId(id), Timestamp(0))
    }

    #[test]
    fn test_export_is_a_zip_container() {
        let records = vec![record(1), record(2)];
        let bytes = export_spreadsheet(&records).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_export_empty() {
        let bytes = export_spreadsheet(&[]).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_column_layout() {
        let titles: Vec<&str> = COLUMNS.iter().map(|(t, _)| *t).collect();
        assert_eq!(
            titles,
            ["Buyer", "Purchase date", "Supplier", "Destination city", "Item", "Quantity"]
        );
    }
}
