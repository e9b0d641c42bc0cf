//! Dynamic line-item form state.
//!
//! The form owns the in-progress values of one purchase submission: shared
//! header fields plus an ordered list of line-item slots. Slots live in a
//! `Vec`, so positions are always the contiguous range `0..count`; removing a
//! slot moves the values behind it down by one.
//!
//! The presentation layer renders straight from [`LineItemForm`] after every
//! transition and never keeps a copy of the values itself.

use crate::error::{LedgerError, Result, ValidationError, ValidationIssue};
use crate::store::Store;
use crate::types::{NewPurchase, PurchaseRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// In-progress values of one slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
}

impl LineItem {
    pub fn new(description: impl Into<String>, quantity: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
        }
    }
}

/// Fields shared by every record of a submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseHeader {
    pub buyer: String,
    pub purchase_date: NaiveDate,
    pub supplier: String,
    pub destination_city: String,
}

impl PurchaseHeader {
    fn empty(purchase_date: NaiveDate) -> Self {
        Self {
            buyer: String::new(),
            purchase_date,
            supplier: String::new(),
            destination_city: String::new(),
        }
    }
}

/// Variable-length purchase form.
#[derive(Clone, Debug)]
pub struct LineItemForm {
    header: PurchaseHeader,
    slots: Vec<LineItem>,
    /// Purchase date restored on reset.
    default_date: NaiveDate,
}

impl LineItemForm {
    /// A form with one empty slot and `default_date` as purchase date.
    pub fn new(default_date: NaiveDate) -> Self {
        Self {
            header: PurchaseHeader::empty(default_date),
            slots: vec![LineItem::default()],
            default_date,
        }
    }

    // --- Reading ---

    pub fn header(&self) -> &PurchaseHeader {
        &self.header
    }

    pub fn slots(&self) -> &[LineItem] {
        &self.slots
    }

    /// Number of slots (always at least 1).
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    // --- Header edits ---

    pub fn set_buyer(&mut self, buyer: impl Into<String>) {
        self.header.buyer = buyer.into();
    }

    pub fn set_purchase_date(&mut self, date: NaiveDate) {
        self.header.purchase_date = date;
    }

    pub fn set_supplier(&mut self, supplier: impl Into<String>) {
        self.header.supplier = supplier.into();
    }

    pub fn set_destination_city(&mut self, city: impl Into<String>) {
        self.header.destination_city = city.into();
    }

    // --- Slot edits (0-based) ---

    pub fn set_description(&mut self, index: usize, description: impl Into<String>) -> Result<()> {
        self.slot_mut(index)?.description = description.into();
        Ok(())
    }

    pub fn set_quantity(&mut self, index: usize, quantity: f64) -> Result<()> {
        self.slot_mut(index)?.quantity = quantity;
        Ok(())
    }

    /// Replace both values of a slot.
    pub fn set_slot(&mut self, index: usize, item: LineItem) -> Result<()> {
        *self.slot_mut(index)? = item;
        Ok(())
    }

    fn slot_mut(&mut self, index: usize) -> Result<&mut LineItem> {
        let count = self.slots.len();
        self.slots.get_mut(index).ok_or_else(|| {
            LedgerError::InvalidOperation(format!("slot {} out of range (count {})", index, count))
        })
    }

    // --- Transitions ---

    /// Append an empty slot. Returns the new count.
    pub fn add_slot(&mut self) -> usize {
        self.slots.push(LineItem::default());
        tracing::debug!(count = self.slots.len(), "added slot");
        self.slots.len()
    }

    /// Remove the slot at a 1-based `position`, returning its values.
    ///
    /// Later slots shift down by one. Rejected when only one slot is left or
    /// the position is outside `1..=count`; the form is unchanged then.
    pub fn remove_slot(&mut self, position: usize) -> Result<LineItem> {
        let count = self.slots.len();
        if count <= 1 {
            return Err(LedgerError::InvalidOperation(
                "cannot remove the last remaining slot".into(),
            ));
        }
        if position == 0 || position > count {
            return Err(LedgerError::InvalidOperation(format!(
                "slot position {} out of range 1..={}",
                position, count
            )));
        }

        let removed = self.slots.remove(position - 1);
        tracing::debug!(position, count = self.slots.len(), "removed slot");
        Ok(removed)
    }

    /// Back to one empty slot and blank header fields.
    pub fn reset(&mut self) {
        self.header = PurchaseHeader::empty(self.default_date);
        self.slots = vec![LineItem::default()];
    }

    /// Check every header field and slot, collecting all problems.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut issues = Vec::new();

        for (name, value) in [
            ("buyer", &self.header.buyer),
            ("supplier", &self.header.supplier),
            ("destination city", &self.header.destination_city),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::EmptyField(name));
            }
        }

        for (i, slot) in self.slots.iter().enumerate() {
            if slot.description.trim().is_empty() {
                issues.push(ValidationIssue::EmptyDescription { slot: i + 1 });
            }
            // NaN fails this comparison too.
            if !(slot.quantity > 0.0 && slot.quantity.is_finite()) {
                issues.push(ValidationIssue::NonPositiveQuantity {
                    slot: i + 1,
                    quantity: slot.quantity,
                });
            }
        }

        ValidationError::check(issues)
    }

    /// Validate, persist one record per slot, then reset.
    ///
    /// Nothing is inserted and the form is left as is when validation fails
    /// or the store rejects the write.
    pub fn submit(&mut self, store: &Store) -> Result<Vec<PurchaseRecord>> {
        self.validate()?;

        let header = &self.header;
        let inputs: Vec<NewPurchase> = self
            .slots
            .iter()
            .map(|slot| NewPurchase {
                buyer: header.buyer.trim().to_string(),
                purchase_date: header.purchase_date,
                supplier: header.supplier.trim().to_string(),
                destination_city: header.destination_city.trim().to_string(),
                item_description: slot.description.trim().to_string(),
                quantity: slot.quantity,
            })
            .collect();

        let records = store.insert_batch(inputs)?;
        tracing::info!(records = records.len(), "purchase submitted");

        self.reset();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreConfig;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn filled(items: &[(&str, f64)]) -> LineItemForm {
        let mut form = LineItemForm::new(today());
        form.set_buyer("Ana");
        form.set_supplier("Acme");
        form.set_destination_city("Recife");
        for (i, (description, quantity)) in items.iter().enumerate() {
            if i > 0 {
                form.add_slot();
            }
            form.set_slot(i, LineItem::new(*description, *quantity)).unwrap();
        }
        form
    }

    #[test]
    fn test_initial_state() {
        let form = LineItemForm::new(today());
        assert_eq!(form.count(), 1);
        assert_eq!(form.slots()[0], LineItem::default());
        assert_eq!(form.header().purchase_date, today());
    }

    #[test]
    fn test_add_slot_keeps_existing_values() {
        let mut form = filled(&[("toner", 2.0)]);
        assert_eq!(form.add_slot(), 2);
        assert_eq!(form.slots()[0], LineItem::new("toner", 2.0));
        assert_eq!(form.slots()[1], LineItem::default());
    }

    #[test]
    fn test_remove_middle_slot_renumbers() {
        let mut form = filled(&[("A", 1.0), ("B", 2.0), ("C", 3.0)]);

        let removed = form.remove_slot(2).unwrap();

        assert_eq!(removed, LineItem::new("B", 2.0));
        assert_eq!(
            form.slots(),
            &[LineItem::new("A", 1.0), LineItem::new("C", 3.0)]
        );
    }

    #[test]
    fn test_remove_at_floor_is_rejected() {
        let mut form = filled(&[("A", 1.0)]);

        let result = form.remove_slot(1);

        assert!(matches!(result, Err(LedgerError::InvalidOperation(_))));
        assert_eq!(form.count(), 1);
        assert_eq!(form.slots()[0], LineItem::new("A", 1.0));
    }

    #[test]
    fn test_remove_out_of_range_is_rejected() {
        let mut form = filled(&[("A", 1.0), ("B", 2.0)]);

        assert!(form.remove_slot(0).is_err());
        assert!(form.remove_slot(3).is_err());
        assert_eq!(form.count(), 2);
    }

    #[test]
    fn test_set_out_of_range() {
        let mut form = LineItemForm::new(today());
        assert!(matches!(
            form.set_quantity(1, 3.0),
            Err(LedgerError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let mut form = filled(&[("toner", 2.0), ("  ", 0.0)]);
        form.set_buyer("   ");

        let err = form.validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::EmptyField("buyer"),
                ValidationIssue::EmptyDescription { slot: 2 },
                ValidationIssue::NonPositiveQuantity {
                    slot: 2,
                    quantity: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_validate_rejects_nan() {
        let form = filled(&[("toner", f64::NAN)]);
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_invalid_submit_inserts_nothing() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(StoreConfig::at(dir.path().join("store"))).unwrap();

        let mut form = filled(&[("toner", 2.0), ("", 3.0)]);
        let before = form.slots().to_vec();

        let result = form.submit(&store);

        assert!(matches!(result, Err(LedgerError::Validation(_))));
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(form.slots(), before.as_slice());
        assert_eq!(form.header().buyer, "Ana");
    }

    #[test]
    fn test_submit_inserts_and_resets() {
        let dir = TempDir::new().unwrap();
        let store = Store::create(StoreConfig::at(dir.path().join("store"))).unwrap();

        let mut form = filled(&[(" toner ", 2.0), ("cable", 5.0)]);
        form.set_purchase_date(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());

        let records = form.submit(&store).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_description, "toner");
        assert_eq!(records[1].quantity, 5.0);
        assert!(records.iter().all(|r| r.supplier == "Acme"));
        assert_eq!(store.load_all().unwrap().len(), 2);

        assert_eq!(form.count(), 1);
        assert_eq!(form.slots()[0], LineItem::default());
        assert!(form.header().buyer.is_empty());
        assert_eq!(form.header().purchase_date, today());
    }
}
