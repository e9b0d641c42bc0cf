//! Purchase-order model: selection, item review and file naming.

use crate::error::{ValidationError, ValidationIssue};
use crate::filter::{group_by_description, GroupedItem, RecordFilter};
use crate::types::PurchaseRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which records feed an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSelection {
    pub supplier: String,
    pub destination_city: String,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl OrderSelection {
    pub fn new(supplier: impl Into<String>, destination_city: impl Into<String>) -> Self {
        Self {
            supplier: supplier.into(),
            destination_city: destination_city.into(),
            date_from: None,
            date_to: None,
        }
    }

    pub fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            buyer: None,
            supplier: Some(self.supplier.clone()),
            destination_city: Some(self.destination_city.clone()),
            date_from: self.date_from,
            date_to: self.date_to,
        }
    }
}

/// Header block of the order document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderHeader {
    pub order_number: Option<String>,
    pub order_date: NaiveDate,
    pub billing_id: Option<String>,
    pub requester: String,
    pub supplier: String,
    pub destination: String,
    pub notes: Option<String>,
}

impl OrderHeader {
    /// Trim every text field; blank optional fields become `None`.
    pub fn normalized(self) -> Self {
        fn optional(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            order_number: optional(self.order_number),
            order_date: self.order_date,
            billing_id: optional(self.billing_id),
            requester: self.requester.trim().to_string(),
            supplier: self.supplier.trim().to_string(),
            destination: self.destination.trim().to_string(),
            notes: optional(self.notes),
        }
    }
}

/// One material line on the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub material: String,
    pub quantity: f64,
}

impl From<GroupedItem> for OrderItem {
    fn from(group: GroupedItem) -> Self {
        Self {
            material: group.description,
            quantity: group.quantity,
        }
    }
}

/// Everything the document renderer needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDocumentSpec {
    pub header: OrderHeader,
    pub items: Vec<OrderItem>,
}

impl OrderDocumentSpec {
    pub fn new(header: OrderHeader, items: Vec<OrderItem>) -> Self {
        Self { header, items }
    }

    /// Build items by grouping `records` by description.
    pub fn from_records<'a, I>(header: OrderHeader, records: I) -> Self
    where
        I: IntoIterator<Item = &'a PurchaseRecord>,
    {
        let items = group_by_description(records)
            .into_iter()
            .map(OrderItem::from)
            .collect();
        Self { header, items }
    }

    /// Download name: `purchase_order_{supplier}_{destination}_{YYYY-MM-DD}.pdf`.
    pub fn file_name(&self) -> String {
        let raw = format!(
            "purchase_order_{}_{}_{}.pdf",
            self.header.supplier,
            self.header.destination,
            self.header.order_date.format("%Y-%m-%d")
        );
        raw.chars()
            .map(|c| match c {
                c if c.is_whitespace() => '_',
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c => c,
            })
            .collect()
    }
}

/// Check the (possibly hand-edited) item rows before rendering.
pub fn review_items(items: &[OrderItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::single(ValidationIssue::EmptyOrder));
    }

    let mut issues = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if item.material.trim().is_empty() {
            issues.push(ValidationIssue::EmptyDescription { slot: i + 1 });
        }
        if !(item.quantity > 0.0 && item.quantity.is_finite()) {
            issues.push(ValidationIssue::NonPositiveQuantity {
                slot: i + 1,
                quantity: item.quantity,
            });
        }
    }
    ValidationError::check(issues)
}
