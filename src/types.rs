//! Core types for the purchase ledger.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a purchase record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Timestamp(Utc::now().timestamp_micros())
    }

    /// Convert to a UTC datetime, if representable.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_micros(self.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A persisted purchase transaction, one per line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Unique identifier (assigned by store).
    pub id: RecordId,

    pub buyer: String,

    pub purchase_date: NaiveDate,

    pub supplier: String,

    pub destination_city: String,

    pub item_description: String,

    /// Always > 0; enforced before the record reaches the store.
    pub quantity: f64,

    /// When the record was inserted (assigned by store).
    pub created_at: Timestamp,
}

/// Input for creating a new record (before id/created_at assigned).
#[derive(Clone, Debug, PartialEq)]
pub struct NewPurchase {
    pub buyer: String,
    pub purchase_date: NaiveDate,
    pub supplier: String,
    pub destination_city: String,
    pub item_description: String,
    pub quantity: f64,
}

impl NewPurchase {
    /// Attach store-assigned fields.
    pub(crate) fn into_record(self, id: RecordId, created_at: Timestamp) -> PurchaseRecord {
        PurchaseRecord {
            id,
            buyer: self.buyer,
            purchase_date: self.purchase_date,
            supplier: self.supplier,
            destination_city: self.destination_city,
            item_description: self.item_description,
            quantity: self.quantity,
            created_at,
        }
    }
}

/// Store statistics.
#[derive(Clone, Debug, Default)]
pub struct StoreStats {
    pub record_count: u64,
    pub deleted_count: u64,
    pub frame_count: u64,
    pub log_size_bytes: u64,
}
