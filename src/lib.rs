//! # Purchase Ledger
//!
//! Records purchases of goods from suppliers for delivery to cities, and
//! turns them into spreadsheets and printable purchase orders.
//!
//! ## Core Concepts
//!
//! - **Store**: Append-only log of purchase records with delete tombstones
//! - **Form**: Variable-length line-item form submitted as one atomic batch
//! - **Filter**: Pure filtering, KPIs and grouping over loaded records
//! - **Documents**: Deterministic purchase-order PDFs and .xlsx exports
//!
//! ## Example
//!
//! ```ignore
//! use purchase_ledger::{LineItemForm, RecordFilter, Store, StoreConfig};
//!
//! let store = Store::open_or_create(StoreConfig::at("./purchases"))?;
//!
//! let mut form = LineItemForm::new(today);
//! form.set_buyer("Ana");
//! form.set_supplier("Acme");
//! form.set_destination_city("Recife");
//! form.set_slot(0, LineItem::new("toner", 2.0))?;
//! form.submit(&store)?;
//!
//! let records = store.load_all()?;
//! let acme = RecordFilter::any().supplier("Acme").apply(&records);
//! let kpis = compute_kpis(acme.iter().copied());
//! ```

pub mod document;
pub mod error;
pub mod export;
pub mod filter;
pub mod form;
pub mod format;
pub mod order;
pub mod records;
pub mod store;
pub mod types;

// Re-exports
pub use document::assemble_document;
pub use error::{LedgerError, Result, ValidationError, ValidationIssue};
pub use export::export_spreadsheet;
pub use filter::{
    compute_kpis, distinct_values, group_by_description, GroupedItem, Kpis, RecordField,
    RecordFilter,
};
pub use form::{LineItem, LineItemForm, PurchaseHeader};
pub use format::{format_date, format_quantity, parse_date, parse_quantity};
pub use order::{review_items, OrderDocumentSpec, OrderHeader, OrderItem, OrderSelection};
pub use records::{RecordIndex, RecordLog};
pub use store::{Store, StoreConfig};
pub use types::{NewPurchase, PurchaseRecord, RecordId, StoreStats, Timestamp};
