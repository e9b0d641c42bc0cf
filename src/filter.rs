//! Record filtering and aggregation.
//!
//! Everything here is a pure function over borrowed records, so the same
//! loaded record set can feed the table view, the KPIs, the spreadsheet
//! export and order generation without re-reading the store.

use crate::types::PurchaseRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Optional constraints; a record must satisfy every one that is set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordFilter {
    /// Exact buyer match.
    pub buyer: Option<String>,
    /// Exact supplier match.
    pub supplier: Option<String>,
    /// Exact destination city match.
    pub destination_city: Option<String>,
    /// Inclusive lower bound on purchase date.
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on purchase date.
    pub date_to: Option<NaiveDate>,
}

impl RecordFilter {
    /// A filter that passes everything.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn buyer(mut self, buyer: impl Into<String>) -> Self {
        self.buyer = Some(buyer.into());
        self
    }

    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn destination_city(mut self, city: impl Into<String>) -> Self {
        self.destination_city = Some(city.into());
        self
    }

    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }

    /// Whether a record satisfies every set constraint.
    pub fn matches(&self, record: &PurchaseRecord) -> bool {
        fn field_ok(constraint: &Option<String>, value: &str) -> bool {
            constraint.as_deref().map_or(true, |c| c == value)
        }

        field_ok(&self.buyer, &record.buyer)
            && field_ok(&self.supplier, &record.supplier)
            && field_ok(&self.destination_city, &record.destination_city)
            && self.date_from.map_or(true, |from| record.purchase_date >= from)
            && self.date_to.map_or(true, |to| record.purchase_date <= to)
    }

    /// The subsequence of `records` matching this filter, order preserved.
    pub fn apply<'a>(&self, records: &'a [PurchaseRecord]) -> Vec<&'a PurchaseRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Headline numbers for a record set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub count: usize,
    pub quantity_sum: f64,
    pub distinct_supplier_count: usize,
    pub distinct_item_count: usize,
}

/// Compute KPIs. An empty set yields all zeros.
pub fn compute_kpis<'a, I>(records: I) -> Kpis
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let mut kpis = Kpis::default();
    let mut suppliers = HashSet::new();
    let mut items = HashSet::new();

    for record in records {
        kpis.count += 1;
        kpis.quantity_sum += record.quantity;
        suppliers.insert(record.supplier.as_str());
        items.insert(record.item_description.as_str());
    }

    kpis.distinct_supplier_count = suppliers.len();
    kpis.distinct_item_count = items.len();
    kpis
}

/// One description with its summed quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroupedItem {
    pub description: String,
    pub quantity: f64,
}

/// Group by exact item description and sum quantities, ascending by description.
///
/// Descriptions differing only by case or surrounding whitespace stay separate.
pub fn group_by_description<'a, I>(records: I) -> Vec<GroupedItem>
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for record in records {
        *groups.entry(record.item_description.as_str()).or_insert(0.0) += record.quantity;
    }

    groups
        .into_iter()
        .map(|(description, quantity)| GroupedItem {
            description: description.to_string(),
            quantity,
        })
        .collect()
}

/// A text column of [`PurchaseRecord`] usable as a selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordField {
    Buyer,
    Supplier,
    DestinationCity,
    Item,
}

impl RecordField {
    fn get(self, record: &PurchaseRecord) -> &str {
        match self {
            RecordField::Buyer => &record.buyer,
            RecordField::Supplier => &record.supplier,
            RecordField::DestinationCity => &record.destination_city,
            RecordField::Item => &record.item_description,
        }
    }
}

/// Sorted unique values of one field, for filter and order selectors.
pub fn distinct_values<'a, I>(records: I, field: RecordField) -> Vec<String>
where
    I: IntoIterator<Item = &'a PurchaseRecord>,
{
    records
        .into_iter()
        .map(|r| field.get(r))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewPurchase, RecordId, Timestamp};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: u64, supplier: &str, on: NaiveDate, item: &str, quantity: f64) -> PurchaseRecord {
        NewPurchase {
            buyer: if id % 2 == 0 { "Ana".into() } else { "Bruno".into() },
            purchase_date: on,
            supplier: supplier.into(),
            destination_city: "Recife".into(),
            item_description: item.into(),
            quantity,
        }
        .into_record(RecordId(id), Timestamp(0))
    }

    fn sample() -> Vec<PurchaseRecord> {
        vec![
            record(1, "Acme", date(2024, 1, 10), "toner", 2.0),
            record(2, "Acme", date(2024, 2, 10), "toner", 3.0),
            record(3, "Globex", date(2024, 2, 15), "cable", 5.0),
            record(4, "Globex", date(2024, 3, 1), "paper", 1.0),
        ]
    }

    #[test]
    fn test_unset_filter_passes_everything() {
        let records = sample();
        assert_eq!(RecordFilter::any().apply(&records).len(), records.len());
    }

    #[test]
    fn test_filter_and_semantics() {
        let records = sample();
        let filter = RecordFilter::any()
            .supplier("Acme")
            .date_from(date(2024, 2, 1));

        let ids: Vec<u64> = filter.apply(&records).iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_date_bounds_are_inclusive() {
        let records = sample();
        let filter = RecordFilter::any()
            .date_from(date(2024, 2, 10))
            .date_to(date(2024, 2, 15));

        let ids: Vec<u64> = filter.apply(&records).iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_buyer_and_city_constraints() {
        let records = sample();
        let ids: Vec<u64> = RecordFilter::any()
            .buyer("Ana")
            .destination_city("Recife")
            .apply(&records)
            .iter()
            .map(|r| r.id.0)
            .collect();
        assert_eq!(ids, vec![2, 4]);

        assert!(RecordFilter::any()
            .destination_city("recife")
            .apply(&records)
            .is_empty());
    }

    #[test]
    fn test_kpis_empty() {
        let kpis = compute_kpis(&[]);
        assert_eq!(
            kpis,
            Kpis {
                count: 0,
                quantity_sum: 0.0,
                distinct_supplier_count: 0,
                distinct_item_count: 0,
            }
        );
    }

    #[test]
    fn test_kpis() {
        let records = sample();
        let kpis = compute_kpis(&records);
        assert_eq!(kpis.count, 4);
        assert_eq!(kpis.quantity_sum, 11.0);
        assert_eq!(kpis.distinct_supplier_count, 2);
        assert_eq!(kpis.distinct_item_count, 3);
    }

    #[test]
    fn test_group_by_description() {
        let records = vec![
            record(1, "Acme", date(2024, 1, 1), "toner", 2.0),
            record(2, "Acme", date(2024, 1, 1), "cable", 5.0),
            record(3, "Acme", date(2024, 1, 1), "toner", 3.0),
        ];

        let groups = group_by_description(&records);
        assert_eq!(
            groups,
            vec![
                GroupedItem {
                    description: "cable".into(),
                    quantity: 5.0
                },
                GroupedItem {
                    description: "toner".into(),
                    quantity: 5.0
                },
            ]
        );
    }

    #[test]
    fn test_group_keeps_near_duplicates_apart() {
        let records = vec![
            record(1, "Acme", date(2024, 1, 1), "Toner", 1.0),
            record(2, "Acme", date(2024, 1, 1), "toner", 1.0),
            record(3, "Acme", date(2024, 1, 1), "toner ", 1.0),
        ];
        assert_eq!(group_by_description(&records).len(), 3);
    }

    #[test]
    fn test_distinct_values_sorted() {
        let records = sample();
        assert_eq!(
            distinct_values(&records, RecordField::Supplier),
            vec!["Acme".to_string(), "Globex".to_string()]
        );
        assert_eq!(
            distinct_values(RecordFilter::any().supplier("Globex").apply(&records), RecordField::Item),
            vec!["cable".to_string(), "paper".to_string()]
        );
    }
}
