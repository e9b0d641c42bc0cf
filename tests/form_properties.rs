//! Property tests for line-item form transitions.

use chrono::NaiveDate;
use proptest::prelude::*;
use purchase_ledger::{LineItem, LineItemForm};

#[derive(Clone, Debug)]
enum Op {
    Add,
    /// 1-based position, possibly out of range.
    Remove(usize),
    Set(usize, String, f64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8, "[a-z]{1,6}", 0.5f64..100.0).prop_map(|(i, d, q)| Op::Set(i, d, q)),
    ]
}

fn form() -> LineItemForm {
    LineItemForm::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
}

proptest! {
    /// Every transition leaves the form equal to the same edits applied to a
    /// plain `Vec`, and never drops below one slot.
    #[test]
    fn prop_slots_follow_vec_model(ops in prop::collection::vec(op(), 0..60)) {
        let mut form = form();
        let mut model = vec![LineItem::default()];

        for op in ops {
            match op {
                Op::Add => {
                    model.push(LineItem::default());
                    prop_assert_eq!(form.add_slot(), model.len());
                }
                Op::Remove(position) => {
                    let allowed = model.len() > 1 && (1..=model.len()).contains(&position);
                    let result = form.remove_slot(position);
                    prop_assert_eq!(result.is_ok(), allowed);
                    if allowed {
                        let removed = model.remove(position - 1);
                        prop_assert_eq!(result.unwrap(), removed);
                    }
                }
                Op::Set(index, description, quantity) => {
                    let item = LineItem::new(description, quantity);
                    let result = form.set_slot(index, item.clone());
                    prop_assert_eq!(result.is_ok(), index < model.len());
                    if let Some(slot) = model.get_mut(index) {
                        *slot = item;
                    }
                }
            }

            prop_assert!(form.count() >= 1);
            prop_assert_eq!(form.slots(), model.as_slice());
        }
    }

    /// Removing position k keeps slots before k and shifts the rest down.
    #[test]
    fn prop_remove_renumbers(count in 2usize..12, pick in 0usize..12) {
        let position = pick % count + 1;
        let mut form = form();
        for i in 0..count {
            if i > 0 {
                form.add_slot();
            }
            form.set_slot(i, LineItem::new(format!("item {}", i), (i + 1) as f64)).unwrap();
        }
        let before = form.slots().to_vec();

        form.remove_slot(position).unwrap();

        prop_assert_eq!(form.count(), count - 1);
        for (j, slot) in form.slots().iter().enumerate() {
            let source = if j + 1 < position { j } else { j + 1 };
            prop_assert_eq!(slot, &before[source]);
        }
    }
}
