use serde_json::Value;

use super::corporate_actions_errors::CorporateActionError;
use super::corporate_actions_model::{Dividend, FromPayload, OrderedAction, Split};
use crate::utils::time_utils::TimestampFormat;

/// Sorted, deduplicated container of one corporate-action variant.
///
/// Invariants: elements are ordered by their sort key, and no two elements
/// compare fully equal. The registry only grows; there is no removal.
///
/// Duplicate detection is positional: a candidate is compared against the
/// element at the leftmost slot for its sort key, nothing else. Two distinct
/// actions sharing a key therefore both stay, and membership of the later
/// one is only visible through iteration. Converged datasets depend on this
/// behavior; do not switch to key-based replacement here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRegistry<A: OrderedAction> {
    actions: Vec<A>,
}

pub type SplitRegistry = ActionRegistry<Split>;
pub type DividendRegistry = ActionRegistry<Dividend>;

impl<A: OrderedAction> ActionRegistry<A> {
    pub fn new() -> Self {
        Self { actions: Vec::new() }
    }

    /// Build a registry from a batch of provider payloads, all-or-nothing:
    /// one malformed payload fails the batch and no registry is produced.
    pub fn parse_batch(
        payloads: &[Value],
        format: TimestampFormat,
    ) -> Result<Self, CorporateActionError>
    where
        A: FromPayload,
    {
        let mut registry = Self::new();
        for payload in payloads {
            let action = A::from_payload(payload, format)?;
            registry.insert_if_absent(action);
        }
        Ok(registry)
    }

    /// Insert unless an equal action is already registered. Returns whether
    /// the registry grew. Placement is rightmost among equal sort keys.
    pub fn insert_if_absent(&mut self, action: A) -> bool {
        if self.contains(&action) {
            return false;
        }
        let at = self
            .actions
            .partition_point(|existing| existing.sort_key() <= action.sort_key());
        self.actions.insert(at, action);
        true
    }

    /// Binary search on the sort key, then a full equality check at the
    /// found index only. Sound because the vector is sorted by that key.
    pub fn contains(&self, action: &A) -> bool {
        let at = self
            .actions
            .partition_point(|existing| existing.sort_key() < action.sort_key());
        self.actions.get(at).is_some_and(|existing| existing == action)
    }

    /// Absorb every element of `other`; the outcome does not depend on
    /// `other`'s internal order, only on the sort keys.
    pub fn merge_from(&mut self, other: &Self) {
        for action in &other.actions {
            self.insert_if_absent(action.clone());
        }
    }

    pub fn count(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&A> {
        self.actions.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, A> {
        self.actions.iter()
    }
}

impl<'a, A: OrderedAction> IntoIterator for &'a ActionRegistry<A> {
    type Item = &'a A;
    type IntoIter = std::slice::Iter<'a, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corporate_actions::corporate_actions_model::Split;
    use chrono::{NaiveDate, NaiveDateTime};

    fn split(symbol: &str, ex_date: (i32, u32, u32), from: i64, to: i64) -> Split {
        let date = NaiveDate::from_ymd_opt(ex_date.0, ex_date.1, ex_date.2).unwrap();
        Split::new(
            date,
            format!("{}-for-{} split", from, to),
            date,
            from,
            to,
            1,
            symbol.to_string(),
            "SPLITS".to_string(),
            symbol.to_string(),
            "1".to_string(),
            NaiveDateTime::default(),
        )
    }

    #[test]
    fn duplicate_insert_is_a_noop() {
        let mut registry = SplitRegistry::new();
        let action = split("AAPL", (2020, 6, 1), 1, 2);
        assert!(registry.insert_if_absent(action.clone()));
        assert!(!registry.insert_if_absent(action));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn iteration_is_sorted_by_execution_date() {
        let mut registry = SplitRegistry::new();
        registry.insert_if_absent(split("AAPL", (2021, 3, 15), 1, 4));
        registry.insert_if_absent(split("AAPL", (2019, 1, 2), 1, 2));
        registry.insert_if_absent(split("AAPL", (2020, 8, 31), 1, 3));

        let dates: Vec<_> = registry.iter().map(|s| s.execution_date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }

    #[test]
    fn merge_is_insensitive_to_source_order() {
        let a = split("AAPL", (2020, 6, 1), 1, 2);
        let b = split("AAPL", (2020, 8, 31), 1, 3);
        let c = split("AAPL", (2021, 3, 15), 1, 4);

        let mut forward = SplitRegistry::new();
        for s in [&a, &b, &c] {
            forward.insert_if_absent(s.clone());
        }
        let mut backward = SplitRegistry::new();
        for s in [&c, &b, &a] {
            backward.insert_if_absent(s.clone());
        }

        let mut merged = SplitRegistry::new();
        merged.merge_from(&backward);
        for s in [&a, &b, &c] {
            assert!(merged.contains(s));
        }
        assert_eq!(merged, forward);
    }

    #[test]
    fn distinct_actions_sharing_a_date_are_both_retained() {
        let first = split("AAPL", (2020, 6, 1), 1, 2);
        let second = split("AAPL", (2020, 6, 1), 1, 3);

        let mut registry = SplitRegistry::new();
        assert!(registry.insert_if_absent(first.clone()));
        assert!(registry.insert_if_absent(second.clone()));
        assert_eq!(registry.count(), 2);

        // Only the leftmost slot for the shared key is consulted.
        assert!(registry.contains(&first));
        assert!(!registry.contains(&second));
    }

    #[test]
    fn get_out_of_range_is_absent() {
        let registry = SplitRegistry::new();
        assert!(registry.get(0).is_none());
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn parse_batch_is_all_or_nothing() {
        use super::super::corporate_actions_model::tests::split_payload;

        let good = split_payload("AAPL", "2020-06-01");
        let mut bad = split_payload("AAPL", "2020-08-31");
        bad.as_object_mut().unwrap().remove("refid");

        let result =
            SplitRegistry::parse_batch(&[good.clone(), bad], TimestampFormat::EpochSeconds);
        assert!(result.is_err());

        let registry =
            SplitRegistry::parse_batch(&[good.clone(), good], TimestampFormat::EpochSeconds)
                .unwrap();
        assert_eq!(registry.count(), 1);
    }
}
