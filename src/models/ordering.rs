use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{ValidationError, ValidationResult};

/// Position given to records that were never ordered
pub const UNORDERED_POSITION: i32 = 9999;

/// Anything listed by display order
pub trait Ordered {
    fn order_id(&self) -> &str;
    fn display_order(&self) -> Option<i32>;
}

/// A display order that has to be written back to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAssignment {
    pub id: String,
    pub display_order: i32,
}

/// Full ordering submitted after a drag-and-drop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderRequest {
    pub ordered_ids: Vec<String>,
}

/// Single drag gesture: element at `from` dropped at `to`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderFailure {
    pub id: String,
    pub error: String,
}

/// Result of persisting a reorder. Writes are independent, so some may fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    pub updated: Vec<OrderAssignment>,
    pub unchanged: usize,
    pub failed: Vec<ReorderFailure>,
}

impl ReorderOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Stable sort by display order; unordered records go last
pub fn sort_by_display_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.display_order().unwrap_or(UNORDERED_POSITION));
}

/// Order for a record appended to a list of `existing` records
pub fn next_display_order(existing: usize) -> i32 {
    i32::try_from(existing).map_or(UNORDERED_POSITION, |n| n.saturating_add(1))
}

/// Remove the element at `from` and reinsert it at `to`
pub fn move_item<T>(list: &mut Vec<T>, from: usize, to: usize) -> ValidationResult<()> {
    let len = list.len();
    if from >= len || to >= len {
        return Err(ValidationError::InvalidOrdering {
            reason: format!("move {} -> {} is outside a list of {}", from, to, len),
        });
    }
    let element = list.remove(from);
    list.insert(to, element);
    Ok(())
}

/// The requested ordering must name every current id exactly once
pub fn validate_permutation(current: &[&str], requested: &[String]) -> ValidationResult<()> {
    let known: HashSet<&str> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !known.contains(id.as_str()) {
            return Err(ValidationError::InvalidOrdering {
                reason: format!("unknown id {}", id),
            });
        }
        if !seen.insert(id.as_str()) {
            return Err(ValidationError::InvalidOrdering {
                reason: format!("duplicate id {}", id),
            });
        }
    }

    if let Some(missing) = current.iter().find(|id| !seen.contains(**id)) {
        return Err(ValidationError::InvalidOrdering {
            reason: format!("missing id {}", missing),
        });
    }

    Ok(())
}

/// Rearrange `items` to follow `ordered_ids`
pub fn apply_permutation<T: Ordered>(
    items: Vec<T>,
    ordered_ids: &[String],
) -> ValidationResult<Vec<T>> {
    let current: Vec<&str> = items.iter().map(Ordered::order_id).collect();
    validate_permutation(&current, ordered_ids)?;

    let mut by_id: HashMap<String, T> = items
        .into_iter()
        .map(|item| (item.order_id().to_string(), item))
        .collect();

    Ok(ordered_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect())
}

/// Display orders `1..=n` for the list as given, skipping records already in place
pub fn renumber<T: Ordered>(ordered: &[T]) -> Vec<OrderAssignment> {
    ordered
        .iter()
        .zip(1..)
        .filter(|(item, position)| item.display_order() != Some(*position))
        .map(|(item, position)| OrderAssignment {
            id: item.order_id().to_string(),
            display_order: position,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, Option<i32>);

    impl Ordered for Row {
        fn order_id(&self) -> &str {
            self.0
        }

        fn display_order(&self) -> Option<i32> {
            self.1
        }
    }

    fn ids(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.0).collect()
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sort_puts_unordered_last_and_is_stable() {
        let mut rows = vec![
            Row("a", None),
            Row("b", Some(2)),
            Row("c", Some(1)),
            Row("d", Some(2)),
        ];
        sort_by_display_order(&mut rows);
        assert_eq!(ids(&rows), vec!["c", "b", "d", "a"]);
    }

    #[test]
    fn test_move_item_forward_and_back() {
        let mut list = vec!["a", "b", "c", "d"];
        move_item(&mut list, 0, 2).unwrap();
        assert_eq!(list, vec!["b", "c", "a", "d"]);

        move_item(&mut list, 3, 0).unwrap();
        assert_eq!(list, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn test_move_item_out_of_range() {
        let mut list = vec!["a", "b"];
        assert!(move_item(&mut list, 0, 2).is_err());
        assert!(move_item(&mut Vec::<u8>::new(), 0, 0).is_err());
        assert_eq!(list, vec!["a", "b"]);
    }

    #[test]
    fn test_validate_permutation_rejections() {
        let current = ["a", "b", "c"];

        assert!(validate_permutation(&current, &owned(&["c", "a", "b"])).is_ok());

        let err = validate_permutation(&current, &owned(&["a", "b"])).unwrap_err();
        assert!(err.to_string().contains("missing id c"));

        let err = validate_permutation(&current, &owned(&["a", "a", "b", "c"])).unwrap_err();
        assert!(err.to_string().contains("duplicate id a"));

        let err = validate_permutation(&current, &owned(&["a", "b", "x"])).unwrap_err();
        assert!(err.to_string().contains("unknown id x"));
    }

    #[test]
    fn test_apply_permutation() {
        let rows = vec![Row("a", Some(1)), Row("b", Some(2)), Row("c", Some(3))];
        let reordered = apply_permutation(rows, &owned(&["b", "c", "a"])).unwrap();
        assert_eq!(ids(&reordered), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_renumber_reports_only_changes() {
        let rows = vec![Row("b", Some(2)), Row("a", Some(1)), Row("c", Some(3))];
        let assignments = renumber(&rows);
        assert_eq!(
            assignments,
            vec![
                OrderAssignment {
                    id: "b".to_string(),
                    display_order: 1
                },
                OrderAssignment {
                    id: "a".to_string(),
                    display_order: 2
                },
            ]
        );
    }

    #[test]
    fn test_renumber_closes_gaps_and_duplicates() {
        let rows = vec![Row("a", Some(5)), Row("b", Some(5)), Row("c", None)];
        let orders: Vec<i32> = renumber(&rows).iter().map(|a| a.display_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_next_display_order() {
        assert_eq!(next_display_order(0), 1);
        assert_eq!(next_display_order(7), 8);
    }
}
