//! Ordering engine: contiguous re-indexing
//!
//! Sorts a sibling set by its stored order index and computes the minimal
//! set of corrections needed to make the indices exactly `0..n`, without
//! reordering items that are already in place.

use costline_storage::{Group, IndexEntity, LineItem};

use crate::errors::{EngineError, Result};

/// An item carrying a persisted order index
///
/// The index is `Option` because drifted rows may carry none; every
/// ordering operation requires it to be present and fails with
/// [`EngineError::MalformedIndex`] otherwise.
pub trait Ordered {
    /// Which entity kind this is, for mapping corrections to persistence
    fn index_entity() -> IndexEntity
    where
        Self: Sized;

    fn item_id(&self) -> &str;
    fn order_index(&self) -> Option<i64>;
    fn set_order_index(&mut self, index: i64);
}

impl Ordered for Group {
    fn index_entity() -> IndexEntity {
        IndexEntity::Group
    }

    fn item_id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> Option<i64> {
        self.index_in_category
    }

    fn set_order_index(&mut self, index: i64) {
        self.index_in_category = Some(index);
    }
}

impl Ordered for LineItem {
    fn index_entity() -> IndexEntity {
        IndexEntity::LineItem
    }

    fn item_id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> Option<i64> {
        self.index_in_group
    }

    fn set_order_index(&mut self, index: i64) {
        self.index_in_group = Some(index);
    }
}

/// One in-memory index correction: `id`'s order index becomes `new_index`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub id: String,
    pub new_index: i64,
}

/// Sort `items` ascending by stored index and repair gaps and duplicates
///
/// After the call the slice's indices are exactly `0..n` in slice order.
/// The returned corrections name exactly the items whose index changed,
/// so callers can issue minimal persistence writes. Idempotent: an
/// already-contiguous collection yields no corrections.
///
/// The sort is stable (ties keep their original relative order).
///
/// # Errors
///
/// [`EngineError::MalformedIndex`] if any item has no stored index.
pub fn reindex<T: Ordered>(items: &mut [T]) -> Result<Vec<Correction>> {
    for item in items.iter() {
        if item.order_index().is_none() {
            return Err(EngineError::malformed_index(
                T::index_entity(),
                item.item_id(),
            ));
        }
    }

    // Vec::sort_by is a stable sort; Option ordering is irrelevant here
    // since every index was just checked to be Some
    items.sort_by(|a, b| a.order_index().cmp(&b.order_index()));

    let mut corrections = Vec::new();
    for (position, item) in items.iter_mut().enumerate() {
        let assigned = position as i64;
        if item.order_index() != Some(assigned) {
            item.set_order_index(assigned);
            corrections.push(Correction {
                id: item.item_id().to_string(),
                new_index: assigned,
            });
        }
    }
    Ok(corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use costline_storage::Category;

    fn group(id: &str, index: Option<i64>) -> Group {
        let mut g = Group::new(id, "a1", Category::new("c1", "Products"), 0);
        g.index_in_category = index;
        g
    }

    fn indices(groups: &[Group]) -> Vec<i64> {
        groups.iter().filter_map(|g| g.index_in_category).collect()
    }

    #[test]
    fn test_contiguous_input_is_untouched() {
        let mut groups = vec![group("g1", Some(0)), group("g2", Some(1)), group("g3", Some(2))];
        let corrections = reindex(&mut groups).unwrap();
        assert!(corrections.is_empty());
        assert_eq!(indices(&groups), vec![0, 1, 2]);
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let mut groups = vec![group("g1", Some(4)), group("g2", Some(9))];
        let first = reindex(&mut groups).unwrap();
        assert_eq!(first.len(), 2);

        let second = reindex(&mut groups).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_gaps_are_closed() {
        let mut groups = vec![group("g1", Some(3)), group("g2", Some(7)), group("g3", Some(12))];
        let corrections = reindex(&mut groups).unwrap();

        assert_eq!(indices(&groups), vec![0, 1, 2]);
        assert_eq!(corrections.len(), 3);
        assert_eq!(corrections[0].id, "g1");
        assert_eq!(corrections[0].new_index, 0);
    }

    #[test]
    fn test_only_changed_items_emit_corrections() {
        let mut groups = vec![group("g1", Some(0)), group("g2", Some(5))];
        let corrections = reindex(&mut groups).unwrap();

        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].id, "g2");
        assert_eq!(corrections[0].new_index, 1);
    }

    #[test]
    fn test_sort_precedes_assignment() {
        let mut groups = vec![group("g1", Some(2)), group("g2", Some(0)), group("g3", Some(1))];
        let corrections = reindex(&mut groups).unwrap();

        // Sorted order g2, g3, g1 already carries contiguous indices
        assert!(corrections.is_empty());
        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g2", "g3", "g1"]);
    }

    #[test]
    fn test_ties_keep_encounter_order() {
        let mut groups = vec![group("g1", Some(1)), group("g2", Some(1)), group("g3", Some(1))];
        reindex(&mut groups).unwrap();

        let ids: Vec<&str> = groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
        assert_eq!(indices(&groups), vec![0, 1, 2]);
    }

    #[test]
    fn test_missing_index_is_malformed() {
        let mut groups = vec![group("g1", Some(0)), group("g2", None)];
        let err = reindex(&mut groups).unwrap_err();
        match err {
            EngineError::MalformedIndex { entity, id } => {
                assert_eq!(entity, IndexEntity::Group);
                assert_eq!(id, "g2");
            }
            other => panic!("expected MalformedIndex, got {:?}", other),
        }
    }

    #[test]
    fn test_line_items_reindex_too() {
        let mut items = vec![
            {
                let mut li = LineItem::new("li1", "g1", "A", 0);
                li.index_in_group = Some(10);
                li
            },
            {
                let mut li = LineItem::new("li2", "g1", "B", 0);
                li.index_in_group = Some(-3);
                li
            },
        ];
        let corrections = reindex(&mut items).unwrap();

        assert_eq!(items[0].id, "li2");
        assert_eq!(items[0].index_in_group, Some(0));
        assert_eq!(items[1].index_in_group, Some(1));
        assert_eq!(corrections.len(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let mut groups: Vec<Group> = Vec::new();
        assert!(reindex(&mut groups).unwrap().is_empty());
    }
}
