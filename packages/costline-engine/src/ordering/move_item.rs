//! Index reassignment: move an item to a target position
//!
//! A move is a rotation of the affected sub-range: only siblings whose
//! index lies between the old and new positions shift, everything else is
//! untouched.

use crate::errors::{EngineError, Result};

use super::reindex::{Correction, Ordered};

/// Compute the corrections realizing a move of `moved_id` to `new_index`
///
/// Expects `siblings` to already carry contiguous `0..n` indices (reads
/// run through the reconciler first). Returns one correction per affected
/// sibling; applying them all keeps the indices a contiguous permutation
/// with the moved item at exactly `new_index`. Moving an item onto its
/// current position returns no corrections.
///
/// # Errors
///
/// - [`EngineError::ItemNotFound`] if `moved_id` is not among `siblings`
/// - [`EngineError::IndexOutOfRange`] unless `0 <= new_index < len`
/// - [`EngineError::MalformedIndex`] if any sibling has no stored index
pub fn move_to_index<T: Ordered>(
    siblings: &[T],
    moved_id: &str,
    new_index: i64,
) -> Result<Vec<Correction>> {
    for item in siblings {
        if item.order_index().is_none() {
            return Err(EngineError::malformed_index(
                T::index_entity(),
                item.item_id(),
            ));
        }
    }

    // Every index is Some at this point, so and_then cannot misreport
    let old_index = siblings
        .iter()
        .find(|item| item.item_id() == moved_id)
        .and_then(|item| item.order_index())
        .ok_or_else(|| EngineError::item_not_found(moved_id))?;

    if new_index < 0 || new_index >= siblings.len() as i64 {
        return Err(EngineError::IndexOutOfRange {
            index: new_index,
            len: siblings.len(),
        });
    }

    if old_index == new_index {
        return Ok(Vec::new());
    }

    let lower = old_index.min(new_index);
    let upper = old_index.max(new_index);
    // Forward move shifts the displaced range down, backward move up
    let shift = if old_index < new_index { -1 } else { 1 };

    let mut corrections = Vec::new();
    for item in siblings {
        let index = match item.order_index() {
            Some(index) => index,
            None => continue,
        };
        if index < lower || index > upper {
            continue;
        }
        let updated = if item.item_id() == moved_id {
            new_index
        } else {
            index + shift
        };
        corrections.push(Correction {
            id: item.item_id().to_string(),
            new_index: updated,
        });
    }
    Ok(corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use costline_storage::{Category, Group};

    fn siblings(n: i64) -> Vec<Group> {
        (0..n)
            .map(|i| Group::new(format!("g{}", i), "a1", Category::new("c1", "Products"), i))
            .collect()
    }

    fn apply(groups: &mut [Group], corrections: &[Correction]) {
        for correction in corrections {
            let group = groups
                .iter_mut()
                .find(|g| g.id == correction.id)
                .expect("correction targets a sibling");
            group.index_in_category = Some(correction.new_index);
        }
    }

    fn sorted_ids(groups: &mut [Group]) -> Vec<String> {
        groups.sort_by_key(|g| g.index_in_category);
        groups.iter().map(|g| g.id.clone()).collect()
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let groups = siblings(4);
        let corrections = move_to_index(&groups, "g2", 2).unwrap();
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_forward_move_shifts_range_down() {
        let mut groups = siblings(5);
        let corrections = move_to_index(&groups, "g1", 3).unwrap();

        // Affected range is [1, 3]: g1 lands on 3, g2 and g3 shift down
        assert_eq!(corrections.len(), 3);
        apply(&mut groups, &corrections);
        assert_eq!(sorted_ids(&mut groups), vec!["g0", "g2", "g3", "g1", "g4"]);
    }

    #[test]
    fn test_backward_move_shifts_range_up() {
        let mut groups = siblings(5);
        let corrections = move_to_index(&groups, "g3", 0).unwrap();

        assert_eq!(corrections.len(), 4);
        apply(&mut groups, &corrections);
        assert_eq!(sorted_ids(&mut groups), vec!["g3", "g0", "g1", "g2", "g4"]);
    }

    #[test]
    fn test_move_to_last_position() {
        let mut groups = siblings(3);
        let corrections = move_to_index(&groups, "g0", 2).unwrap();

        apply(&mut groups, &corrections);
        assert_eq!(sorted_ids(&mut groups), vec!["g1", "g2", "g0"]);
    }

    #[test]
    fn test_result_is_contiguous_permutation() {
        let mut groups = siblings(6);
        let corrections = move_to_index(&groups, "g4", 1).unwrap();
        apply(&mut groups, &corrections);

        let mut indices: Vec<i64> = groups.iter().filter_map(|g| g.index_in_category).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unknown_id_is_rejected() {
        let groups = siblings(3);
        let err = move_to_index(&groups, "ghost", 1).unwrap_err();
        match err {
            EngineError::ItemNotFound(id) => assert_eq!(id, "ghost"),
            other => panic!("expected ItemNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_target_is_rejected() {
        let groups = siblings(3);

        let err = move_to_index(&groups, "g0", 3).unwrap_err();
        assert!(matches!(err, EngineError::IndexOutOfRange { index: 3, len: 3 }));

        let err = move_to_index(&groups, "g0", -1).unwrap_err();
        assert!(matches!(err, EngineError::IndexOutOfRange { index: -1, .. }));
    }

    #[test]
    fn test_missing_sibling_index_is_malformed() {
        let mut groups = siblings(3);
        groups[2].index_in_category = None;
        let err = move_to_index(&groups, "g0", 1).unwrap_err();
        assert!(matches!(err, EngineError::MalformedIndex { .. }));
    }

    #[test]
    fn test_untouched_siblings_emit_no_corrections() {
        let groups = siblings(6);
        let corrections = move_to_index(&groups, "g2", 4).unwrap();

        let touched: Vec<&str> = corrections.iter().map(|c| c.id.as_str()).collect();
        assert!(!touched.contains(&"g0"));
        assert!(!touched.contains(&"g1"));
        assert!(!touched.contains(&"g5"));
    }
}
