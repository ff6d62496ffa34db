//! Category partitioning
//!
//! Groups are only ordered relative to siblings sharing the same (area,
//! category), so an area's groups are partitioned per category before
//! each partition is re-indexed independently. Line items need no
//! partitioning: their group is already the partition.

use std::collections::HashMap;
use std::hash::Hash;

/// Partition `items` by `key_fn`, preserving encounter order within each
/// partition
pub fn partition_by_key<T, K, F>(items: Vec<T>, key_fn: F) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut partitions: HashMap<K, Vec<T>> = HashMap::new();
    for item in items {
        partitions.entry(key_fn(&item)).or_default().push(item);
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_by_key() {
        let items = vec![("products", 1), ("labor", 2), ("products", 3)];
        let partitions = partition_by_key(items, |(category, _)| *category);

        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions["products"], vec![("products", 1), ("products", 3)]);
        assert_eq!(partitions["labor"], vec![("labor", 2)]);
    }

    #[test]
    fn test_encounter_order_is_preserved() {
        let items = vec![("a", 3), ("b", 1), ("a", 1), ("a", 2)];
        let partitions = partition_by_key(items, |(key, _)| *key);

        let values: Vec<i32> = partitions["a"].iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_input() {
        let partitions = partition_by_key(Vec::<(&str, i32)>::new(), |(key, _)| *key);
        assert!(partitions.is_empty());
    }
}
