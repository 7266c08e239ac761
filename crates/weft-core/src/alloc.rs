//! Hash collections used throughout Weft.
//!
//! Lookup tables in the engine are keyed by attribute, method and event names.

pub use ahash::{AHashMap as HashMap, AHashSet as HashSet, RandomState};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashmap_string_keys() {
        let mut map = HashMap::new();
        map.insert("change:color".to_string(), 1);
        assert_eq!(map.get("change:color"), Some(&1));
        assert!(map.get("change:size").is_none());
    }

    #[test]
    fn test_hashset_contains() {
        let mut set = HashSet::new();
        set.insert("show");
        assert!(set.contains("show"));
        assert!(!set.contains("hide"));
    }
}
