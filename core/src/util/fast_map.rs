//! FxHash-backed maps for the VM's register file and function table.

use std::hash::Hash;

pub type FastHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

#[inline]
pub fn fast_hash_map_new<K, V>() -> FastHashMap<K, V> {
    rustc_hash::FxHashMap::default()
}

/// Keys in ascending order; FxHashMap iteration order is unspecified.
pub fn sorted_keys<K: Copy + Ord + Hash, V>(map: &FastHashMap<K, V>) -> Vec<K> {
    let mut keys: Vec<K> = map.keys().copied().collect();
    keys.sort_unstable();
    keys
}
