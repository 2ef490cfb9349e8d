//! This module provides a deterministic hasher and a `HashMap` variant that uses
//! it. The hashing data structures in the standard library are randomly seeded, which would make
//! iteration order (and therefore anything sampled while iterating) differ between two runs with
//! the same random seed.
//!
//! `HashMap<K, V, S>` does not have a `new` method for a non-default hasher. Use
//! `HashMap::default()` instead, or bring `HashMapExt` into scope.
//!
//! The `hash_str` free function is used to derive per-stream seeds in `crate::random`.

use std::hash::BuildHasherDefault;

use rustc_hash::FxHasher;
use xxhash_rust::xxh3::xxh3_64;

pub type HashMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;

pub trait HashMapExt {
    fn new() -> Self;
}

impl<K, V> HashMapExt for HashMap<K, V> {
    fn new() -> Self {
        HashMap::default()
    }
}

/// A convenience method to compute the hash of a `&str`. Stable across platforms and runs.
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}
