use std::collections::HashSet;

use nl_core::Publication;

pub mod json;
pub mod memory;

pub use json::JsonFileStorage;
pub use memory::MemoryStorage;

/// Appends the publications not stored yet, keyed by fingerprint. Returns how many were added.
pub(crate) fn merge(stored: &mut Vec<Publication>, incoming: &[Publication]) -> usize {
    let mut known: HashSet<String> = stored.iter().map(Publication::fingerprint).collect();
    let before = stored.len();
    for publication in incoming {
        if known.insert(publication.fingerprint()) {
            stored.push(publication.clone());
        }
    }
    stored.len() - before
}
