//! Resolution order computation shared by classes and interfaces.
//!
//! Uses C3 linearization. Hierarchies without a consistent C3 order fall back
//! to a depth-first, left-to-right walk that keeps the first occurrence of
//! every entry, so lookups keep working on malformed input.

use std::sync::Arc;

/// Linearize the ancestors of an entry whose direct bases are `bases`.
///
/// `full_ro` must return the complete resolution order of a base, the base
/// itself included. The returned list excludes the entry being linearized.
pub(crate) fn linearize<T>(
    bases: &[Arc<T>],
    full_ro: impl Fn(&Arc<T>) -> Vec<Arc<T>>,
    key: impl Fn(&T) -> String,
) -> Vec<Arc<T>> {
    let mut sequences: Vec<Vec<Arc<T>>> = bases.iter().map(&full_ro).collect();
    sequences.push(bases.to_vec());

    let mut result: Vec<Arc<T>> = Vec::new();
    loop {
        sequences.retain(|sequence| !sequence.is_empty());
        if sequences.is_empty() {
            return result;
        }

        let candidate = sequences
            .iter()
            .map(|sequence| &sequence[0])
            .find(|head| {
                let head_key = key(head);
                !sequences
                    .iter()
                    .any(|sequence| sequence[1..].iter().any(|entry| key(entry) == head_key))
            })
            .cloned();

        match candidate {
            Some(next) => {
                let next_key = key(&next);
                for sequence in sequences.iter_mut() {
                    if key(&sequence[0]) == next_key {
                        sequence.remove(0);
                    }
                }
                result.push(next);
            }
            None => return depth_first(bases, &full_ro, &key),
        }
    }
}

fn depth_first<T>(
    bases: &[Arc<T>],
    full_ro: &impl Fn(&Arc<T>) -> Vec<Arc<T>>,
    key: &impl Fn(&T) -> String,
) -> Vec<Arc<T>> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for base in bases {
        for entry in full_ro(base) {
            if seen.insert(key(&entry)) {
                result.push(entry);
            }
        }
    }
    result
}
