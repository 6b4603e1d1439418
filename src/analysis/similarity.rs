//! Name similarity heuristic used to flag potential duplicate measurements.
//!
//! This is deliberately coarse: two names are similar when, once lower-cased
//! and stripped of `_` and `-`, one contains the other or their character
//! sets overlap by more than a threshold. It has no precision target and
//! will flag unrelated names that happen to share letters.

use std::collections::{BTreeSet, HashSet};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

/// Names shorter than this (after normalisation) are never compared.
const MIN_COMPARED_LENGTH: usize = 4;

pub fn normalize(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect()
}

/// Symmetric by construction: both tests are symmetric in `a` and `b`.
pub fn names_similar(a: &str, b: &str, threshold: f64) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len < MIN_COMPARED_LENGTH || b_len < MIN_COMPARED_LENGTH {
        return false;
    }

    if a.contains(b.as_str()) || b.contains(a.as_str()) {
        return true;
    }

    let a_chars: HashSet<char> = a.chars().collect();
    let b_chars: HashSet<char> = b.chars().collect();
    let shared = a_chars.intersection(&b_chars).count();
    shared as f64 / a_len.max(b_len) as f64 > threshold
}

/// Every name similar to at least one other name in the list.
pub fn duplicate_named<'a, I>(names: I, threshold: f64) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let mut duplicates = BTreeSet::new();
    for (i, first) in names.iter().enumerate() {
        for second in &names[i + 1..] {
            if names_similar(first, second, threshold) {
                duplicates.insert(first.to_string());
                duplicates.insert(second.to_string());
            }
        }
    }
    duplicates
}
