//! Case-insensitive filtering of the dataset.

use crate::models::Entry;

/// Entries matching `query`, paired with their position in `entries`.
///
/// A blank query matches everything. Otherwise an entry matches when its
/// name, any author, any tag or its description contains the query as
/// typed, ignoring case. Relative order is preserved.
pub fn filter<'a>(entries: &'a [Entry], query: &str) -> Vec<(usize, &'a Entry)> {
    if query.trim().is_empty() {
        return entries.iter().enumerate().collect();
    }
    let needle = query.to_lowercase();
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry_matches(entry, &needle))
        .collect()
}

/// Positions of the entries matching `query`.
pub fn matching_indices(entries: &[Entry], query: &str) -> Vec<usize> {
    filter(entries, query)
        .into_iter()
        .map(|(index, _)| index)
        .collect()
}

/// Whether `entry` contains the already lower-cased `needle`.
pub fn entry_matches(entry: &Entry, needle: &str) -> bool {
    entry.name.to_lowercase().contains(needle)
        || entry
            .authors
            .iter()
            .any(|author| author.to_lowercase().contains(needle))
        || entry
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
        || entry.description.to_lowercase().contains(needle)
}
