//! Wildcard key matching for `exports` and `imports` maps.

/// Split a key on its wildcard.
///
/// Returns `(prefix, suffix)` only when the key contains exactly one `*`.
#[must_use]
pub fn split_star(key: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = key.split_once('*')?;
    if suffix.contains('*') {
        return None;
    }
    Some((prefix, suffix))
}

/// Find the pattern key that matches `candidate`.
///
/// Only keys with exactly one `*` and no longer than the candidate are
/// considered. Longer keys win; among keys of equal length declaration order
/// is kept. Returns the matched key and the text the `*` stands for.
pub fn find_star_match<'k, 'c, I>(candidate: &'c str, keys: I) -> Option<(&'k str, &'c str)>
where
    I: IntoIterator<Item = &'k str>,
{
    let mut patterns: Vec<(&'k str, &'k str, &'k str)> = keys
        .into_iter()
        .filter(|key| key.len() <= candidate.len())
        .filter_map(|key| split_star(key).map(|(prefix, suffix)| (key, prefix, suffix)))
        .collect();

    // stable: ties keep declaration order
    patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    patterns.into_iter().find_map(|(key, prefix, suffix)| {
        if candidate.starts_with(prefix) && candidate.ends_with(suffix) {
            Some((key, &candidate[prefix.len()..candidate.len() - suffix.len()]))
        } else {
            None
        }
    })
}
