//! Collapse a conditional value to a single target.

use super::manifest::ConditionalValue;
use crate::config::ActiveConditions;

/// Resolve a conditional value against the active conditions.
///
/// - a target resolves to itself; `null` and `""` resolve to `None`
/// - fallbacks return the first non-null result
/// - in a condition map the first active key wins, even when its value
///   resolves to `None`; later keys are not tried
#[must_use]
pub fn resolve_conditional_value<'a>(
    value: &'a ConditionalValue,
    active: &ActiveConditions,
) -> Option<&'a str> {
    match value {
        ConditionalValue::Null => None,
        ConditionalValue::Target(target) => (!target.is_empty()).then_some(target.as_str()),
        ConditionalValue::Fallbacks(items) => items
            .iter()
            .find_map(|item| resolve_conditional_value(item, active)),
        ConditionalValue::Conditions(entries) => resolve_condition_entries(entries, active),
    }
}

/// Resolve a condition map given as its entries.
#[must_use]
pub fn resolve_condition_entries<'a>(
    entries: &'a [(String, ConditionalValue)],
    active: &ActiveConditions,
) -> Option<&'a str> {
    entries
        .iter()
        .find(|(key, _)| active.contains(key))
        .and_then(|(_, value)| resolve_conditional_value(value, active))
}
