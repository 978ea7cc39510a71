//! Sequential, human-readable entity identifiers.
//!
//! An identifier is the category prefix followed by a decimal suffix with no
//! padding (`S1`, `S2`, ..., `S10`). Allocation is stateless: the caller
//! supplies the current maximum identifier of the category and gets the next
//! one back. Two callers that read the same maximum compute the same
//! identifier, so the store write must reject duplicates and the caller must
//! re-read and retry on conflict.

use crate::types::Category;

/// Numeric suffix of an identifier.
///
/// All non-digit characters are dropped and the remaining digits are read as
/// one decimal number. An identifier without any digit has suffix `0`. A digit
/// run too large for `u64` saturates at `u64::MAX`.
pub fn numeric_suffix(id: &str) -> u64 {
    id.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| {
            acc.saturating_mul(10).saturating_add(u64::from(d))
        })
}

/// Next identifier for `category` given the current maximum, if any.
pub fn next_identifier(category: Category, current_max: Option<&str>) -> String {
    let next = current_max.map_or(1, |id| numeric_suffix(id).saturating_add(1));
    format!("{}{}", category.prefix(), next)
}

/// The identifier with the largest numeric suffix.
///
/// Ties keep the first occurrence.
pub fn max_identifier<'a, I>(ids: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    ids.into_iter().fold(None, |best, id| match best {
        Some(b) if numeric_suffix(b) >= numeric_suffix(id) => Some(b),
        _ => Some(id),
    })
}
