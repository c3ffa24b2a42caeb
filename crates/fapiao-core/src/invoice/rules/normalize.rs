//! Snippet normalization shared by the field rules.

/// Normalize a located snippet before parsing.
///
/// Removes all whitespace (including the full-width space U+3000), maps the
/// full-width closing parenthesis `）` to `)` and the full-width colon `：`
/// to `:`. Only ever applied to matched substrings, never to a whole page.
pub fn normalize_snippet(snippet: &str) -> String {
    snippet
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '）' => ')',
            '：' => ':',
            other => other,
        })
        .collect()
}
