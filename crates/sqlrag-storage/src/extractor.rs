//! Pulls a literal SQL statement out of free-form text.

use regex::Regex;
use std::sync::LazyLock;

// =============================================================================
// Compiled patterns, tried in order (first match wins)
// =============================================================================

static SQL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // Fenced block tagged as SQL. The tag must end at a word boundary.
        r"(?is)```(?:sqlite|sql)\b\s*(.*?)\s*```",
        // Fenced block, untagged or with another tag, whose body starts with
        // a statement keyword.
        r"(?is)```(?:[a-z0-9_+-]*[ \t]*\n)?\s*((?:SELECT|INSERT|UPDATE|DELETE|CREATE|DROP|WITH)\b.*?)\s*```",
        // Bare statement, up to the first semicolon or end of text.
        r"(?is)\b((?:SELECT|INSERT|UPDATE|DELETE|CREATE|DROP|WITH)\b.*?)(?:;|\z)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid SQL extraction regex"))
    .collect()
});

/// Extract the first SQL statement found in `text`.
///
/// Returns the trimmed statement, or an empty string when nothing matches.
pub fn extract_sql(text: &str) -> String {
    for re in SQL_PATTERNS.iter() {
        if let Some(found) = re.captures(text).and_then(|caps| caps.get(1)) {
            let sql = found.as_str().trim();
            if !sql.is_empty() {
                return sql.to_string();
            }
        }
    }
    String::new()
}
