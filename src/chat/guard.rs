//! Read-only allowlist for model-authored SQL.
//!
//! This is a textual filter, not a parser: anything that is not plainly a
//! bare `SELECT` is refused, including statements that would be harmless
//! (a `WITH` CTE, for instance).

use regex::Regex;
use std::sync::LazyLock;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)--.*$").expect("valid line comment pattern"));

static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment pattern"));

pub const DENIED_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER", "TRUNCATE", "REPLACE", "MERGE",
    "GRANT", "REVOKE", "EXEC", "EXECUTE", "CALL", "INTO",
];

static DENIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\b", DENIED_KEYWORDS.join("|")))
        .expect("valid keyword pattern")
});

/// Comment-free, trimmed, uppercased form of `query`.
pub fn normalize(query: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(query, "");
    let without_blocks = BLOCK_COMMENT.replace_all(&without_lines, "");
    without_blocks.trim().to_uppercase()
}

/// Whether `query` may be run against the catalog.
pub fn is_safe(query: &str) -> bool {
    let cleaned = normalize(query);
    if !cleaned.starts_with("SELECT") {
        return false;
    }
    !DENIED.is_match(&cleaned)
}

/// Whether `query` holds at most one statement. A trailing `;` is allowed;
/// semicolons inside quoted literals or identifiers are ignored.
pub fn is_single_statement(query: &str) -> bool {
    let cleaned = normalize(query);
    let mut quote: Option<char> = None;
    for (idx, ch) in cleaned.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(ch),
            (None, ';') => {
                return cleaned[idx + 1..]
                    .trim_matches(|c: char| c == ';' || c.is_whitespace())
                    .is_empty()
            }
            (None, _) => {}
        }
    }
    true
}
