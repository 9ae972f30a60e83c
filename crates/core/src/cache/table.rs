//! Table-name heuristics for cache invalidation.
//!
//! Extraction works on raw SQL text, so multi-table writes, subqueries and
//! quoted identifiers are not understood. Only the first matched table of a
//! write is reported.

use std::fmt::Debug;
use std::sync::LazyLock;

use regex::Regex;

static TARGET_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:FROM|INTO|UPDATE)\s+(\w+)").expect("target table pattern is valid"));

/// Finds the table a mutating statement writes to.
pub trait TableResolver: Send + Sync + Debug {
    /// Table targeted by `sql`, or `None` when it cannot be determined.
    fn target_table(&self, sql: &str) -> Option<String>;
}

/// Takes the first identifier after `FROM`, `INTO` or `UPDATE`.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordTableResolver;

impl TableResolver for KeywordTableResolver {
    fn target_table(&self, sql: &str) -> Option<String> {
        TARGET_TABLE
            .captures(sql)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Whether `table` appears as an identifier token anywhere in `sql`.
///
/// Comparison is ASCII case-insensitive, matching SQLite's identifier rules.
pub fn references_table(sql: &str, table: &str) -> bool {
    sql.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|token| token.eq_ignore_ascii_case(table))
}
