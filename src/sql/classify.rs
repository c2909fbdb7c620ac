//! Statement shape classification.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::normalize::normalize;
use super::scan::find_top_level_keyword;
use super::transform::strip_ctes;

/// PL/SQL block markers. Checked before anything else since a block body
/// contains ordinary DML that would otherwise match.
static PLSQL_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:DECLARE|BEGIN)\b|^CREATE\s+(?:OR\s+REPLACE\s+)?(?:(?:NON)?EDITIONABLE\s+)?(?:PROCEDURE|FUNCTION|PACKAGE|TRIGGER|TYPE)\b",
    )
    .unwrap()
});

/// Closed set of statement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementKind {
    Select,
    WithSelect,
    Update,
    Delete,
    InsertSelect,
    InsertValues,
    Merge,
    Plsql,
    Unsupported,
}

impl StatementKind {
    /// Shapes the parser can turn into a canonical SELECT.
    pub fn is_supported(&self) -> bool {
        matches!(
            self,
            StatementKind::Select
                | StatementKind::WithSelect
                | StatementKind::Update
                | StatementKind::Delete
                | StatementKind::InsertSelect
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatementKind::Select => "SELECT",
            StatementKind::WithSelect => "WITH_SELECT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::InsertSelect => "INSERT_SELECT",
            StatementKind::InsertValues => "INSERT_VALUES",
            StatementKind::Merge => "MERGE",
            StatementKind::Plsql => "PLSQL",
            StatementKind::Unsupported => "UNSUPPORTED",
        };
        f.write_str(s)
    }
}

/// Classify a raw SQL statement.
pub fn classify(sql: &str) -> StatementKind {
    classify_normalized(&normalize(sql))
}

/// Whether [`parse`](super::parse) accepts the statement's shape.
pub fn is_supported(sql: &str) -> bool {
    classify(sql).is_supported()
}

/// Classify text that has already been through [`normalize`].
pub(crate) fn classify_normalized(sql: &str) -> StatementKind {
    if PLSQL_BLOCK.is_match(sql) {
        return StatementKind::Plsql;
    }

    let body = sql.trim_start_matches(|c: char| c == '(' || c.is_whitespace());
    let leading = body
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();

    match leading {
        "WITH" => classify_with(sql),
        "SELECT" => StatementKind::Select,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        "MERGE" => StatementKind::Merge,
        "INSERT" => {
            if find_top_level_keyword(sql, "SELECT").is_some() {
                StatementKind::InsertSelect
            } else {
                StatementKind::InsertValues
            }
        }
        _ => StatementKind::Unsupported,
    }
}

/// A WITH statement takes the shape of its main statement. Malformed CTE
/// lists stay `WithSelect` so [`parse`](super::parse) reports the structure
/// error.
fn classify_with(sql: &str) -> StatementKind {
    let Ok(main) = strip_ctes(sql) else {
        return StatementKind::WithSelect;
    };
    match classify_normalized(&main) {
        kind if kind.is_supported() => StatementKind::WithSelect,
        kind => kind,
    }
}
