//! Rewrites supported statement shapes into a canonical SELECT.
//!
//! Extraction is written once against SELECT text; every other supported
//! shape is reduced to it here:
//!
//! ```text
//! WITH a AS (...), b AS (...) <main>   →  canonical(<main>)
//! UPDATE t x SET ... WHERE p           →  SELECT * FROM t x WHERE p
//! DELETE FROM t x WHERE p              →  SELECT * FROM t x WHERE p
//! INSERT INTO t (...) SELECT ...       →  SELECT ...
//! ```

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::classify::{classify_normalized, StatementKind};
use super::error::{ParseError, ParseResult};
use super::scan::{find_top_level_keyword, ScanMap};

static WITH_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^WITH\s+(?:RECURSIVE\s+)?").unwrap());

/// `name [(col, ...)] AS [[NOT] MATERIALIZED] (`
static CTE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([\w$#]+)\s*(?:\([^()]*\))?\s*AS\s*(?:(?:NOT\s+)?MATERIALIZED\s*)?\(").unwrap()
});

static UPDATE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^UPDATE\s+((?:[\w$#]+\.)?[\w$#]+)(?:\s+(?:AS\s+)?([\w$#]+))?\s+SET\b").unwrap()
});

static DELETE_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^DELETE\s+(?:FROM\s+)?((?:[\w$#]+\.)?[\w$#]+)(?:\s+(?:AS\s+)?([\w$#]+))?").unwrap()
});

/// Words that may follow the target table of a DELETE without being its alias.
const DELETE_CONTINUATIONS: &[&str] = &[
    "WHERE",
    "ORDER",
    "GROUP",
    "HAVING",
    "RETURNING",
    "LOG",
    "PARTITION",
    "SUBPARTITION",
];

/// Rewrite normalized `sql` of the given shape into a SELECT.
pub fn to_canonical_select(sql: &str, kind: StatementKind) -> ParseResult<String> {
    match kind {
        StatementKind::Select => Ok(sql.to_string()),
        StatementKind::WithSelect => {
            let main = strip_ctes(sql)?;
            let main_kind = classify_normalized(&main);
            debug!(%main_kind, "stripped WITH clause");
            if !main_kind.is_supported() {
                return Err(ParseError::UnsupportedStatement { kind: main_kind });
            }
            to_canonical_select(&main, main_kind)
        }
        StatementKind::Update => rewrite_update(sql),
        StatementKind::Delete => rewrite_delete(sql),
        StatementKind::InsertSelect => rewrite_insert_select(sql),
        other => Err(ParseError::UnsupportedStatement { kind: other }),
    }
}

/// Remove the CTE definitions of a WITH statement and return the main statement.
pub fn strip_ctes(sql: &str) -> ParseResult<String> {
    let head = WITH_HEAD
        .find(sql)
        .ok_or_else(|| ParseError::malformed("expected WITH at start of statement"))?;
    if !ScanMap::new(sql).is_balanced() {
        return Err(ParseError::malformed("unbalanced parentheses in WITH clause"));
    }

    let mut rest = &sql[head.end()..];
    loop {
        let caps = CTE_HEAD
            .captures(rest)
            .ok_or_else(|| ParseError::malformed("expected `name AS (...)` in WITH clause"))?;
        let name = caps.get(1).map_or("", |m| m.as_str());
        // The head pattern ends on the opening paren of the CTE body.
        let open = caps.get(0).map_or(0, |m| m.end()) - 1;

        let close = ScanMap::new(rest).matching_paren(open).ok_or_else(|| {
            ParseError::malformed(format!("unbalanced parentheses in CTE {name}"))
        })?;

        rest = rest[close + 1..].trim_start();
        match rest.strip_prefix(',') {
            Some(next) => rest = next,
            None => break,
        }
    }

    if rest.is_empty() {
        return Err(ParseError::malformed("WITH clause has no main statement"));
    }
    Ok(rest.to_string())
}

fn rewrite_update(sql: &str) -> ParseResult<String> {
    let caps = UPDATE_HEAD
        .captures(sql)
        .ok_or_else(|| ParseError::malformed("UPDATE must name a table followed by SET"))?;
    let table = &caps[1];
    let alias = caps.get(2).map(|m| m.as_str());
    let set_end = caps.get(0).map_or(sql.len(), |m| m.end());

    Ok(select_from(table, alias, predicate_tail(sql, set_end)))
}

fn rewrite_delete(sql: &str) -> ParseResult<String> {
    let caps = DELETE_HEAD
        .captures(sql)
        .ok_or_else(|| ParseError::malformed("DELETE must name a table"))?;
    let table = caps.get(1).ok_or_else(|| ParseError::malformed("DELETE must name a table"))?;

    let (alias, table_end) = match caps.get(2) {
        Some(m) if !DELETE_CONTINUATIONS.contains(&m.as_str()) => (Some(m.as_str()), m.end()),
        _ => (None, table.end()),
    };

    Ok(select_from(table.as_str(), alias, predicate_tail(sql, table_end)))
}

fn rewrite_insert_select(sql: &str) -> ParseResult<String> {
    match find_top_level_keyword(sql, "SELECT") {
        Some(pos) => Ok(sql[pos..].to_string()),
        None => Err(ParseError::UnsupportedStatement {
            kind: StatementKind::InsertValues,
        }),
    }
}

/// Top-level `WHERE ...` after `from`, without a trailing RETURNING clause.
fn predicate_tail(sql: &str, from: usize) -> Option<&str> {
    let map = ScanMap::new(sql);
    let start = map.find_keyword("WHERE", from, 0)?;
    let end = map
        .find_keyword("RETURNING", start, 0)
        .unwrap_or(sql.len());
    Some(sql[start..end].trim_end())
}

fn select_from(table: &str, alias: Option<&str>, predicate: Option<&str>) -> String {
    let mut out = format!("SELECT * FROM {table}");
    if let Some(alias) = alias {
        out.push(' ');
        out.push_str(alias);
    }
    if let Some(predicate) = predicate {
        out.push(' ');
        out.push_str(predicate);
    }
    out
}
