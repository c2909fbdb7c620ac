//! Column conditions in WHERE, ORDER BY and GROUP BY clauses.
//!
//! Predicates are matched with one small pattern per operator, built from a
//! shared column and value grammar. Matches from every pattern are merged and
//! visited left to right so that first-occurrence deduplication follows the
//! statement text.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::context::ParseContext;
use super::joins::{follows_qualifier, JoinSet};
use super::resolve::{ColumnSet, TableScope};
use super::scan::{split_top_level, ScanMap};
use super::types::{ColumnCondition, ConditionOperator, ConditionType, ParsedTable};

/// `[alias.]column`
const COLUMN: &str = r"\b(?:(?P<alias>[\w$#]+)\.)?(?P<column>[A-Z_][\w$#]*)";

/// Bind variable, string or numeric literal, or a date/conversion function.
const VALUE: &str = r"(?P<value>:[\w$#]+|\?|'(?:[^']|'')*'|-?\d+(?:\.\d+)?|(?:SYSDATE|SYSTIMESTAMP|CURRENT_DATE|CURRENT_TIMESTAMP)\b|(?:TO_DATE|TO_TIMESTAMP|TO_NUMBER|TRUNC)\s*\()";

const PREDICATE_TEMPLATES: &[(ConditionOperator, &str)] = &[
    (ConditionOperator::Eq, r"{col}\s*=\s*{val}"),
    (ConditionOperator::NotEq, r"{col}\s*(?:<>|!=)\s*{val}"),
    (ConditionOperator::Like, r"{col}\s+LIKE\s+{val}?"),
    (ConditionOperator::NotLike, r"{col}\s+NOT\s+LIKE\s+{val}?"),
    (ConditionOperator::Between, r"{col}\s+BETWEEN\s+{val}?"),
    (ConditionOperator::In, r"{col}\s+IN\s*\(\s*{val}?"),
    (ConditionOperator::NotIn, r"{col}\s+NOT\s+IN\s*\(\s*{val}?"),
    (ConditionOperator::IsNull, r"{col}\s+IS\s+NULL\b"),
    (ConditionOperator::IsNotNull, r"{col}\s+IS\s+NOT\s+NULL\b"),
    (ConditionOperator::GtEq, r"{col}\s*>=\s*{val}"),
    (ConditionOperator::LtEq, r"{col}\s*<=\s*{val}"),
    (ConditionOperator::Gt, r"{col}\s*>\s*{val}"),
    (ConditionOperator::Lt, r"{col}\s*<\s*{val}"),
];

static PREDICATES: LazyLock<Vec<(ConditionOperator, Regex)>> = LazyLock::new(|| {
    PREDICATE_TEMPLATES
        .iter()
        .map(|(op, template)| {
            let pattern = template.replace("{col}", COLUMN).replace("{val}", VALUE);
            (*op, Regex::new(&pattern).unwrap())
        })
        .collect()
});

static LEADING_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:([\w$#]+)\.)?([\w$#]+)").unwrap());

/// Words that can sit where a bare column is expected.
const NOT_A_COLUMN: &[&str] = &[
    "AND", "OR", "NOT", "NULL", "IS", "IN", "LIKE", "BETWEEN", "EXISTS", "CASE", "WHEN", "THEN",
    "ELSE", "END", "ASC", "DESC", "NULLS", "FIRST", "LAST", "ROWNUM", "ROWID", "LEVEL", "SYSDATE",
    "SYSTIMESTAMP", "CURRENT_DATE", "CURRENT_TIMESTAMP", "PRIOR", "ANY", "ALL", "SOME", "DISTINCT",
    "TRUE", "FALSE",
];

pub(crate) const WHERE_TERMINATORS: &[&str] = &[
    "GROUP BY",
    "ORDER BY",
    "HAVING",
    "CONNECT BY",
    "START WITH",
    "UNION",
    "INTERSECT",
    "MINUS",
    "EXCEPT",
    "FETCH",
    "FOR UPDATE",
    "LIMIT",
    "OFFSET",
    "RETURNING",
];

const ORDER_BY_TERMINATORS: &[&str] = &[
    "FETCH",
    "OFFSET",
    "LIMIT",
    "FOR UPDATE",
    "UNION",
    "INTERSECT",
    "MINUS",
    "EXCEPT",
];

const GROUP_BY_TERMINATORS: &[&str] = &[
    "HAVING",
    "ORDER BY",
    "UNION",
    "INTERSECT",
    "MINUS",
    "EXCEPT",
    "FETCH",
    "OFFSET",
    "LIMIT",
    "FOR UPDATE",
];

struct Predicate<'t> {
    position: usize,
    table: &'t ParsedTable,
    column: String,
    operator: ConditionOperator,
    is_bind_variable: bool,
}

/// Bodies of every WHERE clause of the canonical statement.
pub(crate) fn where_clauses(sql: &str) -> Vec<&str> {
    ScanMap::new(sql).clauses("WHERE", WHERE_TERMINATORS)
}

/// Record every predicate column found in the WHERE clauses.
///
/// Columns already used by a join are recorded as join columns, which the
/// column set folds into the existing join entry.
pub(crate) fn extract_where_columns(
    clauses: &[&str],
    scope: &TableScope<'_>,
    joins: &JoinSet,
    ctx: &mut ParseContext,
    columns: &mut ColumnSet,
) {
    for clause in clauses {
        for predicate in predicates(clause, scope) {
            let condition_type = if joins.contains_key(predicate.table.id, &predicate.column) {
                ConditionType::Join
            } else {
                ConditionType::Where
            };
            let condition = ColumnCondition {
                condition_type,
                operator: predicate.operator,
                is_bind_variable: predicate.is_bind_variable,
            };
            columns.insert(ctx, predicate.table, &predicate.column, condition);
        }
    }
}

fn predicates<'t>(clause: &str, scope: &TableScope<'t>) -> Vec<Predicate<'t>> {
    let map = ScanMap::new(clause);
    let mut found = Vec::new();

    for (operator, regex) in PREDICATES.iter() {
        for caps in regex.captures_iter(clause) {
            let Some(column) = caps.name("column") else {
                continue;
            };
            let position = caps.get(0).map_or(column.start(), |m| m.start());
            if map.in_literal(position) || follows_qualifier(clause, position) {
                continue;
            }
            let alias = caps.name("alias").map(|m| m.as_str());
            let Some(table) = resolve_column_table(alias, column.as_str(), scope) else {
                continue;
            };
            let is_bind_variable = caps
                .name("value")
                .is_some_and(|v| v.as_str().starts_with(':') || v.as_str() == "?");

            found.push(Predicate {
                position,
                table,
                column: column.as_str().to_string(),
                operator: *operator,
                is_bind_variable,
            });
        }
    }

    found.sort_by_key(|p| p.position);
    found
}

/// Table owning a column reference; bare names need a single-table scope.
fn resolve_column_table<'t>(
    alias: Option<&str>,
    column: &str,
    scope: &TableScope<'t>,
) -> Option<&'t ParsedTable> {
    match alias {
        Some(alias) => {
            let table = scope.resolve(alias);
            if table.is_none() {
                debug!(alias, column, "skipping column on unresolved alias");
            }
            table
        }
        None => {
            if NOT_A_COLUMN.contains(&column) || scope.is_table_word(column) {
                return None;
            }
            scope.single()
        }
    }
}

/// Record ORDER BY and GROUP BY columns and return their names, in that order.
pub(crate) fn extract_sort_columns(
    sql: &str,
    scope: &TableScope<'_>,
    ctx: &mut ParseContext,
    columns: &mut ColumnSet,
) -> (Vec<String>, Vec<String>) {
    let map = ScanMap::new(sql);
    let order_by = map.clauses("ORDER BY", ORDER_BY_TERMINATORS);
    let group_by = map.clauses("GROUP BY", GROUP_BY_TERMINATORS);

    (
        sort_columns(&order_by, ConditionType::OrderBy, scope, ctx, columns),
        sort_columns(&group_by, ConditionType::GroupBy, scope, ctx, columns),
    )
}

fn sort_columns(
    clauses: &[&str],
    condition_type: ConditionType,
    scope: &TableScope<'_>,
    ctx: &mut ParseContext,
    columns: &mut ColumnSet,
) -> Vec<String> {
    let mut names = Vec::new();
    for clause in clauses {
        for item in split_top_level(clause, b',') {
            let item = item.trim();
            let Some(caps) = LEADING_NAME.captures(item) else {
                continue;
            };
            let (Some(whole), Some(column)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            // Function calls and positional references.
            if item[whole.end()..].trim_start().starts_with('(')
                || column.as_str().starts_with(|c: char| c.is_ascii_digit())
            {
                continue;
            }
            let alias = caps.get(1).map(|m| m.as_str());
            let Some(table) = resolve_column_table(alias, column.as_str(), scope) else {
                continue;
            };

            let condition = ColumnCondition {
                condition_type,
                operator: ConditionOperator::None,
                is_bind_variable: false,
            };
            let (_, is_new) = columns.insert(ctx, table, column.as_str(), condition);
            if is_new {
                names.push(column.as_str().to_string());
            }
        }
    }
    names
}
