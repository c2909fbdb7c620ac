//! Join extraction: explicit `JOIN ... ON` equalities and implicit
//! equi-joins in WHERE clauses.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use super::context::ParseContext;
use super::resolve::{ColumnSet, TableScope};
use super::scan::ScanMap;
use super::tables::JoinClause;
use super::types::{
    ColumnCondition, ColumnId, ConditionOperator, ConditionType, JoinType, ParsedJoin,
    ParsedTable, TableId,
};

/// `a.x [(+)] = b.y [(+)]`
static EQUI_JOIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\w$#]+)\.([\w$#]+)\s*(\(\+\))?\s*=\s*([\w$#]+)\.([\w$#]+)\s*(\(\+\))?").unwrap()
});

/// Joins discovered so far plus the `(table, column)` keys that take part in one.
#[derive(Default)]
pub(crate) struct JoinSet {
    joins: Vec<ParsedJoin>,
    pairs: HashSet<(ColumnId, ColumnId)>,
    keys: HashSet<(TableId, String)>,
}

impl JoinSet {
    /// Whether the column participates in any join.
    pub fn contains_key(&self, table: TableId, column: &str) -> bool {
        self.keys.contains(&(table, column.to_string()))
    }

    pub fn into_vec(self) -> Vec<ParsedJoin> {
        self.joins
    }

    fn add(
        &mut self,
        ctx: &mut ParseContext,
        columns: &mut ColumnSet,
        source: (&ParsedTable, &str),
        target: (&ParsedTable, &str),
        join_type: JoinType,
    ) {
        let source_column = columns.insert(ctx, source.0, source.1, join_condition()).0;
        let target_column = columns.insert(ctx, target.0, target.1, join_condition()).0;
        self.keys.insert((source.0.id, source.1.to_string()));
        self.keys.insert((target.0.id, target.1.to_string()));

        if self.pairs.contains(&(source_column, target_column))
            || self.pairs.contains(&(target_column, source_column))
        {
            return;
        }
        self.pairs.insert((source_column, target_column));
        self.joins.push(ParsedJoin {
            id: ctx.join_id(),
            source_table_id: source.0.id,
            source_column_id: source_column,
            target_table_id: target.0.id,
            target_column_id: target_column,
            join_type,
        });
    }
}

fn join_condition() -> ColumnCondition {
    ColumnCondition {
        condition_type: ConditionType::Join,
        operator: ConditionOperator::Eq,
        is_bind_variable: false,
    }
}

/// An equality between two qualified columns.
struct Equality<'t> {
    left: &'t ParsedTable,
    left_column: String,
    left_marked: bool,
    right: &'t ParsedTable,
    right_column: String,
    right_marked: bool,
}

/// Every resolvable `a.x = b.y` in `text` between two different tables.
fn equalities<'t>(text: &str, scope: &TableScope<'t>) -> Vec<Equality<'t>> {
    let map = ScanMap::new(text);
    EQUI_JOIN
        .captures_iter(text)
        .filter_map(|caps| {
            let start = caps.get(0)?.start();
            if map.in_literal(start) || follows_qualifier(text, start) {
                return None;
            }
            resolve_equality(&caps, scope)
        })
        .collect()
}

fn resolve_equality<'t>(caps: &Captures<'_>, scope: &TableScope<'t>) -> Option<Equality<'t>> {
    let (left_alias, right_alias) = (&caps[1], &caps[4]);
    let (Some(left), Some(right)) = (scope.resolve(left_alias), scope.resolve(right_alias)) else {
        debug!(left = left_alias, right = right_alias, "skipping join on unresolved alias");
        return None;
    };
    if left.id == right.id {
        return None;
    }
    Some(Equality {
        left,
        left_column: caps[2].to_string(),
        left_marked: caps.get(3).is_some(),
        right,
        right_column: caps[5].to_string(),
        right_marked: caps.get(6).is_some(),
    })
}

/// True when the match is the tail of a longer dotted or bind name.
pub(crate) fn follows_qualifier(text: &str, start: usize) -> bool {
    start > 0 && matches!(text.as_bytes()[start - 1], b'.' | b':')
}

/// Joins from `JOIN ... ON <condition>` clauses.
pub(crate) fn extract_explicit_joins(
    clauses: &[JoinClause<'_>],
    scope: &TableScope<'_>,
    ctx: &mut ParseContext,
    columns: &mut ColumnSet,
    joins: &mut JoinSet,
) {
    for clause in clauses {
        let Some(condition) = clause.condition else {
            continue;
        };
        for eq in equalities(condition, scope) {
            joins.add(
                ctx,
                columns,
                (eq.left, &eq.left_column),
                (eq.right, &eq.right_column),
                clause.join_type,
            );
        }
    }
}

/// Equi-joins written as WHERE predicates, including Oracle `(+)` outer joins.
pub(crate) fn extract_implicit_joins(
    where_clauses: &[&str],
    scope: &TableScope<'_>,
    ctx: &mut ParseContext,
    columns: &mut ColumnSet,
    joins: &mut JoinSet,
) {
    for clause in where_clauses {
        for eq in equalities(clause, scope) {
            let join_type = match (eq.left_marked, eq.right_marked) {
                (false, true) => JoinType::LeftOuter,
                (true, false) => JoinType::RightOuter,
                _ => JoinType::Inner,
            };
            joins.add(
                ctx,
                columns,
                (eq.left, &eq.left_column),
                (eq.right, &eq.right_column),
                join_type,
            );
        }
    }
}
