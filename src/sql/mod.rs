//! Structural SQL parsing.
//!
//! This module turns one SQL statement into a [`ParsedSql`] entity graph
//! without a grammar. The pipeline is:
//!
//! - [`normalize`] - strip comments, collapse whitespace, upper-case
//! - [`classify`] - assign a closed [`StatementKind`]
//! - [`transform`] - rewrite UPDATE/DELETE/INSERT..SELECT/WITH into a SELECT
//! - table, join and condition extraction over the canonical SELECT
//!
//! Every structural decision goes through the paren- and literal-aware
//! [`scan`] primitives.

pub mod classify;
mod conditions;
mod context;
pub mod error;
mod joins;
pub mod normalize;
mod resolve;
pub mod scan;
mod tables;
pub mod transform;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use classify::{classify, is_supported, StatementKind};
pub use error::{ParseError, ParseResult};
pub use normalize::normalize;
pub use types::{
    ColumnCondition, ColumnId, ConditionOperator, ConditionType, JoinId, JoinType, ParsedColumn,
    ParsedJoin, ParsedSql, ParsedTable, TableId,
};

use tracing::debug;

use context::ParseContext;
use joins::JoinSet;
use resolve::{ColumnSet, TableScope};

/// Parse one SQL statement into its table, join and column structure.
///
/// Unsupported shapes (PL/SQL, MERGE, INSERT..VALUES, anything else) are
/// rejected with [`ParseError::UnsupportedStatement`] before extraction.
/// References to unknown aliases are skipped rather than reported.
pub fn parse(sql: &str) -> ParseResult<ParsedSql> {
    let normalized = normalize(sql);
    let kind = classify::classify_normalized(&normalized);
    if !kind.is_supported() {
        return Err(ParseError::UnsupportedStatement { kind });
    }

    if !scan::ScanMap::new(&normalized).is_balanced() {
        return Err(ParseError::malformed("unbalanced parentheses"));
    }
    let canonical = transform::to_canonical_select(&normalized, kind)?;
    debug!(%kind, canonical = %canonical, "parsing canonical statement");

    let mut ctx = ParseContext::new();
    let extraction = tables::extract_tables(&canonical, &mut ctx);
    let scope = TableScope::new(&extraction.tables);
    let mut columns = ColumnSet::default();
    let mut joins = JoinSet::default();

    joins::extract_explicit_joins(
        &extraction.join_clauses,
        &scope,
        &mut ctx,
        &mut columns,
        &mut joins,
    );
    let where_clauses = conditions::where_clauses(&canonical);
    joins::extract_implicit_joins(&where_clauses, &scope, &mut ctx, &mut columns, &mut joins);
    conditions::extract_where_columns(&where_clauses, &scope, &joins, &mut ctx, &mut columns);
    let (order_by_columns, group_by_columns) =
        conditions::extract_sort_columns(&canonical, &scope, &mut ctx, &mut columns);

    let parsed = ParsedSql {
        tables: extraction.tables.clone(),
        columns: columns.into_vec(),
        joins: joins.into_vec(),
        order_by_columns,
        group_by_columns,
        original_sql: sql.to_string(),
        normalized_sql: normalized,
        canonical_sql: canonical.clone(),
    };
    debug!(
        tables = parsed.tables.len(),
        columns = parsed.columns.len(),
        joins = parsed.joins.len(),
        "parsed statement"
    );
    Ok(parsed)
}
