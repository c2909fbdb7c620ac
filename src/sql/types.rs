//! Entity graph produced by the structural parser.
//!
//! A [`ParsedSql`] is the aggregate root: it owns the tables, columns and joins
//! discovered in one statement. Every `table_id` referenced by a column or a
//! join points at an entry in [`ParsedSql::tables`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a table within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub u32);

/// Identifier of a column within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub u32);

/// Identifier of a join within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

impl fmt::Display for JoinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "J{}", self.0)
    }
}

/// A table referenced in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    pub id: TableId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Explicit alias, or the table name when none was given.
    pub alias: String,
    /// Target of a LEFT/RIGHT/FULL OUTER join.
    pub is_outer_join_target: bool,
}

impl ParsedTable {
    /// Name including the schema prefix when one was given.
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

/// Clause category a column was discovered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    Where,
    Join,
    OrderBy,
    GroupBy,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionType::Where => "WHERE",
            ConditionType::Join => "JOIN",
            ConditionType::OrderBy => "ORDER_BY",
            ConditionType::GroupBy => "GROUP_BY",
        };
        f.write_str(s)
    }
}

/// Predicate operator applied to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "NOT LIKE")]
    NotLike,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    /// ORDER BY / GROUP BY references carry no predicate.
    #[serde(rename = "NONE")]
    None,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Eq => "=",
            ConditionOperator::NotEq => "<>",
            ConditionOperator::Like => "LIKE",
            ConditionOperator::NotLike => "NOT LIKE",
            ConditionOperator::Between => "BETWEEN",
            ConditionOperator::In => "IN",
            ConditionOperator::NotIn => "NOT IN",
            ConditionOperator::IsNull => "IS NULL",
            ConditionOperator::IsNotNull => "IS NOT NULL",
            ConditionOperator::GtEq => ">=",
            ConditionOperator::LtEq => "<=",
            ConditionOperator::Gt => ">",
            ConditionOperator::Lt => "<",
            ConditionOperator::None => "NONE",
        }
    }

    /// Range-style predicates that a B-tree can serve with a range scan.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ConditionOperator::Between
                | ConditionOperator::In
                | ConditionOperator::GtEq
                | ConditionOperator::LtEq
                | ConditionOperator::Gt
                | ConditionOperator::Lt
        )
    }

    pub fn is_null_check(&self) -> bool {
        matches!(self, ConditionOperator::IsNull | ConditionOperator::IsNotNull)
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub operator: ConditionOperator,
    pub is_bind_variable: bool,
}

/// A column reference together with the condition it was found in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedColumn {
    pub id: ColumnId,
    pub table_id: TableId,
    pub table_name: String,
    pub name: String,
    pub condition: ColumnCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl JoinType {
    pub fn is_outer(&self) -> bool {
        matches!(
            self,
            JoinType::LeftOuter | JoinType::RightOuter | JoinType::FullOuter
        )
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinType::Inner => "INNER",
            JoinType::LeftOuter => "LEFT_OUTER",
            JoinType::RightOuter => "RIGHT_OUTER",
            JoinType::FullOuter => "FULL_OUTER",
            JoinType::Cross => "CROSS",
        };
        f.write_str(s)
    }
}

/// An equi-join between two columns of two different tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedJoin {
    pub id: JoinId,
    pub source_table_id: TableId,
    pub source_column_id: ColumnId,
    pub target_table_id: TableId,
    pub target_column_id: ColumnId,
    pub join_type: JoinType,
}

/// Aggregate root of one parsed statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSql {
    pub tables: Vec<ParsedTable>,
    pub columns: Vec<ParsedColumn>,
    pub joins: Vec<ParsedJoin>,
    pub order_by_columns: Vec<String>,
    pub group_by_columns: Vec<String>,
    pub original_sql: String,
    pub normalized_sql: String,
    /// The SELECT that extraction ran against.
    pub canonical_sql: String,
}

impl ParsedSql {
    pub fn table(&self, id: TableId) -> Option<&ParsedTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&ParsedColumn> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Distinct table names, in discovery order.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if !names.contains(&table.name) {
                names.push(table.name.clone());
            }
        }
        names
    }
}
