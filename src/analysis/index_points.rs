//! Diagram points for parsed columns.
//!
//! Each parsed column becomes one numbered point. The point type says how
//! the column drives row access and the priority says how urgently it needs
//! an index.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::column::ColumnAnalysis;
use super::thresholds;
use crate::metadata::{find_covering_index, IndexMap};
use crate::sql::{ColumnId, ConditionOperator, ConditionType, ParsedColumn, ParsedSql};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointType {
    /// WHERE equality, the best place to enter a table.
    Entry,
    Join,
    /// Any other WHERE predicate.
    Filter,
    /// ORDER BY or GROUP BY key.
    Order,
}

impl PointType {
    pub fn for_column(column: &ParsedColumn) -> Self {
        match column.condition.condition_type {
            ConditionType::Join => PointType::Join,
            ConditionType::Where if column.condition.operator == ConditionOperator::Eq => {
                PointType::Entry
            }
            ConditionType::Where => PointType::Filter,
            ConditionType::OrderBy | ConditionType::GroupBy => PointType::Order,
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PointType::Entry => "ENTRY",
            PointType::Join => "JOIN",
            PointType::Filter => "FILTER",
            PointType::Order => "ORDER",
        };
        f.write_str(s)
    }
}

/// Ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPointAnalysis {
    /// 1-based, in column discovery order.
    pub point_number: usize,
    pub table_name: String,
    pub column_name: String,
    pub column_id: ColumnId,
    pub point_type: PointType,
    /// Existing index that already includes the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_index: Option<String>,
    pub needs_index: bool,
    pub priority: Priority,
}

/// Build one point per parsed column.
///
/// Priority rules, first match wins: covered by an index is LOW, a join
/// column is CRITICAL, selectivity up to 0.01 is HIGH, up to 0.05 is
/// MEDIUM, LIKE is LOW, anything else MEDIUM.
pub fn identify_index_points(
    parsed: &ParsedSql,
    analyses: &[ColumnAnalysis],
    indexes: &IndexMap,
) -> Vec<IndexPointAnalysis> {
    parsed
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let analysis = analyses.iter().find(|a| a.column_id == column.id);
            let existing_index = find_covering_index(indexes, &column.table_name, &column.name)
                .map(|index| index.index_name.clone());
            let covered = existing_index.is_some();
            let point_type = PointType::for_column(column);

            IndexPointAnalysis {
                point_number: i + 1,
                table_name: column.table_name.clone(),
                column_name: column.name.clone(),
                column_id: column.id,
                point_type,
                existing_index,
                needs_index: !covered && analysis.is_some_and(|a| a.is_indexable),
                priority: priority(column, analysis, covered),
            }
        })
        .collect()
}

fn priority(column: &ParsedColumn, analysis: Option<&ColumnAnalysis>, covered: bool) -> Priority {
    let selectivity = analysis.map_or(thresholds::selectivity::UNKNOWN, |a| a.selectivity);

    if covered {
        Priority::Low
    } else if column.condition.condition_type == ConditionType::Join {
        Priority::Critical
    } else if selectivity <= thresholds::selectivity::GOOD {
        Priority::High
    } else if selectivity <= thresholds::selectivity::FAIR {
        Priority::Medium
    } else if column.condition.operator == ConditionOperator::Like {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Points sorted by priority, discovery order within a priority.
pub fn ranked(points: &[IndexPointAnalysis]) -> Vec<&IndexPointAnalysis> {
    let mut ranked: Vec<_> = points.iter().collect();
    ranked.sort_by_key(|p| (p.priority, p.point_number));
    ranked
}
