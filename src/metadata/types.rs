//! Typed metadata entities consumed by the analyzer.
//!
//! These are the only shapes the core accepts from a metadata backend.
//! Adapting dictionary rows into them is the backend's job.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::thresholds::selectivity as thresholds;

/// Existing indexes keyed by table name.
pub type IndexMap = HashMap<String, Vec<ExistingIndex>>;

/// Optimizer statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatistics {
    pub column_name: String,
    pub table_name: String,
    pub num_distinct: u64,
    pub num_rows: u64,
    #[serde(default)]
    pub num_nulls: u64,
    #[serde(default)]
    pub density: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,
}

impl ColumnStatistics {
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        num_distinct: u64,
        num_rows: u64,
    ) -> Self {
        let density = if num_distinct == 0 {
            0.0
        } else {
            1.0 / num_distinct as f64
        };
        Self {
            column_name: column_name.into(),
            table_name: table_name.into(),
            num_distinct,
            num_rows,
            num_nulls: 0,
            density,
            histogram: None,
        }
    }

    pub fn with_nulls(mut self, num_nulls: u64) -> Self {
        self.num_nulls = num_nulls;
        self
    }

    /// `num_distinct / num_rows` in `[0, 1]`; an empty table counts as 1.
    pub fn selectivity(&self) -> f64 {
        if self.num_rows == 0 {
            return 1.0;
        }
        (self.num_distinct as f64 / self.num_rows as f64).clamp(0.0, 1.0)
    }

    pub fn selectivity_grade(&self) -> SelectivityGrade {
        SelectivityGrade::from_selectivity(self.selectivity())
    }

    /// Share of NULL rows, unknown for an empty table.
    pub fn null_ratio(&self) -> Option<f64> {
        if self.num_rows == 0 {
            return None;
        }
        Some((self.num_nulls as f64 / self.num_rows as f64).clamp(0.0, 1.0))
    }
}

/// Histogram summary reported with the statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Histogram {
    pub kind: HistogramKind,
    pub buckets: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HistogramKind {
    Frequency,
    TopFrequency,
    HeightBalanced,
    Hybrid,
}

/// Bucketed selectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectivityGrade {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl SelectivityGrade {
    pub fn from_selectivity(selectivity: f64) -> Self {
        if selectivity <= thresholds::EXCELLENT {
            SelectivityGrade::Excellent
        } else if selectivity <= thresholds::GOOD {
            SelectivityGrade::Good
        } else if selectivity <= thresholds::FAIR {
            SelectivityGrade::Fair
        } else if selectivity <= thresholds::POOR {
            SelectivityGrade::Poor
        } else {
            SelectivityGrade::VeryPoor
        }
    }
}

impl fmt::Display for SelectivityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectivityGrade::Excellent => "EXCELLENT",
            SelectivityGrade::Good => "GOOD",
            SelectivityGrade::Fair => "FAIR",
            SelectivityGrade::Poor => "POOR",
            SelectivityGrade::VeryPoor => "VERY_POOR",
        };
        f.write_str(s)
    }
}

/// An index that already exists on a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingIndex {
    pub index_name: String,
    pub table_name: String,
    pub columns: Vec<IndexColumn>,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub index_type: IndexType,
    #[serde(default)]
    pub status: IndexStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analyzed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_keys: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering_factor: Option<u64>,
}

impl ExistingIndex {
    /// A valid normal index over `columns`, in order.
    pub fn new(index_name: impl Into<String>, table_name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            index_name: index_name.into(),
            table_name: table_name.into(),
            columns: columns
                .iter()
                .enumerate()
                .map(|(i, name)| IndexColumn {
                    column_name: name.to_string(),
                    position: i as u32 + 1,
                    desc_order: false,
                })
                .collect(),
            is_unique: false,
            index_type: IndexType::Normal,
            status: IndexStatus::Valid,
            last_analyzed: None,
            distinct_keys: None,
            clustering_factor: None,
        }
    }

    /// Whether this index is usable and includes `column`.
    pub fn covers(&self, column: &str) -> bool {
        self.status == IndexStatus::Valid
            && self
                .columns
                .iter()
                .any(|c| c.column_name.eq_ignore_ascii_case(column))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub column_name: String,
    pub position: u32,
    #[serde(default)]
    pub desc_order: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    #[default]
    Normal,
    Bitmap,
    FunctionBased,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexStatus {
    #[default]
    Valid,
    Invalid,
    Unusable,
}

/// First usable index on `table` that includes `column`.
pub fn find_covering_index<'a>(
    indexes: &'a IndexMap,
    table: &str,
    column: &str,
) -> Option<&'a ExistingIndex> {
    indexes
        .get(table)
        .into_iter()
        .flatten()
        .find(|index| index.covers(column))
}
