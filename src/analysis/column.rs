//! Per-column index-candidate analysis.

use serde::{Deserialize, Serialize};

use super::scoring::{CandidateScore, ScoringWeights};
use super::thresholds;
use crate::metadata::{find_covering_index, ColumnStatistics, ExistingIndex, IndexMap, SelectivityGrade};
use crate::sql::{ColumnId, ConditionOperator, ConditionType, ParsedColumn};

/// Analysis result for one parsed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAnalysis {
    pub column_id: ColumnId,
    pub table_name: String,
    pub column_name: String,
    pub selectivity: f64,
    pub selectivity_grade: SelectivityGrade,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null_ratio: Option<f64>,
    /// False when selectivity is the assumed default.
    pub has_statistics: bool,
    /// Name of an existing index that already includes the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covering_index: Option<String>,
    pub is_indexable: bool,
    pub score: f64,
    pub reasons: Vec<String>,
    pub exclude_reasons: Vec<String>,
}

/// Scores columns as index candidates with configurable weights.
#[derive(Debug, Clone, Default)]
pub struct ColumnAnalyzer {
    weights: ScoringWeights,
}

impl ColumnAnalyzer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Analyze every column against the given statistics and indexes.
    pub fn analyze(
        &self,
        columns: &[ParsedColumn],
        statistics: &[ColumnStatistics],
        indexes: &IndexMap,
    ) -> Vec<ColumnAnalysis> {
        columns
            .iter()
            .map(|column| {
                let stats = statistics.iter().find(|s| {
                    s.table_name.eq_ignore_ascii_case(&column.table_name)
                        && s.column_name.eq_ignore_ascii_case(&column.name)
                });
                let covering = find_covering_index(indexes, &column.table_name, &column.name);
                self.analyze_column(column, stats, covering)
            })
            .collect()
    }

    /// Analyze one column.
    ///
    /// Missing statistics assume a neutral selectivity of 0.5 and never
    /// exclude the column on selectivity alone.
    pub fn analyze_column(
        &self,
        column: &ParsedColumn,
        stats: Option<&ColumnStatistics>,
        covering: Option<&ExistingIndex>,
    ) -> ColumnAnalysis {
        let weights = &self.weights;
        let condition = &column.condition;
        let mut reasons = Vec::new();
        let mut exclude_reasons = Vec::new();

        let (base, label) = weights.base_weight(condition);
        let mut score = CandidateScore::new(base);
        reasons.push(format!("{label} ({base:+})"));

        let selectivity = stats.map_or(thresholds::selectivity::UNKNOWN, ColumnStatistics::selectivity);
        let grade = SelectivityGrade::from_selectivity(selectivity);
        let null_ratio = stats.and_then(ColumnStatistics::null_ratio);

        match stats {
            Some(_) => {
                score.adjust(grade_reason(grade), weights.grade_bonus(grade));
                if selectivity > weights.max_selectivity {
                    exclude_reasons.push(format!(
                        "low selectivity ({selectivity:.4}), unlikely to benefit from a B-tree index"
                    ));
                }
            }
            None => reasons.push(format!(
                "no statistics, assuming selectivity {}",
                thresholds::selectivity::UNKNOWN
            )),
        }

        if let Some(ratio) = null_ratio {
            if uses_value_match(column) && ratio > weights.null_penalty_ratio {
                score.adjust("mostly NULL column", weights.null_penalty);
                if ratio > weights.null_exclude_ratio {
                    exclude_reasons.push(format!(
                        "{:.0}% of rows are NULL, rarely helps a non-NULL predicate",
                        ratio * 100.0
                    ));
                }
            }
        }

        for adjustment in &score.adjustments {
            reasons.push(format!("{} ({:+})", adjustment.reason, adjustment.delta));
        }

        if let Some(index) = covering {
            reasons.push(format!("already covered by index {}", index.index_name));
        }

        let is_indexable = score.passes(weights.acceptance_threshold)
            && exclude_reasons.is_empty()
            && covering.is_none();

        ColumnAnalysis {
            column_id: column.id,
            table_name: column.table_name.clone(),
            column_name: column.name.clone(),
            selectivity,
            selectivity_grade: grade,
            null_ratio,
            has_statistics: stats.is_some(),
            covering_index: covering.map(|index| index.index_name.clone()),
            is_indexable,
            score: score.score,
            reasons,
            exclude_reasons,
        }
    }
}

/// Join, equality and range use; IS [NOT] NULL and sort keys are exempt.
fn uses_value_match(column: &ParsedColumn) -> bool {
    let condition = &column.condition;
    match condition.condition_type {
        ConditionType::Join => true,
        ConditionType::Where => {
            condition.operator == ConditionOperator::Eq || condition.operator.is_range()
        }
        ConditionType::OrderBy | ConditionType::GroupBy => false,
    }
}

fn grade_reason(grade: SelectivityGrade) -> &'static str {
    match grade {
        SelectivityGrade::Excellent => "excellent selectivity",
        SelectivityGrade::Good => "good selectivity",
        SelectivityGrade::Fair => "fair selectivity",
        SelectivityGrade::Poor => "poor selectivity",
        SelectivityGrade::VeryPoor => "very poor selectivity",
    }
}

/// Analyze columns with the default weights.
pub fn analyze_columns(
    columns: &[ParsedColumn],
    statistics: &[ColumnStatistics],
    indexes: &IndexMap,
) -> Vec<ColumnAnalysis> {
    ColumnAnalyzer::default().analyze(columns, statistics, indexes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{ColumnCondition, TableId};

    fn column(condition_type: ConditionType, operator: ConditionOperator) -> ParsedColumn {
        ParsedColumn {
            id: ColumnId(1),
            table_id: TableId(1),
            table_name: "ORDERS".to_string(),
            name: "STATUS".to_string(),
            condition: ColumnCondition {
                condition_type,
                operator,
                is_bind_variable: true,
            },
        }
    }

    fn analyze_one(column: &ParsedColumn, stats: Option<ColumnStatistics>) -> ColumnAnalysis {
        ColumnAnalyzer::default().analyze_column(column, stats.as_ref(), None)
    }

    #[test]
    fn test_selective_equality_is_indexable() {
        let col = column(ConditionType::Where, ConditionOperator::Eq);
        let analysis = analyze_one(&col, Some(ColumnStatistics::new("ORDERS", "STATUS", 500, 100_000)));

        assert_eq!(analysis.selectivity_grade, SelectivityGrade::Good);
        assert_eq!(analysis.score, 60.0);
        assert!(analysis.is_indexable);
        assert!(analysis.exclude_reasons.is_empty());
    }

    #[test]
    fn test_low_selectivity_is_excluded() {
        let col = column(ConditionType::Join, ConditionOperator::Eq);
        let analysis = analyze_one(&col, Some(ColumnStatistics::new("ORDERS", "STATUS", 3, 10)));

        assert_eq!(analysis.selectivity_grade, SelectivityGrade::VeryPoor);
        assert_eq!(analysis.score, 40.0);
        assert!(!analysis.is_indexable);
        assert_eq!(analysis.exclude_reasons.len(), 1);
    }

    #[test]
    fn test_missing_statistics_use_neutral_default() {
        let eq = analyze_one(&column(ConditionType::Where, ConditionOperator::Eq), None);
        assert_eq!(eq.selectivity, 0.5);
        assert!(!eq.has_statistics);
        assert!(eq.exclude_reasons.is_empty());
        assert!(eq.is_indexable);

        let like = analyze_one(&column(ConditionType::Where, ConditionOperator::Like), None);
        assert!(!like.is_indexable);
    }

    #[test]
    fn test_null_heavy_columns() {
        let col = column(ConditionType::Where, ConditionOperator::Eq);
        let stats = ColumnStatistics::new("ORDERS", "STATUS", 50, 100_000).with_nulls(60_000);
        let penalized = analyze_one(&col, Some(stats));
        assert_eq!(penalized.score, 55.0);
        assert!(penalized.is_indexable);

        let stats = ColumnStatistics::new("ORDERS", "STATUS", 50, 100_000).with_nulls(95_000);
        let excluded = analyze_one(&col, Some(stats));
        assert!(!excluded.is_indexable);
        assert_eq!(excluded.exclude_reasons.len(), 1);

        let is_null = column(ConditionType::Where, ConditionOperator::IsNull);
        let stats = ColumnStatistics::new("ORDERS", "STATUS", 50, 100_000).with_nulls(95_000);
        assert!(analyze_one(&is_null, Some(stats)).exclude_reasons.is_empty());
    }

    #[test]
    fn test_covered_column_is_not_indexable() {
        let col = column(ConditionType::Where, ConditionOperator::Eq);
        let mut indexes = IndexMap::new();
        indexes.insert(
            "ORDERS".to_string(),
            vec![ExistingIndex::new("IX_ORDERS_STATUS", "ORDERS", &["STATUS"])],
        );
        let stats = vec![ColumnStatistics::new("ORDERS", "STATUS", 500, 100_000)];

        let analyses = analyze_columns(&[col], &stats, &indexes);
        assert_eq!(analyses[0].covering_index.as_deref(), Some("IX_ORDERS_STATUS"));
        assert!(!analyses[0].is_indexable);
        assert!(analyses[0].exclude_reasons.is_empty());
    }
}
