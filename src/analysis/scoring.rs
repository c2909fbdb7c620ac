//! Index-candidate scoring.
//!
//! A candidate score starts from a base weight for the way the column is
//! used and collects adjustments for selectivity and NULL density. Weights
//! are configuration (see the `[scoring]` section of the settings file).

use serde::{Deserialize, Serialize};

use crate::metadata::SelectivityGrade;
use crate::sql::{ColumnCondition, ConditionOperator, ConditionType};

/// Tunable weights for candidate scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Base weight of a join column.
    pub join: f64,
    /// Base weight of a WHERE equality.
    pub equality: f64,
    /// Base weight of a WHERE range, BETWEEN or IN.
    pub range: f64,
    /// Base weight of LIKE, IS [NOT] NULL, NOT IN and `<>`.
    pub weak: f64,
    pub order_by: f64,
    pub group_by: f64,

    pub excellent_bonus: f64,
    pub good_bonus: f64,
    pub fair_bonus: f64,
    pub poor_bonus: f64,

    /// Columns less selective than this are excluded.
    pub max_selectivity: f64,
    /// NULL ratio above which equality, range and join use is penalized.
    pub null_penalty_ratio: f64,
    pub null_penalty: f64,
    /// NULL ratio above which the column is excluded.
    pub null_exclude_ratio: f64,

    /// Minimum score for a column to be indexable.
    pub acceptance_threshold: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            join: 40.0,
            equality: 30.0,
            range: 20.0,
            weak: 10.0,
            order_by: 15.0,
            group_by: 10.0,
            excellent_bonus: 40.0,
            good_bonus: 30.0,
            fair_bonus: 20.0,
            poor_bonus: 10.0,
            max_selectivity: 0.10,
            null_penalty_ratio: 0.5,
            null_penalty: -15.0,
            null_exclude_ratio: 0.9,
            acceptance_threshold: 30.0,
        }
    }
}

impl ScoringWeights {
    /// Base weight and its label for a column condition.
    pub fn base_weight(&self, condition: &ColumnCondition) -> (f64, &'static str) {
        match condition.condition_type {
            ConditionType::Join => (self.join, "join column"),
            ConditionType::OrderBy => (self.order_by, "ORDER BY column"),
            ConditionType::GroupBy => (self.group_by, "GROUP BY column"),
            ConditionType::Where => match condition.operator {
                ConditionOperator::Eq => (self.equality, "equality predicate"),
                op if op.is_range() => (self.range, "range predicate"),
                _ => (self.weak, "weak predicate"),
            },
        }
    }

    pub fn grade_bonus(&self, grade: SelectivityGrade) -> f64 {
        match grade {
            SelectivityGrade::Excellent => self.excellent_bonus,
            SelectivityGrade::Good => self.good_bonus,
            SelectivityGrade::Fair => self.fair_bonus,
            SelectivityGrade::Poor => self.poor_bonus,
            SelectivityGrade::VeryPoor => 0.0,
        }
    }
}

/// Computed candidate score with breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub score: f64,
    pub base_score: f64,
    pub adjustments: Vec<ScoreAdjustment>,
}

/// A single adjustment to the candidate score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAdjustment {
    pub reason: &'static str,
    /// Amount added (or subtracted if negative)
    pub delta: f64,
}

impl CandidateScore {
    pub fn new(base_score: f64) -> Self {
        Self {
            score: base_score,
            base_score,
            adjustments: Vec::new(),
        }
    }

    /// Apply an adjustment; zero deltas are not recorded.
    pub fn adjust(&mut self, reason: &'static str, delta: f64) {
        if delta == 0.0 {
            return;
        }
        self.score += delta;
        self.adjustments.push(ScoreAdjustment { reason, delta });
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(condition_type: ConditionType, operator: ConditionOperator) -> ColumnCondition {
        ColumnCondition {
            condition_type,
            operator,
            is_bind_variable: false,
        }
    }

    #[test]
    fn test_base_weight_ordering() {
        let weights = ScoringWeights::default();
        let join = weights.base_weight(&condition(ConditionType::Join, ConditionOperator::Eq)).0;
        let eq = weights.base_weight(&condition(ConditionType::Where, ConditionOperator::Eq)).0;
        let range = weights.base_weight(&condition(ConditionType::Where, ConditionOperator::In)).0;
        let like = weights.base_weight(&condition(ConditionType::Where, ConditionOperator::Like)).0;
        let null = weights.base_weight(&condition(ConditionType::Where, ConditionOperator::IsNull)).0;

        assert!(join > eq);
        assert!(eq > range);
        assert!(range > like);
        assert_eq!(like, null);
    }

    #[test]
    fn test_adjustments_are_recorded() {
        let mut score = CandidateScore::new(30.0);
        score.adjust("selective", 20.0);
        score.adjust("nothing", 0.0);
        score.adjust("mostly null", -15.0);

        assert_eq!(score.score, 35.0);
        assert_eq!(score.base_score, 30.0);
        assert_eq!(score.adjustments.len(), 2);
        assert!(score.passes(30.0));
        assert!(!score.passes(40.0));
    }

    #[test]
    fn test_weights_from_partial_toml() {
        let weights: ScoringWeights = toml::from_str("join = 50.0\nacceptance_threshold = 45.0").unwrap();
        assert_eq!(weights.join, 50.0);
        assert_eq!(weights.acceptance_threshold, 45.0);
        assert_eq!(weights.equality, 30.0);
    }
}
