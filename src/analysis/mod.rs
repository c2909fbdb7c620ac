//! Index-candidacy analysis over a parsed statement.
//!
//! Three independent passes consume a [`ParsedSql`](crate::sql::ParsedSql):
//!
//! - [`column`] - grade selectivity and score each column as an index candidate
//! - [`index_points`] - map columns to diagram points with a priority
//! - [`access_order`] - order tables by walking the join graph
//!
//! All of them are pure functions of their inputs.

pub mod access_order;
pub mod column;
pub mod index_points;
pub mod scoring;

pub use access_order::{calculate_access_order, plan_access_order, AccessPlan, TableScore};
pub use column::{analyze_columns, ColumnAnalysis, ColumnAnalyzer};
pub use index_points::{identify_index_points, IndexPointAnalysis, PointType, Priority};
pub use scoring::{CandidateScore, ScoreAdjustment, ScoringWeights};

/// Fixed thresholds shared by the analysis passes.
pub mod thresholds {
    /// Selectivity bucket boundaries (inclusive upper bounds).
    pub mod selectivity {
        pub const EXCELLENT: f64 = 0.001;
        pub const GOOD: f64 = 0.01;
        pub const FAIR: f64 = 0.05;
        pub const POOR: f64 = 0.10;
        /// Assumed when a column has no statistics.
        pub const UNKNOWN: f64 = 0.5;
    }

    /// Table scores used to pick the BFS entry point.
    pub mod access {
        /// Outer-join targets are visited late.
        pub const OUTER_JOIN_TARGET: i64 = -100;
        pub const GOOD_COLUMN: i64 = 50;
        pub const FAIR_COLUMN: i64 = 30;
        pub const POOR_COLUMN: i64 = 10;
        pub const INDEXABLE_COLUMN: i64 = 20;
        pub const JOIN_EDGE: i64 = 5;
    }
}
