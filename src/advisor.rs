//! End-to-end index advice for one SQL statement.
//!
//! This module wires the parser, the metadata port and the analysis passes
//! together:
//!
//! ```text
//! SQL → parse → ParsedSql ─┬─ fetch_snapshot (port) → analyze columns → index points
//!                          └─ access order                             → suggestions
//! ```
//!
//! # Example
//!
//! ```ignore
//! use indexlens::advisor::{advise, AdviseOptions};
//! use indexlens::metadata::StaticMetadata;
//!
//! let metadata = StaticMetadata::from_file("dictionary.json")?;
//! let advice = advise("SELECT * FROM orders o WHERE o.status = :s", &metadata, &AdviseOptions::default()).await?;
//! for suggestion in &advice.suggestions {
//!     println!("{}", suggestion.ddl);
//! }
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::analysis::index_points::ranked;
use crate::analysis::{
    identify_index_points, plan_access_order, AccessPlan, ColumnAnalysis, ColumnAnalyzer,
    IndexPointAnalysis, PointType, Priority, ScoringWeights,
};
use crate::config::{Settings, SettingsError};
use crate::metadata::{IndexMetadataPort, IndexMetadataPortExt, MetadataScope, MetadataSnapshot};
use crate::sql::{self, ParseError, ParsedSql};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while producing advice.
///
/// Metadata failures are not among them: lookups fail soft.
#[derive(Debug, thiserror::Error)]
pub enum AdviseError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

pub type AdviseResult<T> = Result<T, AdviseError>;

// ============================================================================
// Options
// ============================================================================

/// Options for an advice run.
#[derive(Debug, Clone)]
pub struct AdviseOptions {
    /// Metadata lookup scope and timeout.
    pub scope: MetadataScope,
    /// Candidate scoring weights.
    pub weights: ScoringWeights,
}

impl Default for AdviseOptions {
    fn default() -> Self {
        Self {
            scope: MetadataScope::new("default", ""),
            weights: ScoringWeights::default(),
        }
    }
}

impl AdviseOptions {
    /// Options taken from the `[metadata]` and `[scoring]` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            scope: settings.metadata.scope()?,
            weights: settings.scoring.clone(),
        })
    }

    pub fn with_scope(mut self, scope: MetadataScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Everything known about the index needs of one statement.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAdvice {
    pub parsed: ParsedSql,
    pub analyses: Vec<ColumnAnalysis>,
    pub index_points: Vec<IndexPointAnalysis>,
    pub access_order: AccessPlan,
    /// Row count per table, zero when unknown.
    pub table_rows: HashMap<String, u64>,
    /// Suggested indexes, most urgent first.
    pub suggestions: Vec<IndexSuggestion>,
}

/// A single-column index worth creating.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSuggestion {
    pub table_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub column_name: String,
    pub point_type: PointType,
    pub priority: Priority,
    pub score: f64,
    /// `CREATE INDEX` statement for the suggestion.
    pub ddl: String,
}

// ============================================================================
// Advice Functions
// ============================================================================

/// Parse `sql`, fetch metadata for its tables and analyze it.
pub async fn advise<P>(sql: &str, port: &P, options: &AdviseOptions) -> AdviseResult<IndexAdvice>
where
    P: IndexMetadataPort,
{
    let parsed = sql::parse(sql)?;
    let snapshot = port.fetch_snapshot(&options.scope, &parsed).await;
    Ok(advise_with_snapshot(parsed, &snapshot, &options.weights))
}

/// Analyze an already parsed statement against fetched metadata.
pub fn advise_with_snapshot(
    parsed: ParsedSql,
    snapshot: &MetadataSnapshot,
    weights: &ScoringWeights,
) -> IndexAdvice {
    let analyzer = ColumnAnalyzer::new(weights.clone());
    let analyses = analyzer.analyze(&parsed.columns, &snapshot.statistics, &snapshot.indexes);
    let index_points = identify_index_points(&parsed, &analyses, &snapshot.indexes);
    let access_order = plan_access_order(&parsed, &analyses);
    let suggestions = suggest_indexes(&parsed, &analyses, &index_points);

    info!(
        tables = parsed.tables.len(),
        points = index_points.len(),
        suggestions = suggestions.len(),
        "analysis complete"
    );

    IndexAdvice {
        parsed,
        analyses,
        index_points,
        access_order,
        table_rows: snapshot.row_counts.clone(),
        suggestions,
    }
}

/// One suggestion per distinct `(table, column)` that needs an index.
fn suggest_indexes(
    parsed: &ParsedSql,
    analyses: &[ColumnAnalysis],
    points: &[IndexPointAnalysis],
) -> Vec<IndexSuggestion> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut suggestions = Vec::new();

    for point in ranked(points) {
        if !point.needs_index || !seen.insert((point.table_name.as_str(), point.column_name.as_str())) {
            continue;
        }
        let schema = parsed
            .tables
            .iter()
            .find(|t| t.name == point.table_name)
            .and_then(|t| t.schema.clone());
        let score = analyses
            .iter()
            .find(|a| a.column_id == point.column_id)
            .map_or(0.0, |a| a.score);

        suggestions.push(IndexSuggestion {
            ddl: create_index_ddl(schema.as_deref(), &point.table_name, &point.column_name),
            table_name: point.table_name.clone(),
            schema,
            column_name: point.column_name.clone(),
            point_type: point.point_type,
            priority: point.priority,
            score,
        });
    }
    suggestions
}

/// `CREATE INDEX IX_<TABLE>_<COLUMN> ON [<SCHEMA>.]<TABLE> (<COLUMN>)`
pub fn create_index_ddl(schema: Option<&str>, table: &str, column: &str) -> String {
    let target = match schema {
        Some(schema) => format!("{schema}.{table}"),
        None => table.to_string(),
    };
    format!("CREATE INDEX IX_{table}_{column} ON {target} ({column})")
}
