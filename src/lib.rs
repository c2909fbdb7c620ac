//! # indexlens
//!
//! Static missing-index analysis for SQL statements.
//!
//! ## Architecture
//!
//! indexlens reads a statement structurally, without a grammar, and decides
//! which of its columns are worth indexing:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL statement                         │
//! │      (SELECT, WITH, UPDATE, DELETE, INSERT ... SELECT)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql: normalize, classify, transform]
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Canonical SELECT                        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql: tables, joins, conditions]
//! ┌─────────────────────────────────────────────────────────┐
//! │          ParsedSql (tables, columns, joins)              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [metadata: IndexMetadataPort]
//! ┌─────────────────────────────────────────────────────────┐
//! │      Statistics + existing indexes + row counts          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [analysis]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Column scores → index points → table access order      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod advisor;
pub mod analysis;
pub mod config;
pub mod metadata;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::advisor::{advise, AdviseOptions, IndexAdvice, IndexSuggestion};
    pub use crate::analysis::{
        analyze_columns, calculate_access_order, identify_index_points, ColumnAnalysis,
        IndexPointAnalysis, PointType, Priority, ScoringWeights,
    };
    pub use crate::metadata::{
        ColumnStatistics, ExistingIndex, IndexMetadataPort, MetadataScope, StaticMetadata,
    };
    pub use crate::sql::{is_supported, normalize, parse, ParseError, ParsedSql};
}

// Also export the entry points at crate root
pub use advisor::advise;
pub use analysis::{analyze_columns, calculate_access_order, identify_index_points};
pub use sql::{is_supported, normalize, parse};
