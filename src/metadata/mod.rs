//! Index and statistics metadata.
//!
//! The analyzer never talks to a database. It consumes typed metadata
//! through the [`IndexMetadataPort`] boundary:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    IndexMetadataPort (async)                    │
//! │  - get_indexes_for_tables()   - get_column_statistics()         │
//! │  - get_table_row_count()                                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ fetch_snapshot() (timeout, fail-soft)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MetadataSnapshot                         │
//! │        statistics, indexes by table, row counts by table        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`StaticMetadata`] serves a fixed set of entities, e.g. from a JSON
//! export.

mod error;
mod provider;
mod static_provider;
mod types;

pub use error::{MetadataError, MetadataResult};
pub use provider::{IndexMetadataPort, IndexMetadataPortExt, MetadataScope, MetadataSnapshot};
pub use static_provider::StaticMetadata;
pub use types::*;
