//! IndexMetadataPort trait definition.
//!
//! The port abstracts over whatever reads index definitions and optimizer
//! statistics from a database dictionary. The analyzer only ever sees the
//! typed entities in [`super::types`].

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};

use super::error::{MetadataError, MetadataResult};
use super::types::{ColumnStatistics, IndexMap};
use crate::sql::ParsedSql;

/// Source of existing indexes and column statistics.
///
/// Implementations must treat "not found" as an empty answer, not an error:
/// unknown tables yield no indexes, unknown columns no statistics, and an
/// unknown row count is zero.
///
/// # Example
///
/// ```ignore
/// use indexlens::metadata::{IndexMetadataPort, IndexMetadataPortExt, MetadataScope};
///
/// async fn example(port: &impl IndexMetadataPort, parsed: &ParsedSql) {
///     let scope = MetadataScope::new("prod", "APP");
///     let snapshot = port.fetch_snapshot(&scope, parsed).await;
///     println!("{} statistics rows", snapshot.statistics.len());
/// }
/// ```
#[async_trait]
pub trait IndexMetadataPort: Send + Sync {
    // =========================================================================
    // Lookups
    // =========================================================================

    /// Existing indexes for each of `table_names`.
    async fn get_indexes_for_tables(
        &self,
        scope_id: &str,
        owner: &str,
        table_names: &[String],
    ) -> MetadataResult<IndexMap>;

    /// Statistics for the given columns of one table.
    async fn get_column_statistics(
        &self,
        scope_id: &str,
        owner: &str,
        table_name: &str,
        column_names: &[String],
    ) -> MetadataResult<Vec<ColumnStatistics>>;

    /// Row count of one table.
    async fn get_table_row_count(
        &self,
        scope_id: &str,
        owner: &str,
        table_name: &str,
    ) -> MetadataResult<u64>;
}

/// Where and how long to look up metadata.
#[derive(Debug, Clone)]
pub struct MetadataScope {
    pub scope_id: String,
    pub owner: String,
    /// Applied to each port call separately.
    pub timeout: Duration,
}

impl MetadataScope {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(scope_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            owner: owner.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Everything the analyzer needs about the tables of one statement.
#[derive(Debug, Clone, Default)]
pub struct MetadataSnapshot {
    pub statistics: Vec<ColumnStatistics>,
    pub indexes: IndexMap,
    pub row_counts: HashMap<String, u64>,
}

impl MetadataSnapshot {
    pub fn statistics_for(&self, table: &str, column: &str) -> Option<&ColumnStatistics> {
        self.statistics
            .iter()
            .find(|s| s.table_name == table && s.column_name == column)
    }
}

/// Extension trait with fail-soft, batched lookups.
#[async_trait]
pub trait IndexMetadataPortExt: IndexMetadataPort {
    /// Fetch indexes, statistics and row counts for every table of `parsed`.
    ///
    /// Issues one index call for the whole table set and one statistics and
    /// row-count call per table, all in parallel. Any call that fails or
    /// exceeds the scope timeout is logged and replaced by an empty answer.
    async fn fetch_snapshot(&self, scope: &MetadataScope, parsed: &ParsedSql) -> MetadataSnapshot {
        let tables = parsed.table_names();
        if tables.is_empty() {
            return MetadataSnapshot::default();
        }

        let requests: Vec<(String, Vec<String>)> = tables
            .iter()
            .map(|table| {
                let mut columns: Vec<String> = Vec::new();
                for column in parsed.columns.iter().filter(|c| &c.table_name == table) {
                    if !columns.contains(&column.name) {
                        columns.push(column.name.clone());
                    }
                }
                (table.clone(), columns)
            })
            .collect();

        let (scope_id, owner) = (scope.scope_id.as_str(), scope.owner.as_str());

        let indexes = fail_soft(
            "indexes",
            scope.timeout,
            self.get_indexes_for_tables(scope_id, owner, &tables),
        );
        let statistics = join_all(requests.iter().map(|(table, columns)| {
            fail_soft(
                "column statistics",
                scope.timeout,
                self.get_column_statistics(scope_id, owner, table, columns),
            )
        }));
        let row_counts = join_all(tables.iter().map(|table| async move {
            let count = fail_soft(
                "row count",
                scope.timeout,
                self.get_table_row_count(scope_id, owner, table),
            )
            .await;
            (table.clone(), count)
        }));

        let (indexes, statistics, row_counts) = futures::join!(indexes, statistics, row_counts);
        let snapshot = MetadataSnapshot {
            statistics: statistics.into_iter().flatten().collect(),
            indexes,
            row_counts: row_counts.into_iter().collect(),
        };
        debug!(
            tables = tables.len(),
            statistics = snapshot.statistics.len(),
            "fetched metadata snapshot"
        );
        snapshot
    }
}

// Blanket implementation for all IndexMetadataPort implementations
impl<T: IndexMetadataPort> IndexMetadataPortExt for T {}

/// Await a lookup with a timeout, falling back to the empty value.
async fn fail_soft<T, F>(what: &'static str, timeout: Duration, lookup: F) -> T
where
    T: Default,
    F: Future<Output = MetadataResult<T>>,
{
    let result = match tokio::time::timeout(timeout, lookup).await {
        Ok(result) => result,
        Err(_) => Err(MetadataError::Timeout(timeout.as_millis() as u64)),
    };
    match result {
        Ok(value) => value,
        Err(error) => {
            warn!(lookup = what, %error, "metadata lookup failed, using defaults");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyPort {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexMetadataPort for FlakyPort {
        async fn get_indexes_for_tables(
            &self,
            _scope_id: &str,
            _owner: &str,
            _table_names: &[String],
        ) -> MetadataResult<IndexMap> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(MetadataError::backend("connection reset"))
        }

        async fn get_column_statistics(
            &self,
            _scope_id: &str,
            _owner: &str,
            table_name: &str,
            column_names: &[String],
        ) -> MetadataResult<Vec<ColumnStatistics>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(column_names
                .iter()
                .map(|c| ColumnStatistics::new(table_name, c.as_str(), 10, 1000))
                .collect())
        }

        async fn get_table_row_count(
            &self,
            _scope_id: &str,
            _owner: &str,
            _table_name: &str,
        ) -> MetadataResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1000)
        }
    }

    #[tokio::test]
    async fn test_snapshot_fails_soft() {
        let port = FlakyPort {
            calls: AtomicUsize::new(0),
        };
        let parsed = crate::sql::parse("select * from a, b where a.id = b.a_id and a.x = 1").unwrap();
        let scope = MetadataScope::new("test", "APP").with_timeout(Duration::from_millis(20));

        let snapshot = port.fetch_snapshot(&scope, &parsed).await;

        assert!(snapshot.indexes.is_empty());
        assert_eq!(snapshot.row_counts.get("A"), Some(&0));
        assert_eq!(snapshot.statistics.len(), 3);
        assert!(snapshot.statistics_for("A", "X").is_some());
        // one index call, two statistics calls, two row-count calls
        assert_eq!(port.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_snapshot_without_tables_skips_lookups() {
        let port = FlakyPort {
            calls: AtomicUsize::new(0),
        };
        let parsed = crate::sql::parse("select 1").unwrap();
        let snapshot = port
            .fetch_snapshot(&MetadataScope::new("test", "APP"), &parsed)
            .await;
        assert!(snapshot.statistics.is_empty());
        assert_eq!(port.calls.load(Ordering::SeqCst), 0);
    }
}
