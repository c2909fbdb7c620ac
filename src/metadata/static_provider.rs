//! In-memory metadata port.
//!
//! Serves indexes and statistics from a fixed set, typically loaded from a
//! JSON export of the data dictionary:
//!
//! ```json
//! {
//!   "indexes": [
//!     {"indexName": "PK_ACCOUNTS", "tableName": "ACCOUNTS",
//!      "columns": [{"columnName": "ID", "position": 1}], "isUnique": true}
//!   ],
//!   "statistics": [
//!     {"tableName": "ACCOUNTS", "columnName": "STATUS",
//!      "numDistinct": 4, "numRows": 120000, "numNulls": 0}
//!   ],
//!   "rowCounts": {"ACCOUNTS": 120000}
//! }
//! ```
//!
//! Table and column names are matched case-insensitively.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::{MetadataError, MetadataResult};
use super::provider::IndexMetadataPort;
use super::types::{ColumnStatistics, ExistingIndex, IndexMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticMetadata {
    pub indexes: Vec<ExistingIndex>,
    pub statistics: Vec<ColumnStatistics>,
    pub row_counts: HashMap<String, u64>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> MetadataResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> MetadataResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn with_index(mut self, index: ExistingIndex) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_statistics(mut self, statistics: ColumnStatistics) -> Self {
        self.statistics.push(statistics);
        self
    }

    pub fn with_row_count(mut self, table: impl Into<String>, rows: u64) -> Self {
        self.row_counts.insert(table.into(), rows);
        self
    }
}

#[async_trait]
impl IndexMetadataPort for StaticMetadata {
    async fn get_indexes_for_tables(
        &self,
        _scope_id: &str,
        _owner: &str,
        table_names: &[String],
    ) -> MetadataResult<IndexMap> {
        let mut map = IndexMap::new();
        for table in table_names {
            let indexes: Vec<ExistingIndex> = self
                .indexes
                .iter()
                .filter(|index| index.table_name.eq_ignore_ascii_case(table))
                .cloned()
                .collect();
            if !indexes.is_empty() {
                map.insert(table.clone(), indexes);
            }
        }
        Ok(map)
    }

    async fn get_column_statistics(
        &self,
        _scope_id: &str,
        _owner: &str,
        table_name: &str,
        column_names: &[String],
    ) -> MetadataResult<Vec<ColumnStatistics>> {
        Ok(self
            .statistics
            .iter()
            .filter(|s| s.table_name.eq_ignore_ascii_case(table_name))
            .filter_map(|s| {
                let column = column_names
                    .iter()
                    .find(|c| c.eq_ignore_ascii_case(&s.column_name))?;
                // Report under the caller's spelling so lookups match.
                Some(ColumnStatistics {
                    table_name: table_name.to_string(),
                    column_name: column.clone(),
                    ..s.clone()
                })
            })
            .collect())
    }

    async fn get_table_row_count(
        &self,
        _scope_id: &str,
        _owner: &str,
        table_name: &str,
    ) -> MetadataResult<u64> {
        Ok(self
            .row_counts
            .iter()
            .find(|(table, _)| table.eq_ignore_ascii_case(table_name))
            .map_or(0, |(_, rows)| *rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"{
        "indexes": [
            {"indexName": "PK_ACCOUNTS", "tableName": "accounts",
             "columns": [{"columnName": "ID", "position": 1}], "isUnique": true}
        ],
        "statistics": [
            {"tableName": "ACCOUNTS", "columnName": "status", "numDistinct": 4, "numRows": 1000}
        ],
        "rowCounts": {"Accounts": 1000}
    }"#;

    #[tokio::test]
    async fn test_lookups_ignore_case() {
        let metadata = StaticMetadata::from_json(JSON).unwrap();
        let tables = vec!["ACCOUNTS".to_string(), "MISSING".to_string()];

        let indexes = metadata.get_indexes_for_tables("", "", &tables).await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes["ACCOUNTS"][0].index_name, "PK_ACCOUNTS");

        let stats = metadata
            .get_column_statistics("", "", "ACCOUNTS", &["STATUS".to_string()])
            .await
            .unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].column_name, "STATUS");
        assert_eq!(stats[0].table_name, "ACCOUNTS");

        assert_eq!(metadata.get_table_row_count("", "", "ACCOUNTS").await.unwrap(), 1000);
        assert_eq!(metadata.get_table_row_count("", "", "MISSING").await.unwrap(), 0);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = StaticMetadata::from_file("/nonexistent/indexlens-metadata.json").unwrap_err();
        assert!(matches!(err, MetadataError::Read { .. }));
    }
}
