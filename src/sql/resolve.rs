//! Alias resolution and column bookkeeping shared by the extractors.

use std::collections::HashMap;

use super::context::ParseContext;
use super::types::{ColumnCondition, ColumnId, ConditionType, ParsedColumn, ParsedTable, TableId};

/// Read-only view of the tables found in a statement.
pub(crate) struct TableScope<'a> {
    tables: &'a [ParsedTable],
}

impl<'a> TableScope<'a> {
    pub fn new(tables: &'a [ParsedTable]) -> Self {
        Self { tables }
    }

    /// Resolve a qualifier by alias, falling back to the bare table name.
    pub fn resolve(&self, qualifier: &str) -> Option<&'a ParsedTable> {
        self.tables
            .iter()
            .find(|t| t.alias == qualifier)
            .or_else(|| self.tables.iter().find(|t| t.name == qualifier))
    }

    /// The only table in scope, if there is exactly one.
    pub fn single(&self) -> Option<&'a ParsedTable> {
        match self.tables {
            [only] => Some(only),
            _ => None,
        }
    }

    /// Whether `word` names a table or alias rather than a column.
    pub fn is_table_word(&self, word: &str) -> bool {
        self.tables.iter().any(|t| t.alias == word || t.name == word)
    }
}

/// Columns discovered so far, deduplicated per clause category.
///
/// The first occurrence of a `(category, table, column)` triple wins; later
/// occurrences return the id of the existing entry.
#[derive(Default)]
pub(crate) struct ColumnSet {
    columns: Vec<ParsedColumn>,
    index: HashMap<(ConditionType, TableId, String), ColumnId>,
}

impl ColumnSet {
    /// Insert a column, returning its id and whether it was new.
    pub fn insert(
        &mut self,
        ctx: &mut ParseContext,
        table: &ParsedTable,
        name: &str,
        condition: ColumnCondition,
    ) -> (ColumnId, bool) {
        let key = (condition.condition_type, table.id, name.to_string());
        if let Some(id) = self.index.get(&key) {
            return (*id, false);
        }

        let id = ctx.column_id();
        self.index.insert(key, id);
        self.columns.push(ParsedColumn {
            id,
            table_id: table.id,
            table_name: table.name.clone(),
            name: name.to_string(),
            condition,
        });
        (id, true)
    }

    pub fn into_vec(self) -> Vec<ParsedColumn> {
        self.columns
    }
}
