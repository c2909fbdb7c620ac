//! Per-parse id generation.

use super::types::{ColumnId, JoinId, TableId};

/// Id cursor for a single parse.
///
/// A fresh context is created for every call to [`parse`](super::parse) and
/// threaded through the extraction stages, so concurrent parses never share
/// counters.
#[derive(Debug, Default)]
pub struct ParseContext {
    next_table: u32,
    next_column: u32,
    next_join: u32,
}

impl ParseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_id(&mut self) -> TableId {
        self.next_table += 1;
        TableId(self.next_table)
    }

    pub fn column_id(&mut self) -> ColumnId {
        self.next_column += 1;
        ColumnId(self.next_column)
    }

    pub fn join_id(&mut self) -> JoinId {
        self.next_join += 1;
        JoinId(self.next_join)
    }
}
