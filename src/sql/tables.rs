//! Table extraction from FROM and JOIN clauses.

use std::sync::LazyLock;

use regex::Regex;

use super::context::ParseContext;
use super::scan::{split_top_level, ScanMap};
use super::types::{JoinType, ParsedTable, TableId};

static JOIN_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:NATURAL\s+)?(?:(LEFT|RIGHT|FULL)(?:\s+OUTER)?\s+|(INNER)\s+|(CROSS)\s+)?JOIN\b")
        .unwrap()
});

/// `[schema.]name[@dblink] [[AS] alias]`
static TABLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([\w$#]+)\.)?([\w$#]+)(?:@[\w$#.]+)?(?:\s+(?:AS\s+)?([\w$#]+))?").unwrap()
});

/// `alias.column(+)` marks the null-extended side of an Oracle outer join.
static ORACLE_OUTER_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([\w$#]+)\.[\w$#]+\s*\(\+\)").unwrap());

/// Keywords that end a FROM clause.
const FROM_TERMINATORS: &[&str] = &[
    "WHERE",
    "GROUP",
    "ORDER",
    "HAVING",
    "CONNECT",
    "START",
    "UNION",
    "INTERSECT",
    "MINUS",
    "EXCEPT",
    "FETCH",
    "FOR",
    "LIMIT",
    "OFFSET",
    "RETURNING",
];

/// Words that can follow a table name without being its alias.
const NOT_AN_ALIAS: &[&str] = &[
    "ON",
    "USING",
    "WHERE",
    "JOIN",
    "INNER",
    "LEFT",
    "RIGHT",
    "FULL",
    "OUTER",
    "CROSS",
    "NATURAL",
    "GROUP",
    "ORDER",
    "HAVING",
    "UNION",
    "INTERSECT",
    "MINUS",
    "EXCEPT",
    "CONNECT",
    "START",
    "FETCH",
    "FOR",
    "LIMIT",
    "OFFSET",
    "PARTITION",
    "SUBPARTITION",
    "SAMPLE",
    "PIVOT",
    "UNPIVOT",
    "WITH",
    "SET",
    "RETURNING",
    "LOG",
];

/// One `JOIN ... [ON ...]` segment of a FROM clause.
#[derive(Debug, Clone)]
pub(crate) struct JoinClause<'a> {
    pub join_type: JoinType,
    /// The joined table; `None` for derived tables.
    pub target: Option<TableId>,
    /// Text after `ON`, if present.
    pub condition: Option<&'a str>,
}

#[derive(Debug)]
pub(crate) struct TableExtraction<'a> {
    pub tables: Vec<ParsedTable>,
    pub join_clauses: Vec<JoinClause<'a>>,
}

struct TableRef<'a> {
    schema: Option<&'a str>,
    name: &'a str,
    alias: Option<&'a str>,
}

#[derive(Default)]
struct TableSet {
    tables: Vec<ParsedTable>,
}

impl TableSet {
    /// Add a table unless its alias is already taken; the first one wins.
    fn add(&mut self, ctx: &mut ParseContext, table: TableRef<'_>, outer: bool) -> TableId {
        let alias = table.alias.unwrap_or(table.name);
        if let Some(existing) = self.tables.iter().find(|t| t.alias == alias) {
            return existing.id;
        }

        let id = ctx.table_id();
        self.tables.push(ParsedTable {
            id,
            name: table.name.to_string(),
            schema: table.schema.map(str::to_string),
            alias: alias.to_string(),
            is_outer_join_target: outer,
        });
        id
    }
}

/// Extract every table of a canonical SELECT, including tables of nested
/// query blocks, together with the raw join clauses.
pub(crate) fn extract_tables<'a>(sql: &'a str, ctx: &mut ParseContext) -> TableExtraction<'a> {
    let map = ScanMap::new(sql);
    let mut set = TableSet::default();
    let mut join_clauses = Vec::new();

    for pos in map.keyword_positions("FROM") {
        if !map.in_query_block(pos) {
            continue;
        }
        let Some(depth) = map.depth(pos) else {
            continue;
        };
        let start = pos + "FROM".len();
        let end = map.clause_end(start, depth, FROM_TERMINATORS);
        read_from_clause(&sql[start..end], ctx, &mut set, &mut join_clauses);
    }

    mark_oracle_outer_targets(&map, &mut set.tables);

    TableExtraction {
        tables: set.tables,
        join_clauses,
    }
}

fn read_from_clause<'a>(
    clause: &'a str,
    ctx: &mut ParseContext,
    set: &mut TableSet,
    join_clauses: &mut Vec<JoinClause<'a>>,
) {
    let map = ScanMap::new(clause);
    let joins: Vec<(usize, usize, JoinType)> = JOIN_KEYWORD
        .captures_iter(clause)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if map.depth(whole.start()) != Some(0) {
                return None;
            }
            let join_type = match (caps.get(1).map(|m| m.as_str()), caps.get(3)) {
                (Some("LEFT"), _) => JoinType::LeftOuter,
                (Some("RIGHT"), _) => JoinType::RightOuter,
                (Some("FULL"), _) => JoinType::FullOuter,
                (_, Some(_)) => JoinType::Cross,
                _ => JoinType::Inner,
            };
            Some((whole.start(), whole.end(), join_type))
        })
        .collect();

    let head_end = joins.first().map_or(clause.len(), |j| j.0);
    for item in split_top_level(&clause[..head_end], b',') {
        if let Some(table) = parse_table_ref(item) {
            set.add(ctx, table, false);
        }
    }

    for (i, &(_, keyword_end, join_type)) in joins.iter().enumerate() {
        let segment_end = joins.get(i + 1).map_or(clause.len(), |next| next.0);
        // `JOIN B ON ..., C` lists C as a plain comma table after the join.
        let mut items = split_top_level(&clause[keyword_end..segment_end], b',').into_iter();
        let segment = items.next().unwrap_or_default();

        let target = parse_table_ref(segment).map(|t| set.add(ctx, t, join_type.is_outer()));
        let condition = ScanMap::new(segment)
            .find_keyword("ON", 0, 0)
            .map(|on| segment[on + "ON".len()..].trim());

        join_clauses.push(JoinClause {
            join_type,
            target,
            condition,
        });

        for item in items {
            if let Some(table) = parse_table_ref(item) {
                set.add(ctx, table, false);
            }
        }
    }
}

fn parse_table_ref(text: &str) -> Option<TableRef<'_>> {
    let text = text.trim_start();
    if text.starts_with('(') {
        return None;
    }
    let caps = TABLE_REF.captures(text)?;
    let name = caps.get(2)?;
    // Table functions and LATERAL/TABLE(...) collection expressions.
    if text[name.end()..].trim_start().starts_with('(') {
        return None;
    }
    if NOT_AN_ALIAS.contains(&name.as_str()) {
        return None;
    }

    Some(TableRef {
        schema: caps.get(1).map(|m| m.as_str()),
        name: name.as_str(),
        alias: caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|alias| !NOT_AN_ALIAS.contains(alias)),
    })
}

fn mark_oracle_outer_targets(map: &ScanMap<'_>, tables: &mut [ParsedTable]) {
    for caps in ORACLE_OUTER_MARK.captures_iter(map.sql()) {
        let Some(qualifier) = caps.get(1) else {
            continue;
        };
        if map.in_literal(qualifier.start()) {
            continue;
        }
        let qualifier = qualifier.as_str();
        let idx = tables
            .iter()
            .position(|t| t.alias == qualifier)
            .or_else(|| tables.iter().position(|t| t.name == qualifier));
        if let Some(idx) = idx {
            tables[idx].is_outer_join_target = true;
        }
    }
}
