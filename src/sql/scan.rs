//! Parenthesis- and literal-aware scanning of normalized SQL.
//!
//! Every structural decision in the parser goes through [`ScanMap`]: a keyword
//! only counts when it sits at the expected parenthesis depth, outside string
//! literals, and between word boundaries. A `SELECT` inside a parenthesized
//! subquery is therefore never mistaken for the outer statement's keyword.

use std::ops::Range;

/// Parenthesis depth of every byte of a SQL string.
///
/// The depth recorded for a byte is the depth *before* that byte is applied,
/// so an opening paren and its matching closing paren are recorded at
/// different depths (`d` and `d + 1`). Bytes inside string literals,
/// including the quotes, have no depth.
pub struct ScanMap<'a> {
    sql: &'a str,
    depths: Vec<Option<i32>>,
    final_depth: i32,
    min_depth: i32,
}

impl<'a> ScanMap<'a> {
    pub fn new(sql: &'a str) -> Self {
        let mut depths = Vec::with_capacity(sql.len());
        let mut depth: i32 = 0;
        let mut min_depth: i32 = 0;
        let mut in_literal = false;

        for &b in sql.as_bytes() {
            if in_literal {
                depths.push(None);
                if b == b'\'' {
                    in_literal = false;
                }
                continue;
            }
            match b {
                b'\'' => {
                    depths.push(None);
                    in_literal = true;
                }
                b'(' => {
                    depths.push(Some(depth));
                    depth += 1;
                }
                b')' => {
                    depths.push(Some(depth));
                    depth -= 1;
                    min_depth = min_depth.min(depth);
                }
                _ => depths.push(Some(depth)),
            }
        }

        Self {
            sql,
            depths,
            final_depth: depth,
            min_depth,
        }
    }

    pub fn sql(&self) -> &'a str {
        self.sql
    }

    /// Depth at a byte offset, `None` inside a string literal or past the end.
    pub fn depth(&self, idx: usize) -> Option<i32> {
        self.depths.get(idx).copied().flatten()
    }

    pub fn in_literal(&self, idx: usize) -> bool {
        idx < self.depths.len() && self.depths[idx].is_none()
    }

    /// True when every opening paren is closed and no paren closes before
    /// it was opened.
    pub fn is_balanced(&self) -> bool {
        self.final_depth == 0 && self.min_depth >= 0
    }

    /// Whether `keyword` starts at `idx` with word boundaries on both sides.
    ///
    /// Accepted before: start of string, whitespace, `,`, `(` or `)`.
    /// Accepted after: end of string, whitespace, `(`, `)` or `,`.
    pub fn keyword_at(&self, idx: usize, keyword: &str) -> bool {
        let bytes = self.sql.as_bytes();
        let kw = keyword.as_bytes();
        let end = idx + kw.len();
        if end > bytes.len() || self.in_literal(idx) {
            return false;
        }
        if !bytes[idx..end].eq_ignore_ascii_case(kw) {
            return false;
        }
        let before_ok = idx == 0 || is_boundary(bytes[idx - 1]);
        let after_ok = end == bytes.len() || is_boundary(bytes[end]);
        before_ok && after_ok
    }

    /// First occurrence of `keyword` at `depth`, starting the scan at `from`.
    ///
    /// The scan stops once it leaves the group that encloses `from`.
    pub fn find_keyword(&self, keyword: &str, from: usize, depth: i32) -> Option<usize> {
        for i in from..self.depths.len() {
            match self.depth(i) {
                Some(d) if d == depth => {
                    if self.keyword_at(i, keyword) {
                        return Some(i);
                    }
                }
                Some(d) if d < depth => return None,
                _ => {}
            }
        }
        None
    }

    /// Every occurrence of `keyword` outside string literals, at any depth.
    pub fn keyword_positions(&self, keyword: &str) -> Vec<usize> {
        (0..self.depths.len())
            .filter(|&i| self.keyword_at(i, keyword))
            .collect()
    }

    /// End offset of a clause that starts at `start` and lives at `depth`.
    ///
    /// The clause ends at the first terminator keyword at the same depth, at
    /// the paren that closes the enclosing group, or at the end of the text.
    pub fn clause_end(&self, start: usize, depth: i32, terminators: &[&str]) -> usize {
        let bytes = self.sql.as_bytes();
        for i in start..bytes.len() {
            match self.depth(i) {
                Some(d) if d == depth => {
                    if bytes[i] == b')' {
                        return i;
                    }
                    if terminators.iter().any(|kw| self.keyword_at(i, kw)) {
                        return i;
                    }
                }
                Some(d) if d < depth => return i,
                _ => {}
            }
        }
        bytes.len()
    }

    /// Offset of the paren closing the one opened at `open`.
    pub fn matching_paren(&self, open: usize) -> Option<usize> {
        let bytes = self.sql.as_bytes();
        if bytes.get(open) != Some(&b'(') {
            return None;
        }
        let depth = self.depth(open)?;
        (open + 1..bytes.len()).find(|&j| bytes[j] == b')' && self.depth(j) == Some(depth + 1))
    }

    /// Start offset of the innermost group enclosing `idx` (0 at top level).
    pub fn group_start(&self, idx: usize) -> usize {
        let Some(depth) = self.depth(idx) else {
            return 0;
        };
        for j in (0..idx).rev() {
            if matches!(self.depth(j), Some(d) if d < depth) {
                return j + 1;
            }
        }
        0
    }

    pub fn has_keyword_in(&self, keyword: &str, range: Range<usize>, depth: i32) -> bool {
        range
            .into_iter()
            .any(|i| self.depth(i) == Some(depth) && self.keyword_at(i, keyword))
    }

    /// Whether the group enclosing `idx` has a `SELECT` at the same depth
    /// before `idx`.
    ///
    /// Distinguishes `FROM` in `EXTRACT(YEAR FROM d)` or `ORDER BY` in
    /// `OVER (ORDER BY x)` from the clauses of a real query block.
    pub fn in_query_block(&self, idx: usize) -> bool {
        match self.depth(idx) {
            Some(depth) => self.has_keyword_in("SELECT", self.group_start(idx)..idx, depth),
            None => false,
        }
    }

    /// Bodies of every `keyword` clause that belongs to a query block.
    ///
    /// Clauses nested inside an already collected clause are dropped, since
    /// their text is part of the outer body.
    pub fn clauses(&self, keyword: &str, terminators: &[&str]) -> Vec<&'a str> {
        let mut ranges: Vec<Range<usize>> = Vec::new();
        for pos in self.keyword_positions(keyword) {
            let Some(depth) = self.depth(pos) else {
                continue;
            };
            if !self.in_query_block(pos) {
                continue;
            }
            if ranges.iter().any(|r| r.start <= pos && pos < r.end) {
                continue;
            }
            let start = pos + keyword.len();
            let end = self.clause_end(start, depth, terminators);
            ranges.push(start..end);
        }
        ranges
            .into_iter()
            .map(|r| self.sql[r].trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn is_boundary(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b',' | b'(' | b')')
}

/// Position of `keyword` at parenthesis depth 0.
pub fn find_top_level_keyword(sql: &str, keyword: &str) -> Option<usize> {
    find_top_level_keyword_from(sql, keyword, 0)
}

/// Position of `keyword` at parenthesis depth 0, at or after `from`.
pub fn find_top_level_keyword_from(sql: &str, keyword: &str, from: usize) -> Option<usize> {
    ScanMap::new(sql).find_keyword(keyword, from, 0)
}

/// Split on `sep` where it appears at depth 0 outside string literals.
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let map = ScanMap::new(text);
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, &b) in text.as_bytes().iter().enumerate() {
        if b == sep && map.depth(i) == Some(0) {
            parts.push(&text[start..i]);
            start = i + 1;
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_level_select_skips_subquery() {
        let sql = "INSERT INTO T SELECT * FROM (SELECT 1 AS X FROM DUAL)";
        assert_eq!(find_top_level_keyword(sql, "SELECT"), Some(14));

        let values = "INSERT INTO T VALUES ((SELECT 1 FROM DUAL))";
        assert_eq!(find_top_level_keyword(values, "SELECT"), None);
    }

    #[test]
    fn test_keyword_inside_literal_ignored() {
        let sql = "UPDATE T SET A = 'X WHERE Y' WHERE B = 1";
        let pos = find_top_level_keyword(sql, "WHERE").unwrap();
        assert_eq!(&sql[pos..], "WHERE B = 1");
    }

    #[test]
    fn test_keyword_requires_word_boundaries() {
        let sql = "SELECT NOWHERE FROM T WHERE_X = 1";
        assert_eq!(find_top_level_keyword(sql, "WHERE"), None);
    }

    #[test]
    fn test_literal_parens_do_not_change_depth() {
        let sql = "SELECT '(' FROM T WHERE A = ')'";
        let map = ScanMap::new(sql);
        assert!(map.is_balanced());
        assert!(map.find_keyword("WHERE", 0, 0).is_some());
    }

    #[test]
    fn test_early_close_is_unbalanced() {
        assert!(!ScanMap::new("A = 1) OR (B = 2").is_balanced());
        assert!(!ScanMap::new("(A = 1").is_balanced());
        assert!(ScanMap::new("(A = 1) OR (B = 2)").is_balanced());
    }

    #[test]
    fn test_matching_paren_nested() {
        let sql = "X AS (SELECT * FROM B WHERE X = (SELECT 1 FROM C)) SELECT";
        let map = ScanMap::new(sql);
        let close = map.matching_paren(5).unwrap();
        assert_eq!(&sql[close + 1..], " SELECT");
    }

    #[test]
    fn test_clause_end_stops_at_terminator_or_group_close() {
        let sql = "SELECT * FROM (SELECT * FROM A WHERE X = 1) V WHERE V.Y = 2";
        let map = ScanMap::new(sql);
        let inner_where = map.keyword_positions("WHERE")[0];
        let end = map.clause_end(inner_where + 5, 1, &["GROUP"]);
        assert_eq!(&sql[inner_where + 5..end], " X = 1");
    }

    #[test]
    fn test_clauses_keeps_outermost() {
        let sql = "SELECT * FROM A WHERE A.X IN (SELECT B.X FROM B WHERE B.Y = 1) ORDER BY A.Z";
        let map = ScanMap::new(sql);
        let clauses = map.clauses("WHERE", &["ORDER BY"]);
        assert_eq!(
            clauses,
            vec!["A.X IN (SELECT B.X FROM B WHERE B.Y = 1)"]
        );
    }

    #[test]
    fn test_function_from_is_not_a_query_block() {
        let sql = "SELECT EXTRACT(YEAR FROM D) FROM T";
        let map = ScanMap::new(sql);
        let positions = map.keyword_positions("FROM");
        assert_eq!(positions.len(), 2);
        assert!(!map.in_query_block(positions[0]));
        assert!(map.in_query_block(positions[1]));
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level("A, B (X, Y), 'C,D'", b',');
        assert_eq!(parts, vec!["A", " B (X, Y)", " 'C,D'"]);
    }
}
