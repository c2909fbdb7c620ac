//! Table access order over the join graph.
//!
//! Tables are scored, the best one becomes the entry point, and the join
//! graph is walked breadth-first from there. Tables not reachable from the
//! entry point (disconnected join islands) are walked from their own best
//! member afterwards, so every table appears exactly once.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};

use super::column::ColumnAnalysis;
use super::thresholds::{access, selectivity};
use crate::sql::{ParsedSql, TableId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableScore {
    pub table_id: TableId,
    pub table_name: String,
    pub score: i64,
}

/// Access order with the scores it was derived from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPlan {
    /// Table names in visiting order.
    pub order: Vec<String>,
    /// Scores, best first.
    pub scores: Vec<TableScore>,
}

/// Recommended table visiting order.
pub fn calculate_access_order(parsed: &ParsedSql, analyses: &[ColumnAnalysis]) -> Vec<String> {
    plan_access_order(parsed, analyses).order
}

pub fn plan_access_order(parsed: &ParsedSql, analyses: &[ColumnAnalysis]) -> AccessPlan {
    let mut graph: UnGraph<TableId, ()> = UnGraph::new_undirected();
    let nodes: HashMap<TableId, NodeIndex> = parsed
        .tables
        .iter()
        .map(|table| (table.id, graph.add_node(table.id)))
        .collect();

    for join in &parsed.joins {
        if let (Some(&a), Some(&b)) = (
            nodes.get(&join.source_table_id),
            nodes.get(&join.target_table_id),
        ) {
            if a != b {
                graph.update_edge(a, b, ());
            }
        }
    }

    let mut scores: Vec<TableScore> = parsed
        .tables
        .iter()
        .map(|table| {
            let degree = graph.neighbors(nodes[&table.id]).count() as i64;
            TableScore {
                table_id: table.id,
                table_name: table.name.clone(),
                score: table_score(parsed, analyses, table.id, table.is_outer_join_target, degree),
            }
        })
        .collect();
    // Stable: ties keep discovery order.
    scores.sort_by(|a, b| b.score.cmp(&a.score));

    let rank: HashMap<TableId, usize> = scores
        .iter()
        .enumerate()
        .map(|(i, s)| (s.table_id, i))
        .collect();

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut order: Vec<String> = Vec::with_capacity(scores.len());

    for entry in &scores {
        let start = nodes[&entry.table_id];
        if visited.contains(&start) {
            continue;
        }

        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);

        while let Some(current) = queue.pop_front() {
            let table_id = graph[current];
            if let Some(table) = parsed.table(table_id) {
                order.push(table.name.clone());
            }

            let mut neighbors: Vec<NodeIndex> = graph
                .neighbors(current)
                .filter(|n| !visited.contains(n))
                .collect();
            neighbors.sort_by_key(|n| rank[&graph[*n]]);

            for neighbor in neighbors {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
    }

    AccessPlan { order, scores }
}

fn table_score(
    parsed: &ParsedSql,
    analyses: &[ColumnAnalysis],
    table_id: TableId,
    is_outer_join_target: bool,
    degree: i64,
) -> i64 {
    let mut score = 0;
    if is_outer_join_target {
        score += access::OUTER_JOIN_TARGET;
    }

    let table_analyses = analyses.iter().filter(|a| {
        parsed
            .column(a.column_id)
            .is_some_and(|column| column.table_id == table_id)
    });
    for analysis in table_analyses {
        if analysis.selectivity <= selectivity::GOOD {
            score += access::GOOD_COLUMN;
        } else if analysis.selectivity <= selectivity::FAIR {
            score += access::FAIR_COLUMN;
        } else if analysis.selectivity <= selectivity::POOR {
            score += access::POOR_COLUMN;
        }
        if analysis.is_indexable {
            score += access::INDEXABLE_COLUMN;
        }
    }

    score + degree * access::JOIN_EDGE
}
