//! Integration tests for table access ordering.

use std::collections::HashSet;

use indexlens::analysis::{analyze_columns, calculate_access_order, plan_access_order};
use indexlens::metadata::{ColumnStatistics, IndexMap};
use indexlens::sql::parse;

fn assert_each_table_once(order: &[String], expected: usize) {
    assert_eq!(order.len(), expected);
    let distinct: HashSet<_> = order.iter().collect();
    assert_eq!(distinct.len(), expected, "duplicate in {:?}", order);
}

#[test]
fn test_fully_disconnected_tables() {
    let parsed = parse("select * from x, y, z").unwrap();
    let order = calculate_access_order(&parsed, &[]);

    assert_each_table_once(&order, 3);
    assert_eq!(order, vec!["X", "Y", "Z"]);
}

#[test]
fn test_join_islands_each_visited() {
    let parsed = parse("select * from a, b, c, d where a.id = b.a_id and c.id = d.c_id").unwrap();
    let order = calculate_access_order(&parsed, &[]);

    assert_each_table_once(&order, 4);
    assert_eq!(order, vec!["A", "B", "C", "D"]);
}

#[test]
fn test_selective_island_goes_first() {
    let parsed = parse(
        "select * from a, b, c, d where a.id = b.a_id and c.id = d.c_id and d.code = :c",
    )
    .unwrap();
    let stats = vec![ColumnStatistics::new("D", "CODE", 10, 1_000_000)];
    let analyses = analyze_columns(&parsed.columns, &stats, &IndexMap::new());

    let plan = plan_access_order(&parsed, &analyses);
    assert_each_table_once(&plan.order, 4);
    assert_eq!(plan.order, vec!["D", "C", "A", "B"]);
    assert_eq!(plan.scores[0].table_name, "D");
    assert_eq!(plan.scores.len(), 4);
}

#[test]
fn test_outer_join_target_last() {
    let parsed = parse(
        "select * from orders o join customers c on o.customer_id = c.id \
         left join shipments s on s.order_id = o.id",
    )
    .unwrap();
    let order = calculate_access_order(&parsed, &[]);

    assert_each_table_once(&order, 3);
    assert_eq!(order.last().map(String::as_str), Some("SHIPMENTS"));
}

#[test]
fn test_no_tables() {
    let parsed = parse("select 1").unwrap();
    assert!(calculate_access_order(&parsed, &[]).is_empty());
}
