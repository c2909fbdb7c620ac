//! Integration tests for column candidate analysis and index points.

use indexlens::analysis::{
    analyze_columns, identify_index_points, ColumnAnalyzer, PointType, Priority, ScoringWeights,
};
use indexlens::metadata::{ColumnStatistics, ExistingIndex, IndexMap, SelectivityGrade};
use indexlens::sql::parse;

const SQL: &str = "select * from orders o join customers c on o.customer_id = c.id \
                   where o.status = :s and o.created > :d and c.name like :n order by o.created";

fn statistics() -> Vec<ColumnStatistics> {
    vec![
        ColumnStatistics::new("ORDERS", "CUSTOMER_ID", 50_000, 1_000_000),
        ColumnStatistics::new("CUSTOMERS", "ID", 50_000, 50_000),
        ColumnStatistics::new("ORDERS", "STATUS", 10, 1_000_000),
        ColumnStatistics::new("ORDERS", "CREATED", 200_000, 1_000_000),
    ]
}

// ============================================================================
// Selectivity
// ============================================================================

#[test]
fn test_selectivity_grading() {
    let selective = ColumnStatistics::new("T", "A", 10, 1_000_000);
    assert_eq!(selective.selectivity_grade(), SelectivityGrade::Excellent);

    let unselective = ColumnStatistics::new("T", "B", 200_000, 1_000_000);
    assert_eq!(unselective.selectivity_grade(), SelectivityGrade::VeryPoor);

    assert_eq!(SelectivityGrade::from_selectivity(0.01), SelectivityGrade::Good);
    assert_eq!(SelectivityGrade::from_selectivity(0.05), SelectivityGrade::Fair);
    assert_eq!(SelectivityGrade::from_selectivity(0.10), SelectivityGrade::Poor);
}

// ============================================================================
// Column analysis
// ============================================================================

#[test]
fn test_analysis_per_column() {
    let parsed = parse(SQL).unwrap();
    let analyses = analyze_columns(&parsed.columns, &statistics(), &IndexMap::new());
    assert_eq!(analyses.len(), parsed.columns.len());

    let find = |table: &str, column: &str, position: usize| {
        analyses
            .iter()
            .filter(|a| a.table_name == table && a.column_name == column)
            .nth(position)
            .unwrap()
    };

    // 10 / 1M: equality plus excellent bonus
    let status = find("ORDERS", "STATUS", 0);
    assert_eq!(status.score, 70.0);
    assert!(status.is_indexable);

    // 200k / 1M: excluded on selectivity
    let created = find("ORDERS", "CREATED", 0);
    assert_eq!(created.selectivity_grade, SelectivityGrade::VeryPoor);
    assert!(!created.is_indexable);
    assert!(!created.exclude_reasons.is_empty());

    // CUSTOMERS.ID is unique, selectivity 1.0
    assert!(!find("CUSTOMERS", "ID", 0).is_indexable);

    // no statistics for NAME: weak predicate below the threshold
    let name = find("CUSTOMERS", "NAME", 0);
    assert!(!name.has_statistics);
    assert_eq!(name.selectivity, 0.5);
    assert!(!name.is_indexable);
}

#[test]
fn test_custom_weights_change_acceptance() {
    let parsed = parse("select * from t where t.name like :n").unwrap();

    let default = analyze_columns(&parsed.columns, &[], &IndexMap::new());
    assert!(!default[0].is_indexable);

    let weights = ScoringWeights {
        acceptance_threshold: 10.0,
        ..ScoringWeights::default()
    };
    let relaxed = ColumnAnalyzer::new(weights).analyze(&parsed.columns, &[], &IndexMap::new());
    assert!(relaxed[0].is_indexable);
}

// ============================================================================
// Index points
// ============================================================================

#[test]
fn test_index_points_priorities() {
    let parsed = parse(SQL).unwrap();
    let mut indexes = IndexMap::new();
    indexes.insert(
        "ORDERS".to_string(),
        vec![ExistingIndex::new("IX_ORDERS_CUSTOMER", "ORDERS", &["CUSTOMER_ID"])],
    );

    let analyses = analyze_columns(&parsed.columns, &statistics(), &indexes);
    let points = identify_index_points(&parsed, &analyses, &indexes);
    assert_eq!(points.len(), parsed.columns.len());

    let numbers: Vec<_> = points.iter().map(|p| p.point_number).collect();
    assert_eq!(numbers, (1..=points.len()).collect::<Vec<_>>());

    for point in &points {
        if point.existing_index.is_some() {
            assert_eq!(point.priority, Priority::Low);
            assert!(!point.needs_index);
        } else if point.point_type == PointType::Join {
            assert_eq!(point.priority, Priority::Critical);
        }
    }

    let customer_id = points.iter().find(|p| p.column_name == "CUSTOMER_ID").unwrap();
    assert_eq!(customer_id.existing_index.as_deref(), Some("IX_ORDERS_CUSTOMER"));

    let status = points.iter().find(|p| p.column_name == "STATUS").unwrap();
    assert_eq!(status.point_type, PointType::Entry);
    assert_eq!(status.priority, Priority::High);
    assert!(status.needs_index);

    let order_points = points.iter().filter(|p| p.point_type == PointType::Order).count();
    assert_eq!(order_points, 1);
}
