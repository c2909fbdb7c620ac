//! Integration tests for statement parsing: tables, joins and column conditions.

use indexlens::sql::{
    classify, is_supported, normalize, parse, ConditionOperator, ConditionType, JoinType,
    ParseError, StatementKind,
};

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn test_normalize_is_idempotent() {
    let inputs = [
        "select a,b from t where x=1",
        "SELECT  /*+ FULL(t) */ *\n\tFROM t -- comment\nWHERE t.a <> 'x  y' ;",
        "update t set a=a+1 where b>=:b and c!=2",
        "with x as (select 1 from dual) select * from x",
        "select 'it''s' from dual where a<=b",
        "",
        "   ",
        "select 1 from dual ; ;",
    ];

    for sql in inputs {
        let once = normalize(sql);
        assert_eq!(normalize(&once), once, "not idempotent for {:?}", sql);
    }
}

// ============================================================================
// Supported shapes
// ============================================================================

#[test]
fn test_supported_statements_parse_with_tables() {
    let statements = [
        "select * from orders o where o.id = :id",
        "with recent as (select * from orders) select * from recent r",
        "update accounts set balance = 0 where id = 1",
        "delete from app.sessions s where s.expires < sysdate",
        "insert into archive select * from orders where status = 'C'",
        "select o.id from orders o join customers c on o.customer_id = c.id",
    ];

    for sql in statements {
        assert!(is_supported(sql), "expected {:?} to be supported", sql);
        let parsed = parse(sql).unwrap_or_else(|e| panic!("{:?} failed: {}", sql, e));
        assert!(!parsed.tables.is_empty(), "no tables for {:?}", sql);
    }
}

#[test]
fn test_unsupported_statements_are_rejected() {
    let statements = [
        ("insert into t (a) values (1)", StatementKind::InsertValues),
        (
            "merge into t using s on (t.id = s.id) when matched then update set t.a = s.a",
            StatementKind::Merge,
        ),
        ("begin update t set a = 1; end;", StatementKind::Plsql),
        (
            "with x as (select 1 from dual) insert into t values (1)",
            StatementKind::InsertValues,
        ),
    ];

    for (sql, expected) in statements {
        assert!(!is_supported(sql));
        assert_eq!(classify(sql), expected);
        let err = parse(sql).unwrap_err();
        assert!(
            matches!(err, ParseError::UnsupportedStatement { kind } if kind == expected),
            "unexpected error for {:?}: {}",
            sql,
            err
        );
    }
}

#[test]
fn test_misplaced_parentheses_are_malformed() {
    let statements = [
        "select * from t where t.a = 1) or (t.b = 2",
        "with x as (select * from a)) select * from x",
        "with x as (select * from a select * from x",
    ];

    for sql in statements {
        let err = parse(sql).unwrap_err();
        assert!(
            matches!(err, ParseError::MalformedStructure(_)),
            "unexpected error for {:?}: {}",
            sql,
            err
        );
    }
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_comma_table_after_join() {
    let parsed =
        parse("select * from a join b on a.id = b.a_id, c where c.code = :code").unwrap();

    let names: Vec<_> = parsed.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(parsed.joins.len(), 1);

    let code = parsed.columns.iter().find(|c| c.name == "CODE").unwrap();
    assert_eq!(code.table_name, "C");
    assert_eq!(code.condition.condition_type, ConditionType::Where);
}

#[test]
fn test_update_with_alias_and_bind() {
    let parsed = parse("UPDATE accounts a SET a.balance = 100 WHERE a.id = :id").unwrap();

    assert_eq!(parsed.tables.len(), 1);
    assert_eq!(parsed.tables[0].name, "ACCOUNTS");
    assert_eq!(parsed.tables[0].alias, "A");

    assert_eq!(parsed.columns.len(), 1);
    let column = &parsed.columns[0];
    assert_eq!(column.name, "ID");
    assert_eq!(column.table_name, "ACCOUNTS");
    assert_eq!(column.condition.condition_type, ConditionType::Where);
    assert_eq!(column.condition.operator, ConditionOperator::Eq);
    assert!(column.condition.is_bind_variable);
}

#[test]
fn test_join_columns_not_duplicated_as_where() {
    let parsed =
        parse("SELECT * FROM t1 JOIN t2 ON t1.id = t2.t1_id WHERE t2.status = 'A'").unwrap();

    assert_eq!(parsed.tables.len(), 2);
    assert_eq!(parsed.joins.len(), 1);

    let join = &parsed.joins[0];
    assert_eq!(join.join_type, JoinType::Inner);
    let source = parsed.column(join.source_column_id).unwrap();
    let target = parsed.column(join.target_column_id).unwrap();
    assert_eq!((source.table_name.as_str(), source.name.as_str()), ("T1", "ID"));
    assert_eq!((target.table_name.as_str(), target.name.as_str()), ("T2", "T1_ID"));

    let where_columns: Vec<_> = parsed
        .columns
        .iter()
        .filter(|c| c.condition.condition_type == ConditionType::Where)
        .map(|c| (c.table_name.as_str(), c.name.as_str(), c.condition.operator))
        .collect();
    assert_eq!(where_columns, vec![("T2", "STATUS", ConditionOperator::Eq)]);

    let join_columns = parsed
        .columns
        .iter()
        .filter(|c| c.condition.condition_type == ConditionType::Join)
        .count();
    assert_eq!(join_columns, 2);
}

#[test]
fn test_range_on_join_column_keeps_join_entry() {
    let parsed = parse("select * from a join b on a.id = b.a_id where a.id > :x").unwrap();

    let columns: Vec<_> = parsed
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.condition.condition_type, c.condition.operator))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("ID", ConditionType::Join, ConditionOperator::Eq),
            ("A_ID", ConditionType::Join, ConditionOperator::Eq),
        ]
    );
}

#[test]
fn test_outer_join_marks_target() {
    let parsed = parse(
        "select * from orders o left join shipments s on o.id = s.order_id \
         where o.created >= :since order by o.created",
    )
    .unwrap();

    let outer: Vec<_> = parsed
        .tables
        .iter()
        .filter(|t| t.is_outer_join_target)
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(outer, vec!["SHIPMENTS"]);
    assert_eq!(parsed.joins[0].join_type, JoinType::LeftOuter);
    assert_eq!(parsed.order_by_columns, vec!["CREATED"]);
}

#[test]
fn test_every_reference_resolves() {
    let parsed = parse(
        "select * from a, b, c where a.id = b.a_id and b.id = c.b_id(+) \
         and a.kind in (1, 2) and c.name like 'x%' and z.q = 1 group by a.kind",
    )
    .unwrap();

    for column in &parsed.columns {
        assert!(parsed.table(column.table_id).is_some());
    }
    for join in &parsed.joins {
        assert_ne!(join.source_table_id, join.target_table_id);
        assert!(parsed.column(join.source_column_id).is_some());
        assert!(parsed.column(join.target_column_id).is_some());
    }
    // unknown alias Z is skipped, not fatal
    assert!(parsed.columns.iter().all(|c| c.name != "Q"));
    assert_eq!(parsed.group_by_columns, vec!["KIND"]);
}

#[test]
fn test_statement_without_from() {
    let parsed = parse("select 1").unwrap();
    assert!(parsed.tables.is_empty());
    assert!(parsed.columns.is_empty());
}
