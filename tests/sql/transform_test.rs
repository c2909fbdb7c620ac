//! Integration tests for canonical SELECT rewriting.
//!
//! The canonical form is also checked against sqlparser so rewrites stay
//! valid SQL.

use indexlens::sql::parse;
use indexlens::sql::transform::strip_ctes;
use insta::assert_snapshot;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

fn assert_valid_sql(sql: &str) {
    if let Err(e) = Parser::parse_sql(&GenericDialect {}, sql) {
        panic!("invalid SQL {:?}: {}", sql, e);
    }
}

fn table_names(sql: &str) -> Vec<String> {
    parse(sql)
        .unwrap()
        .tables
        .into_iter()
        .map(|t| t.name)
        .collect()
}

#[test]
fn test_insert_select_uses_outer_select() {
    let parsed = parse("INSERT INTO t SELECT * FROM (SELECT 1 AS X FROM dual)").unwrap();

    assert_snapshot!(parsed.canonical_sql, @"SELECT * FROM (SELECT 1 AS X FROM DUAL)");
    assert_valid_sql(&parsed.canonical_sql);
    // the insert target is not read
    assert_eq!(table_names("INSERT INTO t SELECT * FROM (SELECT 1 AS X FROM dual)"), vec!["DUAL"]);
}

#[test]
fn test_insert_with_column_list() {
    let parsed = parse("insert into archive (id, status) select o.id, o.status from orders o where o.status = 'C'")
        .unwrap();

    assert_snapshot!(
        parsed.canonical_sql,
        @"SELECT O.ID, O.STATUS FROM ORDERS O WHERE O.STATUS = 'C'"
    );
    assert_valid_sql(&parsed.canonical_sql);
}

#[test]
fn test_with_nested_subquery_in_cte() {
    let sql = "WITH cte1 AS (SELECT * FROM a), cte2 AS (SELECT * FROM b WHERE x = (SELECT 1 FROM c)) \
               SELECT * FROM cte1 JOIN cte2 ON cte1.id = cte2.a_id";
    let parsed = parse(sql).unwrap();

    assert_snapshot!(parsed.canonical_sql, @"SELECT * FROM CTE1 JOIN CTE2 ON CTE1.ID = CTE2.A_ID");
    assert_valid_sql(&parsed.canonical_sql);
    assert_eq!(table_names(sql), vec!["CTE1", "CTE2"]);
    assert_eq!(parsed.joins.len(), 1);
}

#[test]
fn test_strip_ctes_unbalanced() {
    let err = strip_ctes("WITH X AS (SELECT * FROM A SELECT * FROM X").unwrap_err();
    assert!(matches!(err, indexlens::sql::ParseError::MalformedStructure(_)));
}

#[test]
fn test_update_and_delete_rewrites() {
    let parsed = parse("update accounts a set a.balance = (select max(b) from x where x.id = a.id) where a.id = 10").unwrap();
    assert_snapshot!(parsed.canonical_sql, @"SELECT * FROM ACCOUNTS A WHERE A.ID = 10");
    assert_valid_sql(&parsed.canonical_sql);

    let parsed = parse("delete from app.orders o where o.status = 'X'").unwrap();
    assert_snapshot!(parsed.canonical_sql, @"SELECT * FROM APP.ORDERS O WHERE O.STATUS = 'X'");
    assert_valid_sql(&parsed.canonical_sql);
}
