use super::*;
use crate::traits::with_transaction;
use chrono::NaiveDate;

fn text(name: &str, value: &str) -> ResolvedParameter {
    ResolvedParameter::new(name, DbType::String, value)
}

#[test]
fn test_in_memory() {
    let db = DuckDbConnection::in_memory().unwrap();
    assert_eq!(db.db_type(), "duckdb");
}

#[test]
fn test_execute_batch_without_params() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute(
        "CREATE TABLE t1 (id INT); CREATE TABLE t2 (id INT); INSERT INTO t1 VALUES (1), (2);",
        &[],
    )
    .unwrap();

    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t1").unwrap(), 2);
    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t2").unwrap(), 0);
}

#[test]
fn test_execute_with_named_params_across_statements() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE apps (name VARCHAR, rev VARCHAR)", &[])
        .unwrap();

    let params = vec![text("AppName", "billing"), text("Rev", "Rev001")];
    let affected = db
        .execute(
            "INSERT INTO apps VALUES (@AppName, @Rev);\nINSERT INTO apps VALUES ('literal @AppName', @Rev);",
            &params,
        )
        .unwrap();
    assert_eq!(affected, 2);

    let rows = db.query("SELECT name, rev FROM apps ORDER BY name").unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Some("billing".to_string()), Some("Rev001".to_string())],
            vec![Some("literal @AppName".to_string()), Some("Rev001".to_string())],
        ]
    );
}

#[test]
fn test_execute_binds_typed_values() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute(
        "CREATE TABLE typed (i INTEGER, b BIGINT, f DOUBLE, flag BOOLEAN, ts TIMESTAMP, n VARCHAR)",
        &[],
    )
    .unwrap();

    let ts = NaiveDate::from_ymd_opt(2024, 5, 6)
        .unwrap()
        .and_hms_opt(7, 8, 9)
        .unwrap();
    let params = vec![
        ResolvedParameter::new("i", DbType::Int32, 7i32),
        ResolvedParameter::new("b", DbType::Int64, 9_000_000_000i64),
        ResolvedParameter::new("f", DbType::Double, 2.5),
        ResolvedParameter::new("flag", DbType::Boolean, true),
        ResolvedParameter::new("ts", DbType::DateTime, ts),
        ResolvedParameter::new("n", DbType::String, ParamValue::Null),
    ];
    db.execute("INSERT INTO typed VALUES (@i, @b, @f, @flag, @ts, @n)", &params)
        .unwrap();

    let rows = db
        .query("SELECT i, b, f, flag, CAST(ts AS VARCHAR), n FROM typed")
        .unwrap();
    assert_eq!(
        rows[0],
        vec![
            Some("7".to_string()),
            Some("9000000000".to_string()),
            Some("2.5".to_string()),
            Some("true".to_string()),
            Some("2024-05-06 07:08:09".to_string()),
            None,
        ]
    );
}

fn quoted_literal_rows(params: &[ResolvedParameter]) -> Vec<Row> {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute(
        "CREATE TABLE t (v VARCHAR);\n\
         INSERT INTO t VALUES ($q$a;b$q$);\n\
         INSERT INTO t VALUES (E'it\\'s; @Env here');",
        params,
    )
    .unwrap();
    db.query("SELECT v FROM t ORDER BY v").unwrap()
}

#[test]
fn test_tagged_dollar_and_escape_strings_with_and_without_params() {
    let expected = vec![
        vec![Some("a;b".to_string())],
        vec![Some("it's; @Env here".to_string())],
    ];
    assert_eq!(quoted_literal_rows(&[]), expected);
    assert_eq!(quoted_literal_rows(&[text("Env", "prod")]), expected);
}

#[test]
fn test_query_empty_result() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE empty (id INT)", &[]).unwrap();
    assert!(db.query("SELECT id FROM empty").unwrap().is_empty());
}

#[test]
fn test_missing_table_classified() {
    let db = DuckDbConnection::in_memory().unwrap();
    let err = db.query("SELECT * FROM nowhere").unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)), "got {err:?}");
}

#[test]
fn test_duplicate_key_classified_as_constraint_violation() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE log (name VARCHAR PRIMARY KEY)", &[])
        .unwrap();
    let params = vec![text("name", "Rev001.sql")];
    db.execute("INSERT INTO log VALUES (@name)", &params).unwrap();

    let err = db
        .execute("INSERT INTO log VALUES (@name)", &params)
        .unwrap_err();
    assert!(err.is_constraint_violation(), "got {err:?}");
    assert!(err.is_duplicate_key());
}

#[test]
fn test_rollback_discards_changes() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)", &[]).unwrap();

    db.begin().unwrap();
    db.execute("INSERT INTO t VALUES (1)", &[]).unwrap();
    db.rollback().unwrap();

    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t").unwrap(), 0);
}

#[test]
fn test_rollback_after_failed_statement() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)", &[]).unwrap();

    db.begin().unwrap();
    db.execute("INSERT INTO t VALUES (1)", &[]).unwrap();
    assert!(db.execute("INSERT INTO missing VALUES (1)", &[]).is_err());
    db.rollback().unwrap();

    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t").unwrap(), 0);
}

#[test]
fn test_transactional_ddl_rolls_back() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.begin().unwrap();
    db.execute("CREATE TABLE temp_ddl (id INT)", &[]).unwrap();
    db.rollback().unwrap();

    assert!(db.query("SELECT * FROM temp_ddl").is_err());
}

#[test]
fn test_with_transaction_commits_and_rolls_back() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)", &[]).unwrap();

    with_transaction::<_, DbError, _>(&db, |conn| {
        conn.execute("INSERT INTO t VALUES (1)", &[])
    })
    .unwrap();

    let failed = with_transaction::<(), DbError, _>(&db, |conn| {
        conn.execute("INSERT INTO t VALUES (2)", &[])?;
        Err(DbError::ExecutionError("abort".to_string()))
    });
    assert!(failed.is_err());

    assert_eq!(db.query_i64("SELECT COUNT(*) FROM t").unwrap(), 1);
}

#[test]
fn test_try_clone_shares_database() {
    let db = DuckDbConnection::in_memory().unwrap();
    db.execute("CREATE TABLE shared (id INT); INSERT INTO shared VALUES (1);", &[])
        .unwrap();

    let clone = db.try_clone().unwrap();
    assert_eq!(clone.query_i64("SELECT COUNT(*) FROM shared").unwrap(), 1);
}

#[test]
fn test_shared_factory_connections_see_committed_data() {
    let root = Arc::new(DuckDbConnection::in_memory().unwrap());
    let factory = shared_factory(Arc::clone(&root));

    {
        let conn = factory().unwrap();
        conn.execute("CREATE TABLE via_factory (id INT); INSERT INTO via_factory VALUES (1);", &[])
            .unwrap();
    }

    let conn = factory().unwrap();
    let rows = conn.query("SELECT COUNT(*) FROM via_factory").unwrap();
    assert_eq!(rows, vec![vec![Some("1".to_string())]]);
    assert_eq!(root.query_i64("SELECT COUNT(*) FROM via_factory").unwrap(), 1);
}

#[test]
fn test_duckdb_factory_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("migrations.duckdb");
    let factory = duckdb_factory(path.display().to_string());

    {
        let conn = factory().unwrap();
        conn.execute("CREATE TABLE persisted (id INT); INSERT INTO persisted VALUES (1);", &[])
            .unwrap();
    }

    assert!(path.exists());
    let conn = factory().unwrap();
    assert_eq!(conn.query("SELECT id FROM persisted").unwrap().len(), 1);
}
