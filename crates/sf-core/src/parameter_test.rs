use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_add_and_resolve_in_insertion_order() {
    let mut params = ParameterCollection::new();
    params
        .add("Zeta", DbType::String, |_, _| "z".into())
        .unwrap()
        .add("Alpha", DbType::Int64, |_, _| 42.into())
        .unwrap();

    let resolved = params.resolve("Rev001").unwrap();
    assert_eq!(
        resolved,
        vec![
            ResolvedParameter::new("Zeta", DbType::String, "z"),
            ResolvedParameter::new("Alpha", DbType::Int64, 42i64),
        ]
    );
    assert_eq!(params.names(), vec!["Zeta", "Alpha"]);
}

#[test]
fn test_duplicate_name_rejected() {
    let mut params = ParameterCollection::new();
    params.add("AppName", DbType::String, |_, _| "first".into()).unwrap();

    let err = params
        .add("AppName", DbType::String, |_, _| "second".into())
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateParameter { ref name } if name == "AppName"));

    // The original entry is kept
    let resolved = params.resolve("Rev001").unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].value, ParamValue::Text("first".to_string()));
}

#[test]
fn test_invalid_names_rejected() {
    let mut params = ParameterCollection::new();
    for name in ["", "1abc", "with space", "dash-ed", "@name"] {
        let err = params
            .add(name, DbType::String, |_, _| ParamValue::Null)
            .unwrap_err();
        assert!(
            matches!(err, CoreError::InvalidParameterName { .. }),
            "expected {name:?} to be rejected"
        );
    }
    assert!(params.is_empty());
}

#[test]
fn test_valid_names() {
    assert!(is_valid_parameter_name("name"));
    assert!(is_valid_parameter_name("_private"));
    assert!(is_valid_parameter_name("App_Name2"));
    assert!(!is_valid_parameter_name("ümlaut"));
}

#[test]
fn test_resolver_receives_script_and_parameter_name() {
    let mut params = ParameterCollection::new();
    params
        .add("Origin", DbType::String, |script, param| {
            format!("{script}:{param}").into()
        })
        .unwrap();

    let resolved = params.resolve("Rev007").unwrap();
    assert_eq!(resolved[0].value, ParamValue::Text("Rev007:Origin".to_string()));
}

#[test]
fn test_resolution_is_fresh_per_script() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let mut params = ParameterCollection::new();
    params
        .add("Seq", DbType::Int64, move |_, _| {
            (counter.fetch_add(1, Ordering::SeqCst) as i64).into()
        })
        .unwrap();

    assert_eq!(params.resolve("Rev001").unwrap()[0].value, ParamValue::Int(0));
    assert_eq!(params.resolve("Rev002").unwrap()[0].value, ParamValue::Int(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_remove_and_get() {
    let mut params = ParameterCollection::new();
    params.add("A", DbType::String, |_, _| "a".into()).unwrap();
    params.add("B", DbType::String, |_, _| "b".into()).unwrap();

    assert_eq!(params.get("B").unwrap().db_type(), DbType::String);
    let removed = params.remove("A").unwrap();
    assert_eq!(removed.name(), "A");
    assert!(!params.contains("A"));
    assert!(params.remove("A").is_none());

    // A removed name can be added again
    params.add("A", DbType::Int32, |_, _| 1.into()).unwrap();
    assert_eq!(params.names(), vec!["B", "A"]);
}

#[test]
fn test_coerce_string_accepts_anything() {
    assert_eq!(
        ParamValue::Int(5).coerce("p", DbType::String).unwrap(),
        ParamValue::Text("5".to_string())
    );
    assert_eq!(
        ParamValue::Bool(true).coerce("p", DbType::String).unwrap(),
        ParamValue::Text("true".to_string())
    );
}

#[test]
fn test_coerce_null_for_every_type() {
    for db_type in [
        DbType::String,
        DbType::Int32,
        DbType::Int64,
        DbType::Boolean,
        DbType::Double,
        DbType::DateTime,
    ] {
        assert_eq!(ParamValue::Null.coerce("p", db_type).unwrap(), ParamValue::Null);
    }
}

#[test]
fn test_coerce_int32_range() {
    assert_eq!(
        ParamValue::Int(7).coerce("p", DbType::Int32).unwrap(),
        ParamValue::Int(7)
    );
    let err = ParamValue::Int(i64::MAX).coerce("p", DbType::Int32).unwrap_err();
    assert!(matches!(err, CoreError::ParameterType { .. }));
    assert_eq!(
        ParamValue::from("12").coerce("p", DbType::Int32).unwrap(),
        ParamValue::Int(12)
    );
}

#[test]
fn test_coerce_boolean() {
    assert_eq!(
        ParamValue::from("TRUE").coerce("p", DbType::Boolean).unwrap(),
        ParamValue::Bool(true)
    );
    assert_eq!(
        ParamValue::Int(0).coerce("p", DbType::Boolean).unwrap(),
        ParamValue::Bool(false)
    );
    assert!(ParamValue::Int(2).coerce("p", DbType::Boolean).is_err());
}

#[test]
fn test_coerce_double_from_int() {
    assert_eq!(
        ParamValue::Int(3).coerce("p", DbType::Double).unwrap(),
        ParamValue::Float(3.0)
    );
}

#[test]
fn test_coerce_datetime_from_text() {
    let value = ParamValue::from("2024-03-01 10:15:00")
        .coerce("p", DbType::DateTime)
        .unwrap();
    let expected = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap();
    assert_eq!(value, ParamValue::Timestamp(expected));

    let date_only = ParamValue::from("2024-03-01")
        .coerce("p", DbType::DateTime)
        .unwrap();
    assert!(matches!(date_only, ParamValue::Timestamp(_)));
}

#[test]
fn test_coerce_mismatch_message() {
    let err = ParamValue::from("abc").coerce("Count", DbType::Int64).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("[C007]"));
    assert!(msg.contains("Count"));
    assert!(msg.contains("int64"));
    assert!(msg.contains("text"));
}

#[test]
fn test_resolve_fails_on_type_mismatch() {
    let mut params = ParameterCollection::new();
    params
        .add("Flag", DbType::Boolean, |_, _| "maybe".into())
        .unwrap();
    assert!(params.resolve("Rev001").is_err());
}

#[test]
fn test_option_into_param_value() {
    let none: Option<&str> = None;
    assert_eq!(ParamValue::from(none), ParamValue::Null);
    assert_eq!(ParamValue::from(Some(1i64)), ParamValue::Int(1));
}
