use pretty_assertions::assert_eq;
use sales_forecast::error::ForecastError;
use sales_forecast::utils::{parse_date, read_csv, write_csv_atomic};
use serde::{Deserialize, Serialize};
use tempfile::tempdir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Record {
    name: String,
    value: f64,
}

#[test]
fn test_parse_date() {
    let expected = chrono::NaiveDate::from_ymd_opt(2017, 8, 16).unwrap();
    assert_eq!(parse_date("2017-08-16").unwrap(), expected);
    assert_eq!(parse_date(" 2017-08-16 00:00:00").unwrap(), expected);
    assert!(parse_date("16/08/2017").is_err());
    assert!(parse_date("").is_err());
}

#[test]
fn test_write_replaces_previous_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("records.csv");

    write_csv_atomic(
        &path,
        &[Record {
            name: "old".to_string(),
            value: 1.0,
        }],
    )
    .unwrap();
    let records = vec![
        Record {
            name: "a".to_string(),
            value: 2.5,
        },
        Record {
            name: "b".to_string(),
            value: 0.0,
        },
    ];
    write_csv_atomic(&path, &records).unwrap();

    let read: Vec<Record> = read_csv(&path).unwrap();
    assert_eq!(read, records);
    // Only the destination remains; the temp file was renamed over it
    assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
}

#[test]
fn test_read_missing_file_is_stale_cache() {
    let dir = tempdir().unwrap();
    let result: Result<Vec<Record>, _> = read_csv(&dir.path().join("absent.csv"));
    assert!(matches!(result, Err(ForecastError::StaleCache { .. })));
}
