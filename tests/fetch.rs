mod common;

use std::time::Duration;

use sleep_report::data::loader::fetch_university_table;

use common::{refused_url, serve_once, serve_silence, UNIVERSITY_CSV};

#[test]
fn fetch_parses_remote_csv_without_index() {
    let url = serve_once("200 OK", UNIVERSITY_CSV);
    let table = fetch_university_table(&url, Duration::from_secs(5)).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.width(), 27);
    assert!(table.index().is_none());
    assert!(table.has_column("AverageSleep"));
}

#[test]
fn non_success_status_is_io_error() {
    let url = serve_once("404 Not Found", "not here");
    let err = fetch_university_table(&url, Duration::from_secs(5)).unwrap_err();
    assert!(err.is_io(), "{err}");
}

#[test]
fn malformed_body_is_io_error() {
    let url = serve_once("200 OK", "a,b\n1,2\n3\n");
    let err = fetch_university_table(&url, Duration::from_secs(5)).unwrap_err();
    assert!(err.is_io(), "{err}");
}

#[test]
fn connection_refused_is_io_error() {
    let err = fetch_university_table(&refused_url(), Duration::from_secs(2)).unwrap_err();
    assert!(err.is_io(), "{err}");
}

#[test]
fn silent_server_hits_timeout() {
    let url = serve_silence(Duration::from_secs(3));
    let err = fetch_university_table(&url, Duration::from_millis(200)).unwrap_err();
    assert!(err.is_io(), "{err}");
}
