//! Integration test for logging initialization.
//!
//! The global tracing subscriber can only be installed once per process,
//! so everything that needs a live subscriber lives in this single test.

use std::time::Duration;

use tempfile::tempdir;
use tracing::info;

use circlescope::logging::init_logging;

#[tokio::test]
async fn test_init_logging_clears_previous_file_and_writes() {
    let dir = tempdir().expect("temp dir");
    let dir_str = dir.path().to_str().unwrap();

    // Leftovers from an earlier session must not survive init.
    let log_path = dir.path().join("circlescope.log");
    std::fs::write(&log_path, "stale line from a previous run\n").expect("seed log");

    let guard = init_logging(dir_str, "circlescope.log").expect("logging init");

    info!("session starting for test");
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(guard); // flushes the non-blocking writer

    assert!(log_path.exists(), "log file should be created");
    let contents = std::fs::read_to_string(&log_path).expect("read log");
    assert!(
        contents.contains("session starting for test"),
        "log line should be flushed to the file"
    );
    assert!(
        !contents.contains("stale line from a previous run"),
        "previous file content should be cleared on init"
    );
}
