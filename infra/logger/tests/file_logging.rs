use std::fs;
use std::time::Duration;
use tempfile::tempdir;
use wayfare_logger::{LevelFilter, Logger};

#[test]
fn json_file_logging_writes_structured_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("wayfare-file-logging")
        .console(false)
        .level(LevelFilter::INFO)
        .path(&log_dir)
        .max_files(2)
        .json()
        .init()?;
    assert!(logger.writes_files());

    tracing::info!(reference = "WF-FILE0001", "booking confirmed");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let line = contents
        .lines()
        .find(|line| line.contains("WF-FILE0001"))
        .expect("event should be written");
    let value: serde_json::Value = serde_json::from_str(line)?;
    assert_eq!(value["fields"]["message"], "booking confirmed");

    Ok(())
}
