use wayfare_logger::{LevelFilter, Logger};

#[test]
fn console_only_logger_has_no_file_writer() {
    let logger = Logger::builder()
        .name("wayfare-console-only")
        .console(true)
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    tracing::info!(reference = "WF-TEST0001", "console only line");
    assert!(!logger.writes_files(), "console-only logger should not attach a file writer");
}
