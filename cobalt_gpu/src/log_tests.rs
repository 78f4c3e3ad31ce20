//! Unit tests for log.rs
//!
//! Tests LogSeverity, LogEntry, DefaultLogger formatting and the error macros.

use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use crate::cobalt::{Engine, Error, Result};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use serial_test::serial;

// ============================================================================
// TEST HELPERS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

/// Entries emitted by these tests only (other tests log concurrently)
fn own(entries: &Arc<Mutex<Vec<LogEntry>>>) -> Vec<LogEntry> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.source == "cobalt::Test")
        .cloned()
        .collect()
}

fn capture() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

fn entry(severity: LogSeverity, file: Option<&'static str>, line: Option<u32>) -> LogEntry {
    LogEntry {
        severity,
        timestamp: SystemTime::now(),
        source: "cobalt::Test".to_string(),
        message: "something happened".to_string(),
        file,
        line,
    }
}

// ============================================================================
// LOG SEVERITY TESTS
// ============================================================================

#[test]
fn test_log_severity_ordering() {
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

#[test]
fn test_log_severity_labels_have_fixed_width() {
    for severity in [
        LogSeverity::Trace,
        LogSeverity::Debug,
        LogSeverity::Info,
        LogSeverity::Warn,
        LogSeverity::Error,
    ] {
        assert_eq!(severity.label().len(), 5);
    }
    assert_eq!(LogSeverity::Info.label().trim(), "INFO");
}

// ============================================================================
// DEFAULT LOGGER FORMAT TESTS
// ============================================================================

#[test]
fn test_format_plain_without_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Warn, None, None));
    assert!(line.contains("[WARN ]"));
    assert!(line.contains("[cobalt::Test]"));
    assert!(line.ends_with("something happened"));
}

#[test]
fn test_format_plain_with_location() {
    let line = DefaultLogger::format_plain(&entry(LogSeverity::Error, Some("src/queue.rs"), Some(42)));
    assert!(line.contains("[ERROR]"));
    assert!(line.ends_with("(src/queue.rs:42)"));
}

#[test]
fn test_default_logger_does_not_panic() {
    let logger = DefaultLogger;
    logger.log(&entry(LogSeverity::Trace, None, None));
    logger.log(&entry(LogSeverity::Error, Some("file.rs"), Some(1)));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_err_logs_and_builds_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("cobalt::Test", "bad value {}", 7);

    assert_eq!(err, Error::BackendError("bad value 7".to_string()));
    let entries = own(&entries);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let _entries = capture();

    fn fails(reached: &mut bool) -> Result<()> {
        crate::engine_bail!("cobalt::Test", "stop here");
        #[allow(unreachable_code)]
        {
            *reached = true;
            Ok(())
        }
    }

    let mut reached = false;
    let result = fails(&mut reached);
    assert!(matches!(result, Err(Error::BackendError(ref m)) if m == "stop here"));
    assert!(!reached);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_fatal_panics_with_source() {
    let _entries = capture();

    let result = std::panic::catch_unwind(|| {
        crate::engine_fatal!("cobalt::Test", "contract broken");
    });

    let payload = result.unwrap_err();
    let message = payload.downcast_ref::<String>().cloned().unwrap_or_default();
    assert!(message.contains("cobalt::Test"));
    assert!(message.contains("contract broken"));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_severity_macros_route_to_logger() {
    let entries = capture();

    crate::engine_trace!("cobalt::Test", "t");
    crate::engine_debug!("cobalt::Test", "d");
    crate::engine_info!("cobalt::Test", "i");
    crate::engine_warn!("cobalt::Test", "w");
    crate::engine_error!("cobalt::Test", "e");

    let severities: Vec<LogSeverity> = own(&entries).iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![
            LogSeverity::Trace,
            LogSeverity::Debug,
            LogSeverity::Info,
            LogSeverity::Warn,
            LogSeverity::Error,
        ]
    );
    Engine::reset_logger();
}
