//=========================================================================
// Log Capture (tests only)
//=========================================================================
//
// A `log::Log` that keeps records per thread, so parallel tests can each
// inspect what they logged. Installed once per test binary.
//
//=========================================================================

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

//=== CapturedRecord ======================================================

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CapturedRecord {
    pub(crate) level: Level,
    pub(crate) target: String,
    pub(crate) message: String,
}

thread_local! {
    static RECORDS: RefCell<Vec<CapturedRecord>> = const { RefCell::new(Vec::new()) };
}

//=== ThreadCapture =======================================================

struct ThreadCapture;

impl Log for ThreadCapture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let captured = CapturedRecord {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        RECORDS.with(|records| records.borrow_mut().push(captured));
    }

    fn flush(&self) {}
}

static LOGGER: ThreadCapture = ThreadCapture;

/// Installs the capturing logger. Safe to call from every test.
pub(crate) fn install() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
}

/// Takes every record logged on the calling thread since the last call.
pub(crate) fn take() -> Vec<CapturedRecord> {
    RECORDS.with(|records| records.borrow_mut().drain(..).collect())
}
