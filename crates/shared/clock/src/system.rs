use chrono::Utc;
use scalper_core::Timestamp;
use scalper_ports::Clock;

/// Wall-clock time for live and paper sessions
///
/// Stamps tick handling, bot log entries, ledger records and snapshot save
/// times. Tests use `ManualClock` instead so those stamps are predictable.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }

    fn name(&self) -> &str {
        "SystemClock"
    }
}
