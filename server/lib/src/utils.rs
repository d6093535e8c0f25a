use std::time::{Duration, SystemTime};

/// Current time as an offset from the unix epoch. Operations take this as a
/// parameter so tests can move the clock.
pub fn duration_from_epoch_now() -> Duration {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
}
