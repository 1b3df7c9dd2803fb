use chrono::Utc;

/// The current unix timestamp in seconds.
///
/// Order expiration is evaluated against this clock.
pub fn now_in_epoch_seconds() -> u64 {
    u64::try_from(Utc::now().timestamp()).expect("unix timestamp is not negative")
}
