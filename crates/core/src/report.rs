//! User-facing reporting seam

/// Tracing target of the durable activity record
pub const ACTIVITY_TARGET: &str = "autocommit::activity";

/// Sink for activity messages
///
/// `log` is the durable, timestamped activity record. `notify` is best-effort
/// and user-facing only; callers log separately whatever they notify.
pub trait Reporter: Send + Sync {
    fn log(&self, message: &str);

    fn notify(&self, message: &str);
}
