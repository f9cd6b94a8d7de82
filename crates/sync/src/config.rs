use core::time::Duration;

/// Timing knobs of the sync queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Period of the automatic flush.
    pub flush_interval: Duration,
    /// A submission taking longer than this counts as failed.
    pub request_timeout: Duration,
    /// Consecutive failures after which a project reports
    /// [`crate::QueueState::Failed`]. Retrying continues regardless.
    pub max_retries: u32,
}

impl SyncConfig {
    pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
    pub const DEFAULT_MAX_RETRIES: u32 = 5;
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            flush_interval: Self::DEFAULT_FLUSH_INTERVAL,
            request_timeout: Self::DEFAULT_REQUEST_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        }
    }
}
