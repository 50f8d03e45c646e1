use std::time::Duration;

/// Mixer service endpoint used when none is configured
pub const DEFAULT_MIXER_URL: &str = "ws://127.0.0.1:8768/mixer";

/// Upper bound for connecting and for each request round-trip
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Notification display time used when `--notify` has no usable value
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Connection settings for [`RemoteMixer`](crate::RemoteMixer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MixerConfig {
    /// WebSocket URL of the mixer service
    pub url: String,

    pub request_timeout: Duration,
}

impl MixerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MIXER_URL)
    }
}
