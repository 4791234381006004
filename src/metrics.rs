//! Metric names and timing helpers
//!
//! Metrics are emitted through the `metrics` facade. Nothing is recorded
//! unless the application installs a recorder.

use std::time::Instant;

/// Envelope encryptions started
pub const ENVELOPE_ENCRYPT: &str = "cryptoagility.envelope.encrypt";

/// Envelope decryptions started
pub const ENVELOPE_DECRYPT: &str = "cryptoagility.envelope.decrypt";

/// Envelope encryption latency
pub const ENVELOPE_ENCRYPT_TIME: &str = "cryptoagility.envelope.encrypt.time";

/// Envelope decryption latency
pub const ENVELOPE_DECRYPT_TIME: &str = "cryptoagility.envelope.decrypt.time";

/// DEKs the remote KEK refused to unwrap, or that were unusable once unwrapped
pub const ENVELOPE_UNWRAP_FAILURES: &str = "cryptoagility.envelope.unwrap_failures";

/// Successful key manager registrations
pub const REGISTRY_REGISTER: &str = "cryptoagility.registry.register";

/// Records the elapsed time into a histogram when dropped
#[derive(Debug)]
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Starts a timer for the given histogram
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        metrics::histogram!(self.name, self.start.elapsed());
    }
}

/// Starts a [`Timer`](crate::metrics::Timer) that records on scope exit
#[macro_export]
macro_rules! timer {
    ($name:expr) => {
        $crate::metrics::Timer::new($name)
    };
}
