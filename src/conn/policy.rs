// src/conn/policy.rs

//! Reconnect policies.
//!
//! The production policy is a fixed delay with no growth and no retry cap:
//! the manager keeps retrying until it is torn down. Tests swap in
//! [`Immediate`] to avoid waiting on timers.

use std::fmt;
use std::time::Duration;

/// Default delay between losing the connection and the next attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Decides how long to wait before reconnect attempt `attempt`
/// (1-based, reset by every successful handshake).
pub trait ReconnectPolicy: Send + fmt::Debug {
    fn delay(&self, attempt: u32) -> Duration;
}

/// Same delay for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl Default for FixedDelay {
    fn default() -> Self {
        FixedDelay(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Reconnect without waiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

impl ReconnectPolicy for Immediate {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}
