//! Debouncing for discrete gesture actions.
//!
//! The classifier repeats the same label for every sample while a pose is
//! held. A single `ActionClock` records when the last discrete action fired;
//! each pose kind carries a `CooldownPolicy` saying how long must pass since
//! then and what happens when the action turns out to be a no-op.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownPolicy {
    /// Minimum time since the last action before this one may fire
    #[serde(with = "millis")]
    pub window: Duration,
    /// Whether a successful action restarts the clock
    pub consume_on_action: bool,
    /// Whether an attempt that changes nothing still restarts the clock
    pub consume_on_noop: bool,
}

impl CooldownPolicy {
    pub const fn new(window: Duration, consume_on_noop: bool) -> Self {
        Self {
            window,
            consume_on_action: true,
            consume_on_noop,
        }
    }

    pub const fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms), false)
    }

    /// Never gated and never restarts the clock.
    pub const fn exempt() -> Self {
        Self {
            window: Duration::ZERO,
            consume_on_action: false,
            consume_on_noop: false,
        }
    }

    pub fn is_exempt(&self) -> bool {
        self.window.is_zero() && !self.consume_on_action && !self.consume_on_noop
    }
}

/// Timestamp of the last discrete action, shared by all pose kinds.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionClock {
    last_action: Option<Instant>,
}

impl ActionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if strictly more than the policy window has elapsed since the
    /// last action (or nothing has fired yet).
    pub fn is_ready(&self, policy: &CooldownPolicy, now: Instant) -> bool {
        if policy.window.is_zero() {
            return true;
        }
        match self.last_action {
            None => true,
            Some(last) => now.saturating_duration_since(last) > policy.window,
        }
    }

    /// Record the outcome of an attempt made while ready.
    pub fn settle(&mut self, policy: &CooldownPolicy, now: Instant, acted: bool) {
        let consume = if acted {
            policy.consume_on_action
        } else {
            policy.consume_on_noop
        };
        if consume {
            self.last_action = Some(now);
        }
    }

    pub fn last_action(&self) -> Option<Instant> {
        self.last_action
    }

    pub fn reset(&mut self) {
        self.last_action = None;
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
