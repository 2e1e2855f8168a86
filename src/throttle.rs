//! Two-tier send throttle.
//!
//! A fixed cooldown separates individual sends; a burst of sends landing
//! inside the cooldown window triggers an escalating lockout, and the
//! escalation history decays after a quiet period.

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Throttle limits. The defaults are the production values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Minimum interval after a send before the next one is not a burst (ms)
    pub cooldown_ms: u64,
    /// Number of in-cooldown attempts that triggers a lockout
    pub burst_max: u32,
    /// Lockout length added per escalation step (ms)
    pub lock_step_ms: u64,
    /// Quiet interval after which escalation history is forgiven; also caps a
    /// single lockout (ms)
    pub decay_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 900,
            burst_max: 5,
            lock_step_ms: 1250,
            decay_ms: 60_000,
        }
    }
}

/// Mutable throttle state. Timestamps are epoch milliseconds, 0 = never.
#[derive(Debug, Default)]
struct ThrottleState {
    /// Time of the last admitted send (any mode)
    last_send_at: u64,
    /// Time the lock counter was last incremented
    last_lock_at: u64,
    /// Time at or after which sends are permitted again
    locked_until: u64,
    /// Sends attempted inside the cooldown window since the last reset
    hot_count: u32,
    /// Lock escalations since the last decay
    lock_count: u32,
}

/// Verdict for one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Locked { locked_until: u64 },
}

/// The throttle state machine. All fields start zeroed; every operation takes
/// the mutex once and works from a single `now` snapshot, so the compound
/// decay-then-escalate sequence is applied exactly once per breach.
pub struct SendThrottle {
    config: ThrottleConfig,
    state: Mutex<ThrottleState>,
}

impl SendThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ThrottleState::default()),
        }
    }

    /// Decide whether a send may proceed right now, updating burst and lock
    /// accounting. An admitted attempt stamps `last_send_at`; a locked attempt
    /// mutates nothing beyond the escalation that created the lock.
    pub fn admit(&self) -> Admission {
        self.admit_at(now_ms())
    }

    pub(crate) fn admit_at(&self, now_ms: u64) -> Admission {
        let mut state = self.state.lock();

        // An active lock alone governs admission until it expires.
        if now_ms < state.locked_until {
            return Admission::Locked {
                locked_until: state.locked_until,
            };
        }

        if now_ms.saturating_sub(state.last_send_at) < self.config.cooldown_ms {
            state.hot_count += 1;
            if state.hot_count >= self.config.burst_max {
                // Breach: forgive stale escalation history, then extend.
                if now_ms.saturating_sub(state.last_lock_at) >= self.config.decay_ms {
                    state.lock_count = 0;
                }
                state.last_lock_at = now_ms;
                state.lock_count += 1;
                let delay = (u64::from(state.lock_count) * self.config.lock_step_ms)
                    .min(self.config.decay_ms);
                state.locked_until = now_ms + delay;
                return Admission::Locked {
                    locked_until: state.locked_until,
                };
            }
        } else {
            // Outside the cooldown window a send never contributes to escalation.
            state.hot_count = 0;
        }

        state.last_send_at = now_ms;
        Admission::Admitted
    }

    /// Clear lock state and burst accounting. `last_send_at` survives, so the
    /// cooldown window from the last send still applies.
    pub fn reset_locks(&self) {
        let mut state = self.state.lock();
        state.last_lock_at = 0;
        state.locked_until = 0;
        state.lock_count = 0;
        state.hot_count = 0;
    }

    /// Zero the whole state, `last_send_at` included. Used on teardown.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        *state = ThrottleState::default();
    }

    /// True while the cooldown window from the last admitted send is active.
    pub fn is_cooldown_active(&self) -> bool {
        self.is_cooldown_active_at(now_ms())
    }

    pub(crate) fn is_cooldown_active_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.state.lock().last_send_at) < self.config.cooldown_ms
    }

    /// True while a lockout is in force.
    pub fn is_locked(&self) -> bool {
        self.is_locked_at(now_ms())
    }

    pub(crate) fn is_locked_at(&self, now_ms: u64) -> bool {
        now_ms < self.state.lock().locked_until
    }

    /// Raw lock deadline (epoch ms); 0 if a lock was never set. May lie in the
    /// past once a lock has expired.
    pub fn locked_until(&self) -> u64 {
        self.state.lock().locked_until
    }
}

/// Current time as epoch milliseconds.
pub(crate) fn now_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}
