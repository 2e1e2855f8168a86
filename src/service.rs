//! Outbound message service: content gate, send throttle, delivery dispatch.

use std::sync::Arc;

use crossbeam_channel::Sender;
use tracing::{debug, warn};

use crate::filter::ContentFilter;
use crate::protocol::{ChatEvent, ChatMode, ClanType, DeliveryRequest};
use crate::throttle::{Admission, SendThrottle, ThrottleConfig};

/// Why a send was dropped before reaching the throttle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Text was empty after trimming
    EmptyText,
    /// The content gate vetoed the text
    Filtered,
    /// Private mode without a target
    MissingTarget,
}

/// Result of a send attempt. Every outcome is a value; the service never
/// retries on the caller's behalf, and all backoff is expressed as the
/// returned lock deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message was queued for delivery
    Accepted { mode: ChatMode, clan: ClanType },
    /// The attempt was dropped with no throttle accounting
    Rejected(RejectReason),
    /// The throttle refused the attempt; retry after `locked_until`
    Locked {
        target: Option<String>,
        locked_until: u64,
        private: bool,
    },
}

/// Routes outgoing messages through the content gate and the send throttle,
/// queues accepted messages for the delivery client thread, and announces
/// vetoes on the event channel.
pub struct MessageService {
    filter: Arc<dyn ContentFilter>,
    throttle: SendThrottle,
    delivery_tx: Sender<DeliveryRequest>,
    event_tx: Sender<ChatEvent>,
}

impl MessageService {
    pub fn new(
        filter: Arc<dyn ContentFilter>,
        config: ThrottleConfig,
        delivery_tx: Sender<DeliveryRequest>,
        event_tx: Sender<ChatEvent>,
    ) -> Self {
        Self {
            filter,
            throttle: SendThrottle::new(config),
            delivery_tx,
            event_tx,
        }
    }

    /// Send a message in the requested mode. `target` is required for
    /// `ChatMode::Private` and carried through lock notifications otherwise.
    pub fn send_message(&self, text: &str, mode: ChatMode, target: Option<&str>) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Rejected(RejectReason::EmptyText);
        }

        if mode == ChatMode::Private {
            // The direct path owns the whole private flow; the target check
            // comes before any gate or throttle touch.
            let target = target.map(str::trim).unwrap_or_default();
            if target.is_empty() {
                warn!("private send attempted without a target");
                return SendOutcome::Rejected(RejectReason::MissingTarget);
            }
            return self.send_private(text, target);
        }

        if self.filter.is_filtered(text) {
            return SendOutcome::Rejected(RejectReason::Filtered);
        }

        match self.throttle.admit() {
            Admission::Locked { locked_until } => {
                debug!(len = text.len(), locked_until, "send refused by lockout");
                self.notify_locked(target, locked_until, false)
            }
            Admission::Admitted => {
                let (mode, clan) = mode.resolve();
                let _ = self.delivery_tx.send(DeliveryRequest::Public {
                    text: text.to_string(),
                    mode_value: mode.value(),
                    clan_value: clan.value(),
                });
                SendOutcome::Accepted { mode, clan }
            }
        }
    }

    /// Send a private message to a named target. Identical throttle
    /// accounting to `send_message`, with its own delivery payload and events.
    pub fn send_private(&self, text: &str, target: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            warn!("attempted to send an empty private message");
            return SendOutcome::Rejected(RejectReason::EmptyText);
        }

        let target = target.trim();
        if target.is_empty() {
            warn!("attempted to send a private message without a target");
            return SendOutcome::Rejected(RejectReason::MissingTarget);
        }

        if self.filter.is_filtered(text) {
            return SendOutcome::Rejected(RejectReason::Filtered);
        }

        match self.throttle.admit() {
            Admission::Locked { locked_until } => {
                debug!(target, locked_until, "private send refused by lockout");
                self.notify_locked(Some(target), locked_until, true)
            }
            Admission::Admitted => {
                let _ = self.delivery_tx.send(DeliveryRequest::Private {
                    target: target.to_string(),
                    text: text.to_string(),
                });
                SendOutcome::Accepted {
                    mode: ChatMode::Private,
                    clan: ClanType::Normal,
                }
            }
        }
    }

    /// Clear lock state and burst accounting; the cooldown window from the
    /// last send stays in force.
    pub fn reset_locks(&self) {
        self.throttle.reset_locks();
    }

    /// Teardown: clears lock state and the last-send timestamp. The service
    /// stays usable afterwards.
    pub fn shut_down(&self) {
        self.throttle.clear();
        debug!("message service shut down, throttle state cleared");
    }

    /// True while the cooldown window from the last accepted send is active.
    pub fn is_send_cooldown_active(&self) -> bool {
        self.throttle.is_cooldown_active()
    }

    /// True while a lockout is in force.
    pub fn is_send_locked(&self) -> bool {
        self.throttle.is_locked()
    }

    /// Raw lock deadline (epoch ms); 0 if a lock was never set.
    pub fn locked_until(&self) -> u64 {
        self.throttle.locked_until()
    }

    fn notify_locked(&self, target: Option<&str>, locked_until: u64, private: bool) -> SendOutcome {
        let target = target.map(str::to_string);
        // A departed observer never fails the send path.
        let _ = self.event_tx.send(ChatEvent::SendLocked {
            target: target.clone(),
            locked_until,
            private,
        });
        SendOutcome::Locked {
            target,
            locked_until,
            private,
        }
    }
}
