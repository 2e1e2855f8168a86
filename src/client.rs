//! Delivery client loop: executes accepted sends on one dedicated thread.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

use crate::protocol::{ChatEvent, DeliveryRequest};

/// Delivery collaborator. Implementations run on the client thread, one
/// request at a time, and are called exactly once per accepted send.
#[async_trait]
pub trait ChatEngine: Send + Sync {
    async fn send_public(&self, text: &str, mode_value: i32, clan_value: i32) -> Result<()>;
    async fn send_private(&self, target: &str, text: &str) -> Result<()>;
}

/// Demo engine that logs deliveries after a short simulated wire delay.
pub struct EchoEngine;

#[async_trait]
impl ChatEngine for EchoEngine {
    async fn send_public(&self, text: &str, mode_value: i32, clan_value: i32) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        info!(mode_value, clan_value, "delivered: {}", text);
        Ok(())
    }

    async fn send_private(&self, target: &str, text: &str) -> Result<()> {
        tokio::time::sleep(Duration::from_millis(25)).await;
        info!(target, "delivered private: {}", text);
        Ok(())
    }
}

/// Run the delivery loop on a tokio runtime. Intended for a dedicated thread:
/// drains requests in order, hands each to the engine, and emits the matching
/// events after every submit.
pub fn run_client(
    engine: Arc<dyn ChatEngine>,
    delivery_rx: Receiver<DeliveryRequest>,
    event_tx: Sender<ChatEvent>,
) {
    // Create a Tokio runtime for this thread
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            let _ = event_tx.send(ChatEvent::Error(format!(
                "Failed to create Tokio runtime: {}",
                e
            )));
            return;
        }
    };

    rt.block_on(async move {
        loop {
            // Check for requests from the service (non-blocking)
            match delivery_rx.try_recv() {
                Ok(request) => {
                    if !deliver(engine.as_ref(), request, &event_tx).await {
                        info!("delivery client stopping");
                        break;
                    }
                }
                Err(TryRecvError::Empty) => {
                    // No work, sleep a bit to avoid busy-looping
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                Err(TryRecvError::Disconnected) => {
                    debug!("delivery channel closed");
                    break;
                }
            }
        }
    });
}

/// Submit one request to the engine. Returns false when the loop should stop.
async fn deliver(
    engine: &dyn ChatEngine,
    request: DeliveryRequest,
    event_tx: &Sender<ChatEvent>,
) -> bool {
    match request {
        DeliveryRequest::Shutdown => return false,
        DeliveryRequest::Public {
            text,
            mode_value,
            clan_value,
        } => match engine.send_public(&text, mode_value, clan_value).await {
            Ok(()) => {
                let _ = event_tx.send(ChatEvent::SendAccepted {
                    text,
                    mode_value,
                    clan_value,
                });
            }
            Err(e) => {
                error!(error = %e, "public delivery failed");
                let _ = event_tx.send(ChatEvent::Error(format!("Delivery failed: {}", e)));
            }
        },
        DeliveryRequest::Private { target, text } => {
            match engine.send_private(&target, &text).await {
                Ok(()) => {
                    // History record first, then the sent notification.
                    let _ = event_tx.send(ChatEvent::PrivateSendRecorded { text: text.clone() });
                    let _ = event_tx.send(ChatEvent::PrivateSendAccepted { text, target });
                }
                Err(e) => {
                    error!(error = %e, target, "private delivery failed");
                    let _ = event_tx.send(ChatEvent::Error(format!("Delivery failed: {}", e)));
                }
            }
        }
    }
    true
}
