//! Integration tests for sendgate
//!
//! These tests exercise full workflows across multiple modules to ensure
//! proper integration between the governor, the delivery client, and the
//! event stream.

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use async_trait::async_trait;
    use crossbeam_channel::{unbounded, Receiver, Sender};
    use parking_lot::Mutex;

    use crate::client::{run_client, ChatEngine};
    use crate::filter::{NoFilter, PatternFilter};
    use crate::protocol::{ChatEvent, ChatMode, ClanType, DeliveryRequest};
    use crate::service::{MessageService, RejectReason, SendOutcome};
    use crate::throttle::ThrottleConfig;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum EngineCall {
        Public {
            text: String,
            mode_value: i32,
            clan_value: i32,
        },
        Private {
            target: String,
            text: String,
        },
    }

    struct RecordingEngine {
        calls: Mutex<Vec<EngineCall>>,
    }

    #[async_trait]
    impl ChatEngine for RecordingEngine {
        async fn send_public(
            &self,
            text: &str,
            mode_value: i32,
            clan_value: i32,
        ) -> anyhow::Result<()> {
            self.calls.lock().push(EngineCall::Public {
                text: text.to_string(),
                mode_value,
                clan_value,
            });
            Ok(())
        }

        async fn send_private(&self, target: &str, text: &str) -> anyhow::Result<()> {
            self.calls.lock().push(EngineCall::Private {
                target: target.to_string(),
                text: text.to_string(),
            });
            Ok(())
        }
    }

    struct Pipeline {
        service: MessageService,
        engine: Arc<RecordingEngine>,
        delivery_tx: Sender<DeliveryRequest>,
        event_rx: Receiver<ChatEvent>,
        handle: thread::JoinHandle<()>,
    }

    /// Spawn a delivery client thread wired to a fresh service.
    fn spawn_pipeline(config: ThrottleConfig) -> Pipeline {
        let (delivery_tx, delivery_rx) = unbounded::<DeliveryRequest>();
        let (event_tx, event_rx) = unbounded::<ChatEvent>();

        let engine = Arc::new(RecordingEngine {
            calls: Mutex::new(Vec::new()),
        });
        let client_engine = Arc::clone(&engine) as Arc<dyn ChatEngine>;
        let client_event_tx = event_tx.clone();
        let handle = thread::spawn(move || {
            run_client(client_engine, delivery_rx, client_event_tx);
        });

        let service = MessageService::new(
            Arc::new(NoFilter),
            config,
            delivery_tx.clone(),
            event_tx,
        );

        Pipeline {
            service,
            engine,
            delivery_tx,
            event_rx,
            handle,
        }
    }

    fn drain_events(event_rx: &Receiver<ChatEvent>, n: usize) -> Vec<ChatEvent> {
        let mut events = Vec::new();
        while events.len() < n {
            match event_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(event) => events.push(event),
                Err(_) => break,
            }
        }
        events
    }

    /// Test the full send pipeline: governor accept, delivery submission
    /// order, and event emission order.
    #[test]
    fn test_send_pipeline_delivers_in_order() {
        // Cooldown off so three rapid sends all pass the governor
        let config = ThrottleConfig {
            cooldown_ms: 0,
            ..ThrottleConfig::default()
        };
        let pipeline = spawn_pipeline(config);

        match pipeline
            .service
            .send_message("first", ChatMode::Public, None)
        {
            SendOutcome::Accepted { mode, clan } => {
                assert_eq!(mode, ChatMode::Public);
                assert_eq!(clan, ClanType::Normal);
            }
            other => panic!("Expected accepted send, got {:?}", other),
        }

        match pipeline
            .service
            .send_message("group hello", ChatMode::ClanGim, None)
        {
            SendOutcome::Accepted { mode, clan } => {
                assert_eq!(mode, ChatMode::ClanMain);
                assert_eq!(clan, ClanType::Ironman);
            }
            other => panic!("Expected accepted send, got {:?}", other),
        }

        match pipeline.service.send_private("psst", "alice") {
            SendOutcome::Accepted { mode, .. } => assert_eq!(mode, ChatMode::Private),
            other => panic!("Expected accepted private send, got {:?}", other),
        }

        pipeline
            .delivery_tx
            .send(DeliveryRequest::Shutdown)
            .unwrap();
        pipeline.handle.join().unwrap();

        let calls = pipeline.engine.calls.lock().clone();
        assert_eq!(
            calls,
            vec![
                EngineCall::Public {
                    text: "first".to_string(),
                    mode_value: 0,
                    clan_value: 0,
                },
                EngineCall::Public {
                    text: "group hello".to_string(),
                    mode_value: 2,
                    clan_value: 1,
                },
                EngineCall::Private {
                    target: "alice".to_string(),
                    text: "psst".to_string(),
                },
            ]
        );

        // Events arrive in submission order; the private send records to
        // history before it announces completion
        let events = drain_events(&pipeline.event_rx, 4);
        assert_eq!(events.len(), 4);
        match &events[0] {
            ChatEvent::SendAccepted { text, .. } => assert_eq!(text, "first"),
            other => panic!("Expected SendAccepted, got {:?}", other),
        }
        match &events[1] {
            ChatEvent::SendAccepted {
                text,
                mode_value,
                clan_value,
            } => {
                assert_eq!(text, "group hello");
                assert_eq!(*mode_value, 2);
                assert_eq!(*clan_value, 1);
            }
            other => panic!("Expected SendAccepted, got {:?}", other),
        }
        match &events[2] {
            ChatEvent::PrivateSendRecorded { text } => assert_eq!(text, "psst"),
            other => panic!("Expected PrivateSendRecorded, got {:?}", other),
        }
        match &events[3] {
            ChatEvent::PrivateSendAccepted { text, target } => {
                assert_eq!(text, "psst");
                assert_eq!(target, "alice");
            }
            other => panic!("Expected PrivateSendAccepted, got {:?}", other),
        }
    }

    /// Test a burst that trips the lock: five sends go through, the sixth
    /// is refused, and the event stream carries the lock notification.
    #[test]
    fn test_burst_lock_workflow() {
        let pipeline = spawn_pipeline(ThrottleConfig::default());

        for i in 0..5 {
            match pipeline
                .service
                .send_message(&format!("burst {}", i), ChatMode::Public, None)
            {
                SendOutcome::Accepted { .. } => {}
                other => panic!("Expected send {} accepted, got {:?}", i, other),
            }
        }

        match pipeline
            .service
            .send_message("burst 5", ChatMode::Public, None)
        {
            SendOutcome::Locked {
                target,
                locked_until,
                private,
            } => {
                assert_eq!(target, None);
                assert!(locked_until > 0);
                assert!(!private);
            }
            other => panic!("Expected locked send, got {:?}", other),
        }
        assert!(pipeline.service.is_send_locked());

        pipeline
            .delivery_tx
            .send(DeliveryRequest::Shutdown)
            .unwrap();
        pipeline.handle.join().unwrap();

        // Only the five accepted sends reached the engine
        let calls = pipeline.engine.calls.lock().clone();
        assert_eq!(calls.len(), 5);
        assert!(calls.iter().all(|c| matches!(c, EngineCall::Public { .. })));

        // Five accept events plus one lock event; the lock event comes from
        // the governor thread, so only the counts are deterministic
        let events = drain_events(&pipeline.event_rx, 6);
        assert_eq!(events.len(), 6);
        let accepted = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::SendAccepted { .. }))
            .count();
        let locked = events
            .iter()
            .filter(|e| matches!(e, ChatEvent::SendLocked { private: false, .. }))
            .count();
        assert_eq!(accepted, 5);
        assert_eq!(locked, 1);
    }

    /// Test that a locked private send reports its target through both the
    /// outcome and the event stream.
    #[test]
    fn test_locked_private_send_reports_target() {
        let (delivery_tx, delivery_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let service = MessageService::new(
            Arc::new(NoFilter),
            ThrottleConfig::default(),
            delivery_tx,
            event_tx,
        );

        for i in 0..5 {
            match service.send_message(&format!("burst {}", i), ChatMode::Public, None) {
                SendOutcome::Accepted { .. } => {}
                other => panic!("Expected send {} accepted, got {:?}", i, other),
            }
        }

        match service.send_private("you there?", "alice") {
            SendOutcome::Locked {
                target,
                locked_until,
                private,
            } => {
                assert_eq!(target.as_deref(), Some("alice"));
                assert!(locked_until > 0);
                assert!(private);
            }
            other => panic!("Expected locked private send, got {:?}", other),
        }

        match event_rx.try_recv().unwrap() {
            ChatEvent::SendLocked {
                target,
                locked_until,
                private,
            } => {
                assert_eq!(target.as_deref(), Some("alice"));
                assert!(locked_until > 0);
                assert!(private);
            }
            other => panic!("Expected SendLocked, got {:?}", other),
        }

        // Only the five public sends were queued
        let queued: Vec<_> = delivery_rx.try_iter().collect();
        assert_eq!(queued.len(), 5);
        assert!(queued
            .iter()
            .all(|r| matches!(r, DeliveryRequest::Public { .. })));
    }

    /// Test lock recovery: reset_locks reopens the gate while the cooldown
    /// from the last accepted send stays in force.
    #[test]
    fn test_reset_unlocks_next_send() {
        let (delivery_tx, delivery_rx) = unbounded();
        let (event_tx, _event_rx) = unbounded();
        let service = MessageService::new(
            Arc::new(NoFilter),
            ThrottleConfig::default(),
            delivery_tx,
            event_tx,
        );

        for i in 0..5 {
            service.send_message(&format!("burst {}", i), ChatMode::Public, None);
        }
        assert!(matches!(
            service.send_message("burst 5", ChatMode::Public, None),
            SendOutcome::Locked { .. }
        ));
        assert!(service.is_send_locked());

        service.reset_locks();
        assert!(!service.is_send_locked());
        assert!(service.is_send_cooldown_active());

        match service.send_private("you there?", "alice") {
            SendOutcome::Accepted { .. } => {}
            other => panic!("Expected accepted private send, got {:?}", other),
        }

        assert_eq!(delivery_rx.try_iter().count(), 6);
    }

    /// Test that the content gate blocks text before any throttle
    /// accounting or queueing happens.
    #[test]
    fn test_filter_blocks_before_delivery() {
        let (delivery_tx, delivery_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let filter = Arc::new(PatternFilter::new(&["(?i)buy gold".to_string()]));
        let service =
            MessageService::new(filter, ThrottleConfig::default(), delivery_tx, event_tx);

        assert_eq!(
            service.send_message("Buy Gold cheap!!", ChatMode::Public, None),
            SendOutcome::Rejected(RejectReason::Filtered)
        );
        assert_eq!(
            service.send_private("BUY GOLD now", "alice"),
            SendOutcome::Rejected(RejectReason::Filtered)
        );

        // Filtered attempts leave no trace: no queued requests, no events,
        // and no cooldown accounting
        assert!(delivery_rx.try_recv().is_err());
        assert!(event_rx.try_recv().is_err());
        assert!(!service.is_send_cooldown_active());

        match service.send_message("totally fine", ChatMode::Public, None) {
            SendOutcome::Accepted { .. } => {}
            other => panic!("Expected accepted send, got {:?}", other),
        }
        match delivery_rx.try_recv().unwrap() {
            DeliveryRequest::Public { text, .. } => assert_eq!(text, "totally fine"),
            other => panic!("Expected public request, got {:?}", other),
        }
    }

    /// Test delivery request channel communication
    #[test]
    fn test_delivery_request_channel() {
        let (delivery_tx, delivery_rx) = unbounded::<DeliveryRequest>();

        delivery_tx
            .send(DeliveryRequest::Public {
                text: "hello".to_string(),
                mode_value: 2,
                clan_value: 1,
            })
            .unwrap();
        delivery_tx
            .send(DeliveryRequest::Private {
                target: "alice".to_string(),
                text: "psst".to_string(),
            })
            .unwrap();
        delivery_tx.send(DeliveryRequest::Shutdown).unwrap();

        match delivery_rx.recv().unwrap() {
            DeliveryRequest::Public {
                text,
                mode_value,
                clan_value,
            } => {
                assert_eq!(text, "hello");
                assert_eq!(mode_value, 2);
                assert_eq!(clan_value, 1);
            }
            _ => panic!("Expected Public request"),
        }

        match delivery_rx.recv().unwrap() {
            DeliveryRequest::Private { target, text } => {
                assert_eq!(target, "alice");
                assert_eq!(text, "psst");
            }
            _ => panic!("Expected Private request"),
        }

        assert!(matches!(
            delivery_rx.recv().unwrap(),
            DeliveryRequest::Shutdown
        ));
    }
}
