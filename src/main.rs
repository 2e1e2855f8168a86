//! sendgate - an outbound chat send governor with a console demo
//!
//! Architecture:
//! - Main thread: reads stdin lines and drives the send governor
//! - Delivery thread: runs a Tokio runtime for async message delivery
//! - Event thread: prints delivery events as they arrive
//! - Communication via crossbeam channels (lock-free, sync-safe)

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::unbounded;
use tracing::{info, warn};

use sendgate::client::{run_client, EchoEngine};
use sendgate::commands::{handle_line, SessionState};
use sendgate::config;
use sendgate::filter::{ContentFilter, PatternFilter};
use sendgate::logging;
use sendgate::protocol::{ChatEvent, ChatMode, DeliveryRequest};
use sendgate::service::MessageService;

fn main() {
    logging::init();

    let settings = config::load_settings();
    if let Some(path) = config::settings_path() {
        // Seed the file with defaults on first run so the knobs are visible.
        if !path.exists() {
            if let Err(e) = config::save_settings(&settings) {
                warn!("could not write default settings: {}", e);
            }
        }
        info!("settings file: {}", path.display());
    }

    // Create channels for caller <-> delivery client
    let (delivery_tx, delivery_rx) = unbounded::<DeliveryRequest>();
    let (event_tx, event_rx) = unbounded::<ChatEvent>();

    // Spawn the delivery client thread
    let engine = Arc::new(EchoEngine);
    let client_event_tx = event_tx.clone();
    let client_handle = thread::spawn(move || {
        run_client(engine, delivery_rx, client_event_tx);
    });

    // Spawn the event printer thread
    let printer_handle = thread::spawn(move || {
        while let Ok(event) = event_rx.recv() {
            match event {
                ChatEvent::SendAccepted {
                    text,
                    mode_value,
                    clan_value,
                } => {
                    println!("[sent mode={} clan={}] {}", mode_value, clan_value, text);
                }
                ChatEvent::PrivateSendRecorded { text } => {
                    println!("[history] {}", text);
                }
                ChatEvent::PrivateSendAccepted { text, target } => {
                    println!("[sent to {}] {}", target, text);
                }
                ChatEvent::SendLocked {
                    target,
                    locked_until,
                    private,
                } => {
                    let kind = if private { "private" } else { "public" };
                    match target {
                        Some(t) => {
                            println!("[locked {} until {} ms, target {}]", kind, locked_until, t)
                        }
                        None => println!("[locked {} until {} ms]", kind, locked_until),
                    }
                }
                ChatEvent::Error(msg) => println!("[error] {}", msg),
            }
        }
    });

    let filter = Arc::new(PatternFilter::new(&settings.filter_patterns));
    let service = MessageService::new(
        Arc::clone(&filter) as Arc<dyn ContentFilter>,
        settings.throttle.clone(),
        delivery_tx.clone(),
        event_tx,
    );

    // Private needs a target per send, so plain input falls back to public
    let mut session = SessionState::new(match settings.default_mode {
        ChatMode::Private => ChatMode::Public,
        mode => mode,
    });

    println!("sendgate demo. Type a message, /help for commands, /quit to exit.");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();
    loop {
        let _ = out.write_all(b"> ");
        let _ = out.flush();

        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                if !handle_line(&line, &mut session, &service, &filter) {
                    break;
                }
            }
            Err(e) => {
                eprintln!("stdin error: {}", e);
                break;
            }
        }
    }

    // Clean shutdown: stop the delivery client, then let the printer drain
    service.shut_down();
    let _ = delivery_tx.send(DeliveryRequest::Shutdown);
    let _ = client_handle.join();
    drop(service);
    drop(delivery_tx);
    let _ = printer_handle.join();

    info!("sendgate demo exiting");
}
