//! Demo REPL command handling (/mode, /msg, /status, /reset, /filter).

use std::sync::Arc;

use crate::filter::PatternFilter;
use crate::protocol::ChatMode;
use crate::service::{MessageService, RejectReason, SendOutcome};
use crate::throttle;
use crate::validation;

/// Front-end session state for the demo REPL.
pub struct SessionState {
    /// Mode applied to plain (non-command) input
    pub mode: ChatMode,
}

impl SessionState {
    pub fn new(mode: ChatMode) -> Self {
        Self { mode }
    }
}

/// Handle one line of user input.
/// Returns false when the REPL should exit, true otherwise.
pub fn handle_line(
    line: &str,
    session: &mut SessionState,
    service: &MessageService,
    filter: &Arc<PatternFilter>,
) -> bool {
    let s = line.trim();
    if s.is_empty() {
        return true;
    }

    if !s.starts_with('/') {
        send_in_current_mode(s, session, service);
        return true;
    }

    // Remove leading '/'
    let cmdline = s[1..].trim();
    let mut parts = cmdline.split_whitespace();
    let cmd = parts.next().unwrap_or("").to_lowercase();

    match cmd.as_str() {
        "mode" | "m" => {
            if let Some(label) = parts.next() {
                match ChatMode::from_label(label) {
                    Some(ChatMode::Private) => {
                        println!("Use /msg <target> <message> for private sends");
                    }
                    Some(mode) => {
                        session.mode = mode;
                        println!("Mode set to {}", mode.label());
                    }
                    None => println!("Unknown mode: {}", label),
                }
            } else {
                println!("Usage: /mode <public|friends|clan|guest|gim>");
            }
        }
        "msg" | "w" => {
            if let Some(target) = parts.next() {
                let text = parts.collect::<Vec<_>>().join(" ");
                if text.is_empty() {
                    println!("Usage: /msg <target> <message>");
                } else if let Err(e) = validation::validate_target(target) {
                    println!("{}", e);
                } else {
                    report(service.send_private(&validation::sanitize_message(&text), target));
                }
            } else {
                println!("Usage: /msg <target> <message>");
            }
        }
        "status" => {
            let cooldown = if service.is_send_cooldown_active() {
                "active"
            } else {
                "inactive"
            };
            if service.is_send_locked() {
                let remaining = service.locked_until().saturating_sub(throttle::now_ms());
                println!(
                    "mode: {} | cooldown: {} | locked for another {} ms",
                    session.mode.label(),
                    cooldown,
                    remaining
                );
            } else {
                println!(
                    "mode: {} | cooldown: {} | not locked",
                    session.mode.label(),
                    cooldown
                );
            }
        }
        "reset" => {
            service.reset_locks();
            println!("Lock state cleared");
        }
        "filter" => {
            let pattern = parts.collect::<Vec<_>>().join(" ");
            if pattern.is_empty() {
                println!("{} filter patterns active", filter.pattern_count());
            } else {
                match filter.add_pattern(&pattern) {
                    Ok(()) => println!("Pattern added"),
                    Err(e) => println!("{}", e),
                }
            }
        }
        "help" => {
            println!("Supported commands: /mode, /msg, /status, /reset, /filter, /quit");
        }
        "quit" | "exit" => return false,
        unknown => {
            println!("Unknown command: /{}", unknown);
        }
    }
    true
}

fn send_in_current_mode(text: &str, session: &SessionState, service: &MessageService) {
    if let Err(e) = validation::validate_message(text) {
        println!("{}", e);
        return;
    }
    let text = validation::sanitize_message(text);
    report(service.send_message(&text, session.mode, None));
}

fn report(outcome: SendOutcome) {
    match outcome {
        // Accepted sends are announced by the event stream once delivered.
        SendOutcome::Accepted { .. } => {}
        SendOutcome::Rejected(RejectReason::EmptyText) => println!("Nothing to send"),
        SendOutcome::Rejected(RejectReason::Filtered) => println!("Message blocked by filter"),
        SendOutcome::Rejected(RejectReason::MissingTarget) => {
            println!("No target: use /msg <target> <message>")
        }
        SendOutcome::Locked { locked_until, .. } => {
            let remaining = locked_until.saturating_sub(throttle::now_ms());
            println!("Sending is locked for another {} ms", remaining);
        }
    }
}
