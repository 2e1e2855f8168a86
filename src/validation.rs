//! Input validation for the demo front-end.
//!
//! The message service's own contract is only "non-empty after trimming";
//! these helpers apply stricter hygiene before input reaches it.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum accepted message length in characters.
pub const MAX_MESSAGE_LEN: usize = 500;

// Target names: 1-12 characters, starting alphanumeric, then letters, digits,
// spaces, '-' or '_'.
static TARGET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _-]{0,11}$").expect("target pattern is valid")
});

/// Validates a private-message target name.
pub fn validate_target(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Target name cannot be empty".to_string());
    }

    if !TARGET_RE.is_match(name) {
        return Err(format!("Invalid target name: '{}'", name));
    }

    Ok(())
}

/// Validates a chat message before it is offered to the service.
pub fn validate_message(msg: &str) -> Result<(), String> {
    if msg.trim().is_empty() {
        return Err("Message cannot be empty".to_string());
    }

    if msg.chars().count() > MAX_MESSAGE_LEN {
        return Err(format!(
            "Message too long (max {} characters)",
            MAX_MESSAGE_LEN
        ));
    }

    if msg.chars().any(|c| c.is_control()) {
        return Err("Message cannot contain control characters".to_string());
    }

    Ok(())
}

/// Sanitizes a message by dropping control characters and capping the length.
pub fn sanitize_message(msg: &str) -> String {
    msg.chars()
        .filter(|c| !c.is_control())
        .take(MAX_MESSAGE_LEN)
        .collect::<String>()
        .trim()
        .to_string()
}
