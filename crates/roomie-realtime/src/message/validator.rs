//! Message validation rules.

use roomie_core::config::RealtimeConfig;
use roomie_core::error::AppError;

use crate::relay::ChatEvent;

/// Validates a raw inbound frame before parsing.
pub fn validate_frame(raw: &str, config: &RealtimeConfig) -> Result<(), AppError> {
    if raw.len() > config.max_message_bytes {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {} bytes",
            config.max_message_bytes
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates a chat event before relaying it.
pub fn validate_chat(event: &ChatEvent, config: &RealtimeConfig) -> Result<(), AppError> {
    if event.sender_id.is_blank() || event.receiver_id.is_blank() {
        return Err(AppError::validation("Sender and receiver are required"));
    }

    if event.text.trim().is_empty() {
        return Err(AppError::validation("Message text is empty"));
    }

    if event.text.chars().count() > config.max_text_chars {
        return Err(AppError::validation(format!(
            "Message text exceeds {} characters",
            config.max_text_chars
        )));
    }

    Ok(())
}
