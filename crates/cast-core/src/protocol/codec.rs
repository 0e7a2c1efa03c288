//! Text codec for channel messages.
//!
//! Wire format: one UTF-8 JSON object per channel message.  The casting
//! transport takes care of framing, so a message is simply a `String`.

use thiserror::Error;

use crate::protocol::messages::{ChannelAction, InboundNotification};

/// Errors that can occur while encoding or decoding channel messages.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The action could not be serialized.
    #[error("failed to encode channel action: {0}")]
    Encode(#[source] serde_json::Error),

    /// The text is not a valid action.
    #[error("malformed channel action: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Encodes an outbound action as JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use cast_core::protocol::{encode_action, decode_action};
/// use cast_core::protocol::messages::ChannelAction;
///
/// let text = encode_action(&ChannelAction::guess(7)).unwrap();
/// assert_eq!(text, r#"{"command":"guess","value":7}"#);
/// assert_eq!(decode_action(&text).unwrap(), ChannelAction::guess(7));
/// ```
pub fn encode_action(action: &ChannelAction) -> Result<String, CodecError> {
    serde_json::to_string(action).map_err(CodecError::Encode)
}

/// Decodes JSON text into an action.
///
/// The client never receives actions; this is what a receiver (or a test
/// double standing in for one) uses to read what the client sent.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the text is not a known action.
pub fn decode_action(text: &str) -> Result<ChannelAction, CodecError> {
    serde_json::from_str(text).map_err(CodecError::Decode)
}

/// Wraps inbound text in an [`InboundNotification`].
///
/// Never fails: inbound text is free-form.  If it parses as a JSON object, its
/// string `"type"` and `"message"` fields become [`InboundNotification::kind`]
/// and [`InboundNotification::message`].  Fields of any other JSON type are
/// ignored.
pub fn decode_inbound(text: &str) -> InboundNotification {
    let value = serde_json::from_str::<serde_json::Value>(text).ok();
    let field = |name: &str| {
        value
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
    };

    InboundNotification {
        text: text.to_string(),
        kind: field("type"),
        message: field("message"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::PlayerName;

    #[test]
    fn test_encode_join_uses_command_tag() {
        // Arrange
        let name = PlayerName::parse("Alice").unwrap();

        // Act
        let text = encode_action(&ChannelAction::join(&name)).unwrap();

        // Assert
        assert_eq!(text, r#"{"command":"join","name":"Alice"}"#);
    }

    #[test]
    fn test_encode_guess_writes_integer_value() {
        let text = encode_action(&ChannelAction::guess(-3)).unwrap();
        assert_eq!(text, r#"{"command":"guess","value":-3}"#);
    }

    #[test]
    fn test_decode_action_rejects_unknown_command() {
        let result = decode_action(r#"{"command":"cheat"}"#);
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_decode_inbound_plain_text_has_no_kind() {
        let note = decode_inbound("Round 2 starting");
        assert_eq!(note.text, "Round 2 starting");
        assert!(note.kind.is_none());
    }

    #[test]
    fn test_decode_inbound_lifts_json_type_field() {
        let note = decode_inbound(r#"{"type":"scoreboard","leader":"Alice"}"#);
        assert_eq!(note.kind.as_deref(), Some("scoreboard"));
    }

    #[test]
    fn test_decode_inbound_ignores_non_string_type_field() {
        let note = decode_inbound(r#"{"type":3}"#);
        assert!(note.kind.is_none());
    }

    #[test]
    fn test_decode_inbound_lifts_message_and_type() {
        // Arrange
        let text = r#"{"type":"welcome","message":"Welcome, Alice!"}"#;

        // Act
        let note = decode_inbound(text);

        // Assert
        assert_eq!(note.kind.as_deref(), Some("welcome"));
        assert_eq!(note.message.as_deref(), Some("Welcome, Alice!"));
        assert_eq!(note.display_text(), "Welcome, Alice!");
    }

    #[test]
    fn test_decode_inbound_without_message_displays_raw_text() {
        let note = decode_inbound(r#"{"type":"tick","message":7}"#);
        assert_eq!(note.kind.as_deref(), Some("tick"));
        assert!(note.message.is_none());
        assert_eq!(note.display_text(), r#"{"type":"tick","message":7}"#);
    }
}
