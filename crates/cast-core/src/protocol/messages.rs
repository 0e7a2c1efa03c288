//! Channel message types and input validation.
//!
//! The receiver application understands JSON text messages with a `"command"`
//! discriminant:
//!
//! ```json
//! {"command":"join","name":"Alice"}
//! {"command":"guess","value":42}
//! ```
//!
//! User input is validated *before* it becomes a [`ChannelAction`]: a
//! [`PlayerName`] can only be built from a non-blank string, and a guess only
//! from text that parses as an integer.  That way the channel never has to
//! reject anything.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Outbound actions ──────────────────────────────────────────────────────────

/// A player action sent to the receiver application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ChannelAction {
    /// Announces the local player.  Sent at most once per channel.
    Join {
        /// Trimmed, non-empty player name.
        name: String,
    },
    /// A numeric answer to the current question.
    Guess {
        value: i32,
    },
}

impl ChannelAction {
    /// Builds a join action from an already-validated name.
    pub fn join(name: &PlayerName) -> Self {
        Self::Join {
            name: name.as_str().to_string(),
        }
    }

    pub fn guess(value: i32) -> Self {
        Self::Guess { value }
    }
}

// ── Inbound notification ──────────────────────────────────────────────────────

/// A text message received from the receiver application.
///
/// Inbound messages carry no protocol meaning for the client; they are logged.
/// The receiver application normally sends `{"type": ..., "message": ...}`;
/// those two string fields are lifted out when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundNotification {
    /// The raw text as received.
    pub text: String,
    /// Value of the `"type"` field if the text is a JSON object carrying one.
    pub kind: Option<String>,
    /// Value of the `"message"` field if the text is a JSON object carrying one.
    pub message: Option<String>,
}

impl InboundNotification {
    /// The human-readable part: `message` if decoded, otherwise the raw text.
    pub fn display_text(&self) -> &str {
        self.message.as_deref().unwrap_or(&self.text)
    }
}

// ── Application metadata ──────────────────────────────────────────────────────

/// Information about the companion application reported on launch/join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationMetadata {
    /// Application id registered with the casting service (e.g. `"A487EF70"`).
    pub application_id: String,
    /// Human-readable application name.
    pub application_name: String,
}

// ── Validated user input ──────────────────────────────────────────────────────

/// A player name that is known to be trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerName(String);

impl PlayerName {
    /// Trims `raw` and returns `None` if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses guess text typed by the player.
///
/// Surrounding whitespace is ignored.  Returns `None` for blank text, for
/// anything that is not a base-10 integer, and for values outside `i32`.
pub fn parse_guess(text: &str) -> Option<i32> {
    text.trim().parse().ok()
}
