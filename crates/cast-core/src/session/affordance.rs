//! UI affordances derived from session state.
//!
//! An affordance is an enablement decision, not state.  It is recomputed from
//! scratch after every transition:
//!
//! | condition                                   | affordance                         |
//! |---------------------------------------------|------------------------------------|
//! | at least one receiver online                | cast button shown                  |
//! | connection in `ApplicationReady`            | cast button shows "connected" icon |
//! | application not started                     | "prompt to cast" enabled           |
//! | application started, player not joined      | join controls enabled              |
//! | application started, player joined         | guess controls enabled             |

use serde::{Deserialize, Serialize};

use super::connection::ConnectionPhase;

/// State of the cast button in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastButton {
    /// No receivers online; the button is not shown.
    Hidden,
    /// Receivers online; tapping opens the device picker.
    Available,
    /// Connected to a running companion application.
    Connected,
}

/// Everything the presentation layer needs to enable or disable its controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub cast_button: CastButton,
    /// The "tap the cast button to start" prompt.
    pub prompt_cast_enabled: bool,
    /// Name prompt, name field, and join button.
    pub join_enabled: bool,
    /// Guess prompt, guess field, and guess button.
    pub guess_enabled: bool,
}

impl Affordances {
    /// Derives the affordances from the three inputs that determine them.
    pub fn derive(devices_online: bool, phase: ConnectionPhase, has_joined: bool) -> Self {
        let application_started = phase == ConnectionPhase::ApplicationReady;

        let cast_button = match (devices_online, application_started) {
            (false, _) => CastButton::Hidden,
            (true, true) => CastButton::Connected,
            (true, false) => CastButton::Available,
        };

        Self {
            cast_button,
            prompt_cast_enabled: !application_started,
            join_enabled: application_started && !has_joined,
            guess_enabled: application_started && has_joined,
        }
    }
}
