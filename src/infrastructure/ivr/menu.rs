//! Keypad menu for in-call DTMF input
//!
//! A fixed digit-to-action mapping. The menu never changes session
//! status; transfers and hangups are effected on the telephony
//! backend's side.

use serde::{Deserialize, Serialize};

/// Side effect selected by a keypad digit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuAction {
    /// Bridge the call into the booking flow
    TransferToBooking,
    /// Speak the first scripted quote-flow utterance
    StartQuoteFlow,
    /// Bridge the call to a team member
    TransferToHuman,
}

/// Spoken acknowledgment plus the action it announces
#[derive(Debug, Clone, PartialEq)]
pub struct MenuSelection {
    pub acknowledgment: String,
    pub action: Option<MenuAction>,
}

impl MenuSelection {
    fn new(acknowledgment: &str, action: Option<MenuAction>) -> Self {
        Self {
            acknowledgment: acknowledgment.to_string(),
            action,
        }
    }
}

/// Resolve a keypad digit to its menu selection
pub fn select(digit: char) -> MenuSelection {
    match digit {
        '1' => MenuSelection::new(
            "Connecting you to schedule an appointment.",
            Some(MenuAction::TransferToBooking),
        ),
        '2' => MenuSelection::new(
            "Let me get you a quote estimate.",
            Some(MenuAction::StartQuoteFlow),
        ),
        '0' => MenuSelection::new(
            "Transferring you to a team member.",
            Some(MenuAction::TransferToHuman),
        ),
        _ => MenuSelection::new(
            "I did not recognize that option. Please try again.",
            None,
        ),
    }
}
