//! In-call keypad (DTMF) handling

pub mod menu;

pub use menu::{select, MenuAction, MenuSelection};
