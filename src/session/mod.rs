//! End-of-conversation notification
//!
//! `SessionTerminator` tells the backend a conversation has ended and where
//! its transcript was persisted. It keeps no state between calls.

mod event;
mod terminator;

pub use event::SessionEndEvent;
pub use terminator::{OnSessionEnded, SessionTerminator};
