//! User persona synchronization
//!
//! The persona is a schema-less document polled from the backend and
//! editable locally. `PersonaSyncState` holds the transitions, and
//! `PersonaSync` drives them from the poll loop and from user actions.

mod record;
mod state;
mod sync;
mod value;

pub use record::PersonaRecord;
pub use state::{CloseOutcome, EditMode, FieldRow, PersonaSyncState, PollOutcome, SaveStatus};
pub use sync::{PersonaSync, PollerHandle};
pub use value::{field_label, format_value, parse_field, EditorKind, FieldKind, PersonaValue};
