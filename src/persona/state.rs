use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::record::PersonaRecord;
use super::value::{field_label, format_value, parse_field, FieldKind, PersonaValue};
use crate::error::EditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Viewing,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

/// What a poll result did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    Unchanged,
    /// Fetched while editing; discarded
    Suppressed,
    /// Fetch began before the last edit session or save; discarded
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The user declined to discard unsaved edits
    Kept,
}

/// One labelled field as presented by the profile view
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub key: String,
    pub label: String,
    pub text: String,
    pub kind: FieldKind,
    pub hint: &'static str,
}

/// Remote-mirrored persona plus the in-progress local edit.
///
/// Every transition is a plain method. Poll results are only applied in
/// `Viewing`, so an unsaved draft is never overwritten.
#[derive(Debug, Clone)]
pub struct PersonaSyncState {
    remote: Option<PersonaRecord>,
    draft: Option<PersonaRecord>,
    mode: EditMode,
    save_status: SaveStatus,
    last_synced_at: Option<DateTime<Utc>>,
    status_epoch: u64,
    sync_generation: u64,
}

impl Default for PersonaSyncState {
    fn default() -> Self {
        Self::new()
    }
}

impl PersonaSyncState {
    pub fn new() -> Self {
        Self {
            remote: None,
            draft: None,
            mode: EditMode::Viewing,
            save_status: SaveStatus::Idle,
            last_synced_at: None,
            status_epoch: 0,
            sync_generation: 0,
        }
    }

    pub fn remote(&self) -> Option<&PersonaRecord> {
        self.remote.as_ref()
    }

    pub fn draft(&self) -> Option<&PersonaRecord> {
        self.draft.as_ref()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == EditMode::Editing
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        self.last_synced_at
    }

    /// Sync time as shown under the profile; hidden while editing
    pub fn last_synced_display(&self) -> Option<DateTime<Utc>> {
        match self.mode {
            EditMode::Viewing => self.last_synced_at,
            EditMode::Editing => None,
        }
    }

    /// The draft while editing, the remote record otherwise
    pub fn visible_record(&self) -> Option<&PersonaRecord> {
        match self.mode {
            EditMode::Editing => self.draft.as_ref().or(self.remote.as_ref()),
            EditMode::Viewing => self.remote.as_ref(),
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.mode == EditMode::Editing && self.draft != self.remote
    }

    /// Bumped whenever editing begins or a save completes. Stamp a fetch
    /// with it before sending and hand it back to `apply_poll_since`.
    pub fn sync_generation(&self) -> u64 {
        self.sync_generation
    }

    /// Merge a record fetched just now. Discarded while editing.
    pub fn apply_poll(&mut self, fetched: PersonaRecord, now: DateTime<Utc>) -> PollOutcome {
        self.apply_poll_since(self.sync_generation, fetched, now)
    }

    /// Merge a record whose fetch started at `generation`.
    ///
    /// A response that was in flight across an edit session or a save
    /// predates the local record and is dropped.
    pub fn apply_poll_since(
        &mut self,
        generation: u64,
        fetched: PersonaRecord,
        now: DateTime<Utc>,
    ) -> PollOutcome {
        if self.mode == EditMode::Editing {
            debug!("Discarding polled persona while editing");
            return PollOutcome::Suppressed;
        }
        if generation != self.sync_generation {
            debug!("Discarding persona fetched before the last edit");
            return PollOutcome::Stale;
        }

        if self.remote.as_ref().is_some_and(|remote| remote.is_identical(&fetched)) {
            return PollOutcome::Unchanged;
        }

        info!("Persona updated from server ({} fields)", fetched.len());
        self.remote = Some(fetched);
        self.last_synced_at = Some(now);
        PollOutcome::Applied
    }

    /// Copy the remote record into a fresh draft
    pub fn begin_editing(&mut self) -> Result<(), EditError> {
        if self.mode == EditMode::Editing {
            return Ok(());
        }
        let remote = self.remote.as_ref().ok_or(EditError::NoRecord)?;

        self.draft = Some(remote.clone());
        self.mode = EditMode::Editing;
        self.sync_generation += 1;
        Ok(())
    }

    /// Enter editing from `Viewing`; behave like cancel from `Editing`
    pub fn toggle_edit_mode(&mut self) -> Result<EditMode, EditError> {
        match self.mode {
            EditMode::Viewing => self.begin_editing()?,
            EditMode::Editing => {
                self.cancel_editing();
            }
        }
        Ok(self.mode)
    }

    /// Re-derive a draft field from edited text.
    ///
    /// The type comes from the record as it was when editing began, never
    /// from the draft. On a parse error the draft is left as it was.
    pub fn change_field(&mut self, key: &str, raw: &str) -> Result<(), EditError> {
        if self.mode != EditMode::Editing {
            return Err(EditError::NotEditing);
        }

        let kind = self
            .remote
            .as_ref()
            .and_then(|remote| remote.get(key))
            .map(PersonaValue::kind)
            .unwrap_or(FieldKind::Absent);

        let value = parse_field(key, kind, raw)?;

        let draft = self.draft.as_mut().ok_or(EditError::NotEditing)?;
        draft.insert(key, value);
        Ok(())
    }

    /// Drop the draft's changes and return to `Viewing`.
    ///
    /// Returns false when already viewing.
    pub fn cancel_editing(&mut self) -> bool {
        if self.mode == EditMode::Viewing {
            return false;
        }

        self.draft = self.remote.clone();
        self.mode = EditMode::Viewing;
        true
    }

    /// Close the profile container.
    ///
    /// `confirm` is only asked when the draft differs from the remote record;
    /// declining leaves editing untouched.
    pub fn request_close(&mut self, confirm: impl FnOnce() -> bool) -> CloseOutcome {
        if self.has_unsaved_changes() && !confirm() {
            return CloseOutcome::Kept;
        }

        self.cancel_editing();
        CloseOutcome::Closed
    }

    /// Mark the save as in flight and hand out the record to send
    pub fn begin_save(&mut self) -> Result<PersonaRecord, EditError> {
        if self.mode != EditMode::Editing {
            return Err(EditError::NotEditing);
        }
        if self.save_status == SaveStatus::Saving {
            return Err(EditError::SaveInProgress);
        }
        let draft = self.draft.clone().ok_or(EditError::NotEditing)?;

        self.save_status = SaveStatus::Saving;
        Ok(draft)
    }

    /// Record the outcome of a save of `sent`.
    ///
    /// Returns the status epoch to pass to `reset_save_status` later.
    pub fn complete_save(&mut self, sent: PersonaRecord, succeeded: bool) -> u64 {
        self.status_epoch += 1;

        if !succeeded {
            warn!("Persona save failed; keeping draft");
            self.save_status = SaveStatus::Error;
            return self.status_epoch;
        }

        self.save_status = SaveStatus::Saved;
        self.sync_generation += 1;

        let edited_since = self.mode == EditMode::Editing && self.draft.as_ref() != Some(&sent);
        self.remote = Some(sent);
        if edited_since {
            info!("Persona saved; newer edits remain in the draft");
        } else {
            self.draft = None;
            self.mode = EditMode::Viewing;
        }

        self.status_epoch
    }

    /// Clear a `Saved`/`Error` status if it is still the one from `epoch`
    pub fn reset_save_status(&mut self, epoch: u64) -> bool {
        let transient = matches!(self.save_status, SaveStatus::Saved | SaveStatus::Error);
        if transient && epoch == self.status_epoch {
            self.save_status = SaveStatus::Idle;
            return true;
        }
        false
    }

    /// Labelled rows for whichever record is visible
    pub fn field_rows(&self) -> Vec<FieldRow> {
        let Some(record) = self.visible_record() else {
            return Vec::new();
        };

        record
            .iter()
            .map(|(key, value)| {
                let kind = value.kind();
                FieldRow {
                    key: key.clone(),
                    label: field_label(key),
                    text: format_value(Some(value)),
                    kind,
                    hint: kind.edit_hint(),
                }
            })
            .collect()
    }
}
