use crate::{
    data::student::{Field, Student, StudentDraft, StudentId},
    error::{
        IncompleteDraftSnafu, MissingStudentSnafu, NotEditingSnafu, NothingSelectedSnafu,
        RosterResult,
    },
    validation::{FieldErrors, Rejection, validate_field},
};
use snafu::{OptionExt, ensure};
use std::collections::BTreeSet;

/// Identifies one roster fetch. Later fetches get bigger tickets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Everything the page shows, owned in one place.
///
/// This never talks to the store itself. Callers mark each store request as started and
/// settled so the page can show that it is busy. Fetches of the whole roster carry a
/// [`Ticket`] so a slow reply cannot overwrite the cache with an older list than one that
/// has already arrived. Mutations are never discarded: once the store accepts one, the form
/// is settled and the caller refreshes.
#[derive(Debug, Default)]
pub struct RosterController {
    roster: Vec<Student>,
    draft: StudentDraft,
    field_errors: FieldErrors,
    editing: Option<StudentId>,
    pending_delete: Option<StudentId>,
    selected: BTreeSet<StudentId>,
    latest_fetch: u64,
    in_flight: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub roster: Vec<Student>,
    pub draft: StudentDraft,
    pub field_errors: FieldErrors,
    pub editing: Option<StudentId>,
    pub pending_delete: Option<StudentId>,
    pub selected: BTreeSet<StudentId>,
    pub busy: bool,
}

impl RosterController {
    pub fn view(&self) -> RosterView {
        RosterView {
            roster: self.roster.clone(),
            draft: self.draft.clone(),
            field_errors: self.field_errors.clone(),
            editing: self.editing,
            pending_delete: self.pending_delete,
            selected: self.selected.clone(),
            busy: self.in_flight > 0,
        }
    }

    pub fn start_create(&mut self) {
        self.editing = None;
        self.draft = StudentDraft::default();
        self.field_errors.clear_all();
    }

    pub fn start_edit(&mut self, id: StudentId) -> RosterResult<()> {
        let student = self
            .roster
            .iter()
            .find(|s| s.id == id)
            .context(MissingStudentSnafu { id })?;

        if let Some(previous) = self.editing.filter(|previous| *previous != id) {
            debug!(previous, id, "Abandoning unsaved edit");
        }

        self.draft = StudentDraft::from(student);
        self.editing = Some(id);
        self.field_errors.clear_all();
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.start_create();
    }

    /// Applies one keystroke. Rejected values never reach the draft.
    pub fn input(&mut self, field: Field, value: &str) -> Result<(), Rejection> {
        match validate_field(field, value) {
            Ok(accepted) => {
                self.draft.set(field, accepted);
                self.field_errors.clear(field);
                Ok(())
            }
            Err(rejection) => {
                self.field_errors.reject(rejection);
                Err(rejection)
            }
        }
    }

    pub fn request_delete(&mut self, id: StudentId) {
        self.pending_delete = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Ticks or unticks a cached student for deleting in bulk.
    pub fn toggle_selected(&mut self, id: StudentId) -> RosterResult<()> {
        ensure!(
            self.roster.iter().any(|s| s.id == id),
            MissingStudentSnafu { id }
        );

        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
        Ok(())
    }

    pub fn begin_fetch(&mut self) -> Ticket {
        self.latest_fetch += 1;
        self.in_flight += 1;
        Ticket(self.latest_fetch)
    }

    pub fn begin_mutation(&mut self) {
        self.in_flight += 1;
    }

    /// Marks a store request as finished, whatever became of it.
    pub fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    ///the draft to send, if every field has something in it
    pub fn begin_create(&mut self) -> RosterResult<StudentDraft> {
        let missing = self.draft.missing_fields();
        ensure!(missing.is_empty(), IncompleteDraftSnafu { missing });

        self.begin_mutation();
        Ok(self.draft.clone())
    }

    pub fn begin_update(&mut self) -> RosterResult<(StudentId, StudentDraft)> {
        let id = self.editing.context(NotEditingSnafu)?;
        self.begin_mutation();
        Ok((id, self.draft.clone()))
    }

    pub fn begin_delete_selected(&mut self) -> RosterResult<Vec<StudentId>> {
        ensure!(!self.selected.is_empty(), NothingSelectedSnafu);
        self.begin_mutation();
        Ok(self.selected.iter().copied().collect())
    }

    /// Called once an add or update has been accepted by the store.
    pub fn finish_form_submission(&mut self) {
        self.settle();
        self.cancel();
    }

    /// Called once the store has accepted deleting `ids`.
    pub fn finish_delete(&mut self, ids: &[StudentId]) {
        self.settle();

        for id in ids {
            self.selected.remove(id);
        }
        if self.pending_delete.is_some_and(|id| ids.contains(&id)) {
            self.pending_delete = None;
        }
        if let Some(id) = self.editing.filter(|id| ids.contains(id)) {
            debug!(id, "Deleted the student being edited, resetting the form");
            self.cancel();
        }
    }

    /// Takes a fetched roster, unless a later fetch has already been sent.
    pub fn replace_roster(&mut self, ticket: Ticket, students: Vec<Student>) -> bool {
        self.settle();
        if ticket.0 != self.latest_fetch {
            return false;
        }

        debug!(count = students.len(), "Replacing cached roster");
        self.selected
            .retain(|id| students.iter().any(|s| s.id == *id));
        self.roster = students;
        true
    }
}
