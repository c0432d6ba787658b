use crate::{
    data::student::{Field, StudentDraft, StudentId},
    error::RosterResult,
    roster::controller::{RosterController, RosterView},
    store::RosterStore,
    validation::Rejection,
};
use std::sync::Arc;
use tokio::sync::Mutex;

pub mod controller;

/// The roster as the page sees it: a [`RosterController`] plus the store it syncs against.
///
/// The controller lock is never held while waiting on the store, so the page stays usable
/// while a request is out.
#[derive(Clone, Debug)]
pub struct Roster {
    controller: Arc<Mutex<RosterController>>,
    store: Arc<dyn RosterStore>,
}

impl Roster {
    pub fn new(store: Arc<dyn RosterStore>) -> Self {
        Self {
            controller: Arc::new(Mutex::new(RosterController::default())),
            store,
        }
    }

    pub async fn view(&self) -> RosterView {
        self.controller.lock().await.view()
    }

    /// Swaps the cached roster for whatever the store has now. On failure the old cache stays.
    pub async fn load_roster(&self) -> RosterResult<()> {
        let ticket = self.controller.lock().await.begin_fetch();
        let fetched = self.store.list().await;

        let mut controller = self.controller.lock().await;
        match fetched {
            Ok(students) => {
                if !controller.replace_roster(ticket, students) {
                    debug!(?ticket, "Discarding roster overtaken by a newer fetch");
                }
                Ok(())
            }
            Err(e) => {
                controller.settle();
                warn!(?e, "Unable to load roster");
                Err(e)
            }
        }
    }

    pub async fn start_create(&self) {
        self.controller.lock().await.start_create();
    }

    pub async fn start_edit(&self, id: StudentId) -> RosterResult<()> {
        self.controller.lock().await.start_edit(id)
    }

    pub async fn cancel(&self) {
        self.controller.lock().await.cancel();
    }

    pub async fn input(&self, field: Field, value: &str) -> Result<(), Rejection> {
        self.controller.lock().await.input(field, value)
    }

    pub async fn submit_create(&self) -> RosterResult<()> {
        let draft = self.controller.lock().await.begin_create()?;
        info!(roll_no = %draft.roll_no, "Adding student");

        let created = self.store.create(&draft).await;
        self.after_form_submission(created).await
    }

    pub async fn submit_update(&self) -> RosterResult<()> {
        let (id, draft) = self.controller.lock().await.begin_update()?;
        info!(id, roll_no = %draft.roll_no, "Updating student");

        let updated = self.store.update(id, &draft).await;
        self.after_form_submission(updated).await
    }

    pub async fn request_delete(&self, id: StudentId) {
        self.controller.lock().await.request_delete(id);
    }

    pub async fn confirm_delete(&self, id: StudentId) -> RosterResult<()> {
        self.controller.lock().await.begin_mutation();
        info!(id, "Deleting student");

        let deleted = self.store.delete(id).await;
        self.after_delete(&[id], deleted).await
    }

    pub async fn cancel_delete(&self) {
        self.controller.lock().await.cancel_delete();
    }

    pub async fn toggle_selected(&self, id: StudentId) -> RosterResult<()> {
        self.controller.lock().await.toggle_selected(id)
    }

    /// Deletes every ticked student in one request, returning how many the store removed.
    pub async fn delete_selected(&self) -> RosterResult<usize> {
        let ids = self.controller.lock().await.begin_delete_selected()?;
        info!(count = ids.len(), "Deleting selected students");

        let deleted = self.store.delete_many(&ids).await;
        let count = deleted.as_ref().map_or(0, |count| *count);
        self.after_delete(&ids, deleted.map(|_| ())).await?;
        Ok(count)
    }

    /// Adds several already-validated students in one request. The form is left alone.
    pub async fn import(&self, drafts: &[StudentDraft]) -> RosterResult<usize> {
        if drafts.is_empty() {
            return Ok(0);
        }

        self.controller.lock().await.begin_mutation();
        info!(count = drafts.len(), "Importing students");

        let imported = self.store.create_many(drafts).await;
        self.controller.lock().await.settle();
        let count = imported.inspect_err(|e| warn!(?e, "Unable to import students"))?;

        self.load_roster().await?;
        Ok(count)
    }

    async fn after_form_submission(&self, sent: RosterResult<()>) -> RosterResult<()> {
        {
            let mut controller = self.controller.lock().await;
            if let Err(e) = sent {
                //keep the draft so it can be retried
                controller.settle();
                warn!(?e, "Student store refused the form");
                return Err(e);
            }
            controller.finish_form_submission();
        }

        self.load_roster().await
    }

    async fn after_delete(&self, ids: &[StudentId], sent: RosterResult<()>) -> RosterResult<()> {
        {
            let mut controller = self.controller.lock().await;
            if let Err(e) = sent {
                controller.settle();
                warn!(?e, ?ids, "Unable to delete students");
                return Err(e);
            }
            controller.finish_delete(ids);
        }

        self.load_roster().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data::student::Student,
        error::RosterError,
        store::{StoreOp, memory::MemoryStore},
        validation::AGE_TOO_HIGH,
    };
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Counts calls and can be told to fail everything. Every call yields once before it is
    /// answered, so requests started together really do overlap.
    #[derive(Debug, Default)]
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
        broken: AtomicBool,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_broken(&self, broken: bool) {
            self.broken.store(broken, Ordering::SeqCst);
        }

        async fn check(&self, op: StoreOp) -> RosterResult<()> {
            tokio::task::yield_now().await;
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.load(Ordering::SeqCst) {
                Err(RosterError::StoreRejected {
                    op,
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "down for maintenance".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl RosterStore for CountingStore {
        async fn list(&self) -> RosterResult<Vec<Student>> {
            self.check(StoreOp::List).await?;
            self.inner.list().await
        }

        async fn create(&self, draft: &StudentDraft) -> RosterResult<()> {
            self.check(StoreOp::Create).await?;
            self.inner.create(draft).await
        }

        async fn create_many(&self, drafts: &[StudentDraft]) -> RosterResult<usize> {
            self.check(StoreOp::CreateMany).await?;
            self.inner.create_many(drafts).await
        }

        async fn update(&self, id: StudentId, draft: &StudentDraft) -> RosterResult<()> {
            self.check(StoreOp::Update).await?;
            self.inner.update(id, draft).await
        }

        async fn delete(&self, id: StudentId) -> RosterResult<()> {
            self.check(StoreOp::Delete).await?;
            self.inner.delete(id).await
        }

        async fn delete_many(&self, ids: &[StudentId]) -> RosterResult<usize> {
            self.check(StoreOp::DeleteMany).await?;
            self.inner.delete_many(ids).await
        }
    }

    async fn roster_with(drafts: &[[&str; 4]]) -> (Roster, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        for [roll_no, name, age, city] in drafts {
            store
                .inner
                .create(&StudentDraft {
                    roll_no: (*roll_no).into(),
                    name: (*name).into(),
                    age: (*age).into(),
                    city: (*city).into(),
                })
                .await
                .unwrap();
        }

        let roster = Roster::new(store.clone());
        roster.load_roster().await.unwrap();
        (roster, store)
    }

    async fn type_in(roster: &Roster, values: [&str; 4]) {
        for (field, value) in Field::ALL.into_iter().zip(values) {
            roster.input(field, value).await.unwrap();
        }
    }

    #[tokio::test]
    async fn adding_resets_the_form_and_refreshes() {
        let (roster, _store) = roster_with(&[]).await;
        type_in(&roster, ["A101", "ravi", "20", "delhi"]).await;

        roster.submit_create().await.unwrap();

        let view = roster.view().await;
        assert_eq!(view.draft, StudentDraft::default());
        assert_eq!(view.editing, None);
        assert!(view.field_errors.is_empty());
        assert!(!view.busy);
        assert_eq!(view.roster.len(), 1);
        assert_eq!(view.roster[0].roll_no, "A101");
        assert_eq!(view.roster[0].name, "Ravi");
        assert_eq!(view.roster[0].city, "Delhi");
        assert_eq!(view.roster[0].age, 20);
    }

    #[tokio::test]
    async fn incomplete_adds_never_reach_the_store() {
        let (roster, store) = roster_with(&[]).await;
        type_in(&roster, ["A101", "ravi", "", "delhi"]).await;
        let calls = store.calls();
        let before = roster.view().await;

        let err = roster.submit_create().await.unwrap_err();
        assert!(matches!(err, RosterError::IncompleteDraft { .. }));
        assert_eq!(store.calls(), calls);
        assert_eq!(roster.view().await, before);
    }

    #[tokio::test]
    async fn failed_adds_keep_the_form_for_a_retry() {
        let (roster, store) = roster_with(&[]).await;
        type_in(&roster, ["A101", "ravi", "20", "delhi"]).await;
        store.set_broken(true);

        let err = roster.submit_create().await.unwrap_err();
        assert!(err.is_remote_failure());

        let view = roster.view().await;
        assert_eq!(view.draft.roll_no, "A101");
        assert!(view.roster.is_empty());
        assert!(!view.busy);

        store.set_broken(false);
        roster.submit_create().await.unwrap();
        assert_eq!(roster.view().await.roster.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_roll_numbers_come_back_as_remote_failures() {
        let (roster, _store) = roster_with(&[["A101", "Asha", "19", "Pune"]]).await;
        type_in(&roster, ["A101", "ravi", "20", "delhi"]).await;

        let err = roster.submit_create().await.unwrap_err();
        assert!(err.is_remote_failure());
        assert_eq!(roster.view().await.draft.name, "Ravi");
    }

    #[tokio::test]
    async fn editing_then_cancelling_never_calls_the_store() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        let before = roster.view().await.roster;
        let calls = store.calls();

        roster.start_edit(1).await.unwrap();
        roster.input(Field::Name, "someone else").await.unwrap();
        roster.cancel().await;

        let view = roster.view().await;
        assert_eq!(view.roster, before);
        assert_eq!(view.editing, None);
        assert_eq!(view.draft, StudentDraft::default());
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn updating_replaces_the_student_after_a_refresh() {
        let (roster, _store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;

        roster.start_edit(1).await.unwrap();
        roster.input(Field::City, "mumbai").await.unwrap();
        roster.input(Field::Age, "200").await.unwrap_err();
        assert_eq!(
            roster.view().await.field_errors.get(Field::Age),
            Some(AGE_TOO_HIGH)
        );
        roster.submit_update().await.unwrap();

        let view = roster.view().await;
        assert_eq!(view.editing, None);
        assert!(view.field_errors.is_empty());
        assert_eq!(view.roster[0].city, "Mumbai");
        assert_eq!(view.roster[0].age, 19);
    }

    #[tokio::test]
    async fn updating_without_a_target_is_refused_locally() {
        let (roster, store) = roster_with(&[]).await;
        let calls = store.calls();

        assert!(matches!(
            roster.submit_update().await,
            Err(RosterError::NotEditing)
        ));
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn cancelled_deletes_keep_the_student() {
        let (roster, store) = roster_with(&[["A7", "Asha", "19", "Pune"]]).await;
        let calls = store.calls();

        roster.request_delete(1).await;
        assert_eq!(roster.view().await.pending_delete, Some(1));
        roster.cancel_delete().await;

        let view = roster.view().await;
        assert_eq!(view.pending_delete, None);
        assert_eq!(view.roster.len(), 1);
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn confirmed_deletes_drop_the_student_after_a_refresh() {
        let (roster, _store) = roster_with(&[
            ["A1", "Asha", "19", "Pune"],
            ["A2", "Ravi", "20", "Delhi"],
        ])
        .await;

        roster.request_delete(2).await;
        roster.confirm_delete(2).await.unwrap();

        let view = roster.view().await;
        assert_eq!(view.pending_delete, None);
        assert_eq!(
            view.roster.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![1]
        );
    }

    #[tokio::test]
    async fn failed_deletes_leave_everything_pending() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        roster.request_delete(1).await;
        store.set_broken(true);

        assert!(roster.confirm_delete(1).await.unwrap_err().is_remote_failure());

        let view = roster.view().await;
        assert_eq!(view.pending_delete, Some(1));
        assert_eq!(view.roster.len(), 1);
    }

    #[tokio::test]
    async fn failed_loads_keep_the_old_cache() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        store.set_broken(true);

        assert!(roster.load_roster().await.is_err());
        assert_eq!(roster.view().await.roster.len(), 1);
    }

    #[tokio::test]
    async fn imports_refresh_without_touching_the_form() {
        let (roster, _store) = roster_with(&[]).await;
        roster.input(Field::Name, "half typed").await.unwrap();

        let drafts = [
            StudentDraft {
                roll_no: "B1".into(),
                name: "Asha".into(),
                age: "19".into(),
                city: "Pune".into(),
            },
            StudentDraft {
                roll_no: "B2".into(),
                name: "Ravi".into(),
                age: "20".into(),
                city: "Delhi".into(),
            },
        ];
        assert_eq!(roster.import(&drafts).await.unwrap(), 2);

        let view = roster.view().await;
        assert_eq!(view.roster.len(), 2);
        assert_eq!(view.draft.name, "Half typed");
    }

    #[tokio::test]
    async fn deleting_the_selection_refreshes_once_it_lands() {
        let (roster, store) = roster_with(&[
            ["A1", "Asha", "19", "Pune"],
            ["A2", "Ravi", "20", "Delhi"],
            ["A3", "Mira", "21", "Goa"],
        ])
        .await;

        roster.toggle_selected(1).await.unwrap();
        roster.toggle_selected(3).await.unwrap();
        assert_eq!(roster.delete_selected().await.unwrap(), 2);

        let view = roster.view().await;
        assert!(view.selected.is_empty());
        assert_eq!(view.roster, store.inner.list().await.unwrap());
        assert_eq!(
            view.roster.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![2]
        );
    }

    #[tokio::test]
    async fn deleting_nothing_never_calls_the_store() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        let calls = store.calls();

        assert!(matches!(
            roster.delete_selected().await,
            Err(RosterError::NothingSelected)
        ));
        assert_eq!(store.calls(), calls);
        assert!(!roster.view().await.busy);
    }

    #[tokio::test]
    async fn double_submitted_adds_still_show_the_added_student() {
        let (roster, store) = roster_with(&[]).await;
        type_in(&roster, ["A101", "ravi", "20", "delhi"]).await;

        let (first, second) = tokio::join!(roster.submit_create(), roster.submit_create());
        assert_eq!(
            usize::from(first.is_ok()) + usize::from(second.is_ok()),
            1,
            "{first:?} {second:?}"
        );
        assert!([first, second].into_iter().any(|r| r.is_err_and(|e| e.is_remote_failure())));

        let view = roster.view().await;
        let stored = store.inner.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(view.roster, stored);
        assert_eq!(view.draft, StudentDraft::default());
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn overlapping_adds_and_deletes_both_reach_the_cache() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        type_in(&roster, ["A2", "ravi", "20", "delhi"]).await;
        roster.request_delete(1).await;

        let (created, deleted) = tokio::join!(roster.submit_create(), roster.confirm_delete(1));
        created.unwrap();
        deleted.unwrap();

        let view = roster.view().await;
        assert_eq!(view.roster, store.inner.list().await.unwrap());
        assert_eq!(
            view.roster.iter().map(|s| s.roll_no.as_str()).collect::<Vec<_>>(),
            vec!["A2"]
        );
        assert_eq!(view.pending_delete, None);
        assert_eq!(view.draft, StudentDraft::default());
        assert!(!view.busy);
    }

    #[tokio::test]
    async fn an_update_overlapping_an_import_keeps_both() {
        let (roster, store) = roster_with(&[["A1", "Asha", "19", "Pune"]]).await;
        roster.start_edit(1).await.unwrap();
        roster.input(Field::City, "mumbai").await.unwrap();

        let drafts = [StudentDraft {
            roll_no: "B1".into(),
            name: "Ravi".into(),
            age: "20".into(),
            city: "Delhi".into(),
        }];
        let (updated, imported) = tokio::join!(roster.submit_update(), roster.import(&drafts));
        updated.unwrap();
        assert_eq!(imported.unwrap(), 1);

        let view = roster.view().await;
        assert_eq!(view.roster, store.inner.list().await.unwrap());
        assert_eq!(view.roster.len(), 2);
        assert_eq!(view.roster[0].city, "Mumbai");
        assert_eq!(view.editing, None);
        assert!(!view.busy);
    }
}
