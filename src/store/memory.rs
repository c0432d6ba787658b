use crate::{
    data::student::{Student, StudentDraft, StudentId},
    error::{RosterError, RosterResult},
    store::{RosterStore, StoreOp},
};
use async_trait::async_trait;
use axum::http::StatusCode;
use tokio::sync::Mutex;

const MAX_ROLL_NO_LEN: usize = 20;
const MAX_TEXT_LEN: usize = 100;

/// A process-local stand-in for the students API, with the same field rules.
///
/// Handy for demos (`ROSTER_STORE_URL=memory`) and for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    students: Vec<Student>,
    last_id: StudentId,
}

fn bad_request(op: StoreOp, message: impl Into<String>) -> RosterError {
    RosterError::StoreRejected {
        op,
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn not_found(op: StoreOp) -> RosterError {
    RosterError::StoreRejected {
        op,
        status: StatusCode::NOT_FOUND,
        message: "Student not found".into(),
    }
}

impl Inner {
    ///checks a draft the way the real store does, returning the coerced age
    fn check(
        &self,
        op: StoreOp,
        draft: &StudentDraft,
        replacing: Option<StudentId>,
        pending: &[Student],
    ) -> RosterResult<i64> {
        let required = [
            ("roll_no", &draft.roll_no, MAX_ROLL_NO_LEN),
            ("name", &draft.name, MAX_TEXT_LEN),
            ("city", &draft.city, MAX_TEXT_LEN),
        ];
        for (field, value, max) in required {
            if value.trim().is_empty() {
                return Err(bad_request(op, format!("{field}: This field may not be blank.")));
            }
            if value.chars().count() > max {
                return Err(bad_request(
                    op,
                    format!("{field}: Ensure this field has no more than {max} characters."),
                ));
            }
        }

        let age = draft
            .age
            .trim()
            .parse::<i64>()
            .map_err(|_| bad_request(op, "age: A valid integer is required."))?;

        let clashes = self
            .students
            .iter()
            .chain(pending)
            .any(|s| s.roll_no == draft.roll_no && Some(s.id) != replacing);
        if clashes {
            return Err(bad_request(
                op,
                "roll_no: student with this roll no already exists.",
            ));
        }

        Ok(age)
    }

    fn build(&mut self, draft: &StudentDraft, age: i64) -> Student {
        self.last_id += 1;
        Student {
            id: self.last_id,
            roll_no: draft.roll_no.clone(),
            name: draft.name.clone(),
            age,
            city: draft.city.clone(),
        }
    }
}

#[async_trait]
impl RosterStore for MemoryStore {
    async fn list(&self) -> RosterResult<Vec<Student>> {
        Ok(self.inner.lock().await.students.clone())
    }

    async fn create(&self, draft: &StudentDraft) -> RosterResult<()> {
        let mut inner = self.inner.lock().await;
        let age = inner.check(StoreOp::Create, draft, None, &[])?;
        let student = inner.build(draft, age);
        inner.students.push(student);
        Ok(())
    }

    async fn create_many(&self, drafts: &[StudentDraft]) -> RosterResult<usize> {
        let mut inner = self.inner.lock().await;

        //all or nothing, like the real bulk endpoint
        let first_new_id = inner.last_id;
        let mut added = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let age = match inner.check(StoreOp::CreateMany, draft, None, &added) {
                Ok(age) => age,
                Err(e) => {
                    inner.last_id = first_new_id;
                    return Err(e);
                }
            };
            added.push(inner.build(draft, age));
        }

        let count = added.len();
        inner.students.extend(added);
        Ok(count)
    }

    async fn update(&self, id: StudentId, draft: &StudentDraft) -> RosterResult<()> {
        let mut inner = self.inner.lock().await;
        let op = StoreOp::Update;
        let Some(index) = inner.students.iter().position(|s| s.id == id) else {
            return Err(not_found(op));
        };
        let age = inner.check(op, draft, Some(id), &[])?;

        let student = &mut inner.students[index];
        student.roll_no.clone_from(&draft.roll_no);
        student.name.clone_from(&draft.name);
        student.age = age;
        student.city.clone_from(&draft.city);
        Ok(())
    }

    async fn delete(&self, id: StudentId) -> RosterResult<()> {
        let mut inner = self.inner.lock().await;
        let before = inner.students.len();
        inner.students.retain(|s| s.id != id);
        if inner.students.len() == before {
            return Err(not_found(StoreOp::Delete));
        }
        Ok(())
    }

    async fn delete_many(&self, ids: &[StudentId]) -> RosterResult<usize> {
        if ids.is_empty() {
            return Err(bad_request(StoreOp::DeleteMany, "No IDs provided"));
        }

        let mut inner = self.inner.lock().await;
        let before = inner.students.len();
        inner.students.retain(|s| !ids.contains(&s.id));
        Ok(before - inner.students.len())
    }
}
