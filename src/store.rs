use crate::{
    data::student::{Student, StudentDraft, StudentId},
    error::RosterResult,
};
use async_trait::async_trait;
use std::fmt::{Debug, Display, Formatter};

pub mod http;
pub mod memory;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreOp {
    List,
    Create,
    CreateMany,
    Update,
    Delete,
    DeleteMany,
}

impl Display for StoreOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::List => "list students",
            Self::Create => "add a student",
            Self::CreateMany => "add several students",
            Self::Update => "update a student",
            Self::Delete => "delete a student",
            Self::DeleteMany => "delete several students",
        };
        write!(f, "{s}")
    }
}

/// Where student records actually live. The roster only ever reads whole lists back out.
#[async_trait]
pub trait RosterStore: Debug + Send + Sync {
    async fn list(&self) -> RosterResult<Vec<Student>>;
    async fn create(&self, draft: &StudentDraft) -> RosterResult<()>;
    ///returns how many students were added
    async fn create_many(&self, drafts: &[StudentDraft]) -> RosterResult<usize>;
    async fn update(&self, id: StudentId, draft: &StudentDraft) -> RosterResult<()>;
    async fn delete(&self, id: StudentId) -> RosterResult<()>;
    ///returns how many students were removed, ids that are already gone are skipped
    async fn delete_many(&self, ids: &[StudentId]) -> RosterResult<usize>;
}
