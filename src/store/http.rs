use crate::{
    data::student::{Student, StudentDraft, StudentId},
    error::{
        BuildHttpClientSnafu, RosterError, RosterResult, StoreDecodeSnafu, StoreRequestSnafu,
    },
    store::{RosterStore, StoreOp},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use snafu::ResultExt;
use std::{fmt::Display, time::Duration};

/// Talks to the students API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
}

impl HttpStore {
    pub fn new(base_url: &str, timeout: Duration) -> RosterResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: impl Display) -> String {
        format!("{}/students/{path}", self.base_url)
    }

    async fn send(&self, op: StoreOp, request: RequestBuilder) -> RosterResult<Response> {
        let response = request.send().await.context(StoreRequestSnafu { op })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(RosterError::StoreRejected {
            op,
            status,
            message: rejection_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("no reason").to_string()),
        })
    }
}

#[async_trait]
impl RosterStore for HttpStore {
    async fn list(&self) -> RosterResult<Vec<Student>> {
        let op = StoreOp::List;
        self.send(op, self.client.get(self.url("")))
            .await?
            .json()
            .await
            .context(StoreDecodeSnafu { op })
    }

    async fn create(&self, draft: &StudentDraft) -> RosterResult<()> {
        self.send(
            StoreOp::Create,
            self.client.post(self.url("bulk/")).json(draft),
        )
        .await?;
        Ok(())
    }

    async fn create_many(&self, drafts: &[StudentDraft]) -> RosterResult<usize> {
        if drafts.is_empty() {
            return Ok(0);
        }

        self.send(
            StoreOp::CreateMany,
            self.client.post(self.url("bulk/")).json(drafts),
        )
        .await?;
        Ok(drafts.len())
    }

    async fn update(&self, id: StudentId, draft: &StudentDraft) -> RosterResult<()> {
        self.send(
            StoreOp::Update,
            self.client.put(self.url(format!("{id}/"))).json(draft),
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: StudentId) -> RosterResult<()> {
        self.send(
            StoreOp::Delete,
            self.client.delete(self.url(format!("{id}/delete/"))),
        )
        .await?;
        Ok(())
    }

    async fn delete_many(&self, ids: &[StudentId]) -> RosterResult<usize> {
        let op = StoreOp::DeleteMany;
        let reply: BulkDeleteReply = self
            .send(
                op,
                self.client
                    .post(self.url("bulk/delete/"))
                    .json(&BulkDeleteRequest { ids }),
            )
            .await?
            .json()
            .await
            .context(StoreDecodeSnafu { op })?;

        //the store answers with "<n> students deleted"
        Ok(reply
            .message
            .split_whitespace()
            .next()
            .and_then(|count| count.parse().ok())
            .unwrap_or(ids.len()))
    }
}

#[derive(Serialize)]
struct BulkDeleteRequest<'a> {
    ids: &'a [StudentId],
}

#[derive(Deserialize)]
struct BulkDeleteReply {
    message: String,
}

/// Pulls something readable out of an error body.
///
/// Understands `{"error": "..."}` as well as per-field lists like `{"roll_no": ["..."]}`,
/// including lists of those for bulk requests.
fn rejection_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return Some(body.to_string());
    };

    let mut messages = vec![];
    collect_messages(None, &value, &mut messages);
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

fn collect_messages(key: Option<&str>, value: &Value, messages: &mut Vec<String>) {
    match value {
        Value::String(message) => messages.push(match key {
            Some(field) if !matches!(field, "error" | "detail" | "non_field_errors") => {
                format!("{field}: {message}")
            }
            _ => message.clone(),
        }),
        Value::Array(items) => {
            for item in items {
                collect_messages(key, item, messages);
            }
        }
        Value::Object(map) => {
            for (field, inner) in map {
                collect_messages(Some(field), inner, messages);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response as AxumResponse},
        routing::{delete, get, post, put},
    };
    use std::sync::Arc;
    use tokio::net::TcpListener;

    type Backing = Arc<MemoryStore>;

    fn as_response<T: serde::Serialize>(result: RosterResult<T>) -> AxumResponse {
        match result {
            Ok(body) => (StatusCode::OK, Json(body)).into_response(),
            Err(RosterError::StoreRejected {
                status, message, ..
            }) => (status, Json(serde_json::json!({ "error": message }))).into_response(),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
        }
    }

    async fn list(State(store): State<Backing>) -> AxumResponse {
        as_response(store.list().await)
    }

    async fn bulk(State(store): State<Backing>, Json(body): Json<Value>) -> AxumResponse {
        let result = if body.is_array() {
            let drafts: Vec<StudentDraft> = serde_json::from_value(body).unwrap();
            store.create_many(&drafts).await.map(|_| ())
        } else {
            let draft: StudentDraft = serde_json::from_value(body).unwrap();
            store.create(&draft).await
        };
        match result {
            Ok(()) => (StatusCode::CREATED, Json(serde_json::json!({"message": "Students added"})))
                .into_response(),
            Err(e) => as_response::<()>(Err(e)),
        }
    }

    async fn update(
        State(store): State<Backing>,
        Path(id): Path<StudentId>,
        Json(draft): Json<StudentDraft>,
    ) -> AxumResponse {
        as_response(store.update(id, &draft).await)
    }

    async fn remove(State(store): State<Backing>, Path(id): Path<StudentId>) -> AxumResponse {
        as_response(store.delete(id).await)
    }

    #[derive(serde::Deserialize)]
    struct Ids {
        #[serde(default)]
        ids: Vec<StudentId>,
    }

    async fn bulk_delete(State(store): State<Backing>, Json(Ids { ids }): Json<Ids>) -> AxumResponse {
        match store.delete_many(&ids).await {
            Ok(count) => (
                StatusCode::OK,
                Json(serde_json::json!({ "message": format!("{count} students deleted") })),
            )
                .into_response(),
            Err(e) => as_response::<()>(Err(e)),
        }
    }

    async fn serve_fake_backend() -> (HttpStore, Backing) {
        let backing = Arc::new(MemoryStore::default());
        let app = Router::new()
            .route("/api/students/", get(list))
            .route("/api/students/bulk/", post(bulk))
            .route("/api/students/bulk/delete/", post(bulk_delete))
            .route("/api/students/{id}/", put(update))
            .route("/api/students/{id}/delete/", delete(remove))
            .with_state(backing.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = HttpStore::new(&format!("http://{addr}/api/"), Duration::from_secs(5)).unwrap();
        (store, backing)
    }

    fn draft(roll_no: &str, name: &str) -> StudentDraft {
        StudentDraft {
            roll_no: roll_no.into(),
            name: name.into(),
            age: "20".into(),
            city: "Delhi".into(),
        }
    }

    #[tokio::test]
    async fn crud_round_trips_through_the_students_api() {
        let (store, _backing) = serve_fake_backend().await;

        assert!(store.list().await.unwrap().is_empty());

        store.create(&draft("A101", "Ravi")).await.unwrap();
        let students = store.list().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].name, "Ravi");
        assert_eq!(students[0].age, 20);

        let id = students[0].id;
        store.update(id, &draft("A101", "Ravindra")).await.unwrap();
        assert_eq!(store.list().await.unwrap()[0].name, "Ravindra");

        store.delete(id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bulk_creation_sends_one_array() {
        let (store, backing) = serve_fake_backend().await;

        let added = store
            .create_many(&[draft("A1", "Ravi"), draft("A2", "Asha")])
            .await
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(backing.list().await.unwrap().len(), 2);

        assert_eq!(store.create_many(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bulk_deletion_reports_what_was_removed() {
        let (store, backing) = serve_fake_backend().await;
        store
            .create_many(&[draft("A1", "Ravi"), draft("A2", "Asha"), draft("A3", "Mira")])
            .await
            .unwrap();

        assert_eq!(store.delete_many(&[1, 3, 99]).await.unwrap(), 2);
        let left = backing.list().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].roll_no, "A2");

        match store.delete_many(&[]).await.unwrap_err() {
            RosterError::StoreRejected {
                op,
                status,
                message,
            } => {
                assert_eq!(op, StoreOp::DeleteMany);
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(message, "No IDs provided");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn refusals_surface_the_backends_message() {
        let (store, _backing) = serve_fake_backend().await;

        let err = store.delete(42).await.unwrap_err();
        assert!(err.is_remote_failure());
        match err {
            RosterError::StoreRejected {
                op,
                status,
                message,
            } => {
                assert_eq!(op, StoreOp::Delete);
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Student not found");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_store_is_a_remote_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = HttpStore::new(&format!("http://{addr}/api"), Duration::from_secs(2)).unwrap();
        let err = store.list().await.unwrap_err();
        assert!(matches!(err, RosterError::StoreRequest { op: StoreOp::List, .. }));
    }

    #[test]
    fn rejection_messages_read_like_sentences() {
        assert_eq!(
            rejection_message(r#"{"roll_no": ["student with this roll no already exists."]}"#)
                .unwrap(),
            "roll_no: student with this roll no already exists."
        );
        assert_eq!(
            rejection_message(r#"{"error": "Student not found"}"#).unwrap(),
            "Student not found"
        );
        assert_eq!(
            rejection_message(r#"[{"age": ["A valid integer is required."]}, {}]"#).unwrap(),
            "age: A valid integer is required."
        );
        assert_eq!(
            rejection_message("<h1>Server Error (500)</h1>").unwrap(),
            "<h1>Server Error (500)</h1>"
        );
        assert_eq!(rejection_message("   "), None);
        assert_eq!(rejection_message("{}"), None);
    }
}
