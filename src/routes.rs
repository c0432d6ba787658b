use crate::{
    routes::{
        import_export::{get_export_students, put_import_students},
        index::get_index_route,
        preferences::post_toggle_theme,
        students::{
            internal_delete_student, internal_get_app, internal_get_edit_form,
            internal_post_cancel_delete, internal_post_cancel_form, internal_post_field,
            internal_post_delete_selected, internal_post_new_form, internal_post_refresh,
            internal_post_request_delete, internal_post_select_student, internal_post_student,
            internal_put_student,
        },
    },
    state::RosterState,
};
use axum::{
    Router,
    routing::{get, post, put},
};

pub mod import_export;
pub mod index;
pub mod preferences;
pub mod students;

pub fn router(state: RosterState) -> Router {
    Router::new()
        .route("/", get(get_index_route))
        .route("/export", get(get_export_students))
        .route("/import", put(put_import_students))
        .route("/preferences/theme", post(post_toggle_theme))
        .route("/internal/app", get(internal_get_app))
        .route("/internal/field", post(internal_post_field))
        .route(
            "/internal/students",
            post(internal_post_student)
                .put(internal_put_student)
                .delete(internal_delete_student),
        )
        .route("/internal/students/edit", get(internal_get_edit_form))
        .route(
            "/internal/students/delete/request",
            post(internal_post_request_delete),
        )
        .route(
            "/internal/students/delete/cancel",
            post(internal_post_cancel_delete),
        )
        .route("/internal/students/select", post(internal_post_select_student))
        .route(
            "/internal/students/delete/selected",
            post(internal_post_delete_selected),
        )
        .route("/internal/form/new", post(internal_post_new_form))
        .route("/internal/form/cancel", post(internal_post_cancel_form))
        .route("/internal/refresh", post(internal_post_refresh))
        .with_state(state)
}
