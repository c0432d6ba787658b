use crate::{
    data::{
        IdForm,
        student::{Field, Student},
    },
    error::{RosterError, RosterResult},
    maud_conveniences::{NoticeKind, Palette, notice, render_table, subtitle},
    roster::controller::RosterView,
    state::RosterState,
};
use axum::{
    Form,
    extract::{Query, State},
};
use maud::{Markup, html};
use serde::Deserialize;

const FIELD_INPUT_CLASSES: &str = "border rounded-lg px-3 sm:px-4 py-2 text-sm sm:text-base focus:outline-none focus:ring-2 focus:ring-blue-500 w-full transition-colors";
const FORM_BUTTON_CLASSES: &str = "text-white font-semibold px-6 sm:px-8 py-2.5 sm:py-3 rounded-xl shadow-md hover:shadow-lg transition-all duration-200 text-sm sm:text-base";
const ROW_BUTTON_CLASSES: &str = "text-white text-xs px-3 py-1.5 rounded-lg transition font-medium";

fn error_notice(e: &RosterError) -> Markup {
    if e.is_remote_failure() {
        notice(NoticeKind::Problem, e.to_string())
    } else {
        notice(NoticeKind::Warning, e.to_string())
    }
}

pub fn render_app(view: &RosterView, palette: Palette, banner: Option<Markup>) -> Markup {
    html! {
        div id="roster_app" hx-get="/internal/app" hx-trigger="roster-changed from:body" hx-swap="outerHTML" {
            @if let Some(banner) = banner {
                (banner)
            }
            (render_form(view, palette))
            (render_students(view, palette))
        }
    }
}

fn render_form(view: &RosterView, palette: Palette) -> Markup {
    html! {
        div id="student_form" class={"rounded-xl shadow-lg p-4 sm:p-6 mb-6 sm:mb-8 " (palette.panel)} {
            @if view.editing.is_some() {
                (subtitle(palette, "Edit Student"))
            } @else {
                (subtitle(palette, "Add New Student"))
            }

            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-3 sm:gap-4 mb-4 sm:mb-6" {
                @for field in Field::ALL {
                    (render_field(view, palette, field))
                }
            }

            div class="flex flex-col sm:flex-row justify-center items-center gap-2 sm:gap-3" {
                @if view.editing.is_some() {
                    button hx-put="/internal/students" hx-target="#roster_app" hx-swap="outerHTML" class={"bg-amber-500 hover:bg-amber-600 " (FORM_BUTTON_CLASSES)} {
                        "Update"
                    }
                    button hx-post="/internal/form/cancel" hx-target="#roster_app" hx-swap="outerHTML" class={"bg-slate-400 hover:bg-slate-500 " (FORM_BUTTON_CLASSES)} {
                        "Cancel"
                    }
                } @else {
                    button hx-post="/internal/students" hx-target="#roster_app" hx-swap="outerHTML" class={"bg-blue-600 hover:bg-blue-700 " (FORM_BUTTON_CLASSES)} {
                        "Add Student"
                    }
                    button hx-post="/internal/form/new" hx-target="#roster_app" hx-swap="outerHTML" class={"bg-slate-400 hover:bg-slate-500 " (FORM_BUTTON_CLASSES)} {
                        "Clear"
                    }
                }
                @if view.busy {
                    span class={"text-sm italic " (palette.muted)} {"Syncing with the store..."}
                }
            }
        }
    }
}

pub fn render_field(view: &RosterView, palette: Palette, field: Field) -> Markup {
    let error = view.field_errors.get(field);
    let border = if error.is_some() {
        "border-red-500"
    } else {
        palette.input_border
    };

    html! {
        div id={"field_" (field.name())} {
            input id={"input_" (field.name())} name="value" placeholder=(field.label()) value=(view.draft.get(field))
                hx-post="/internal/field" hx-trigger="input changed" hx-vals={"{\"field\": \"" (field.name()) "\"}"}
                hx-target={"#field_" (field.name())} hx-swap="outerHTML"
                class={(FIELD_INPUT_CLASSES) " " (palette.input) " " (border)};
            @if let Some(reason) = error {
                p class="text-red-500 text-xs sm:text-sm mt-1" {(reason)}
            }
        }
    }
}

fn render_students(view: &RosterView, palette: Palette) -> Markup {
    html! {
        div id="student_table" class={"rounded-xl shadow-lg overflow-hidden " (palette.panel)} {
            @if view.roster.is_empty() {
                p class={"text-center py-8 text-sm sm:text-base " (palette.muted)} {"No students yet. Add one above!"}
            } @else {
                @if !view.selected.is_empty() {
                    div class="flex justify-end p-3" {
                        button hx-post="/internal/students/delete/selected" hx-confirm={"Delete " (view.selected.len()) " selected student(s)?"}
                            hx-target="#roster_app" hx-swap="outerHTML" class={"bg-red-600 hover:bg-red-700 " (ROW_BUTTON_CLASSES)} {
                            "Delete selected (" (view.selected.len()) ")"
                        }
                    }
                }
                (render_table(
                    palette,
                    ["", "ID", "Roll No", "Name", "Age", "City", "Actions"],
                    view.roster.iter().map(|student| [
                        render_select(student, view.selected.contains(&student.id)),
                        html! {(student.id)},
                        html! {(student.roll_no)},
                        html! {span class={"font-medium " (palette.heading)} {(student.name)}},
                        html! {(student.age)},
                        html! {(student.city)},
                        render_actions(student, view.pending_delete == Some(student.id)),
                    ]).collect()
                ))
            }
        }
    }
}

fn id_vals(student: &Student) -> Markup {
    html! { "{\"id\": " (student.id) "}" }
}

fn render_select(student: &Student, selected: bool) -> Markup {
    html! {
        input type="checkbox" checked[selected] aria-label={"Select " (student.name)}
            hx-post="/internal/students/select" hx-vals=(id_vals(student)) hx-target="#roster_app" hx-swap="outerHTML"
            class="w-4 h-4 accent-red-600";
    }
}

fn render_actions(student: &Student, confirming: bool) -> Markup {
    let hx_vals = id_vals(student);

    html! {
        div class="flex justify-center gap-2" {
            @if confirming {
                button hx-delete="/internal/students" hx-vals=(hx_vals) hx-target="#roster_app" hx-swap="outerHTML" class={"bg-red-600 hover:bg-red-700 " (ROW_BUTTON_CLASSES)} {
                    "Confirm"
                }
                button hx-post="/internal/students/delete/cancel" hx-target="#roster_app" hx-swap="outerHTML" class={"bg-slate-400 hover:bg-slate-500 " (ROW_BUTTON_CLASSES)} {
                    "Cancel"
                }
            } @else {
                button hx-get="/internal/students/edit" hx-vals=(hx_vals) hx-target="#roster_app" hx-swap="outerHTML" class={"bg-emerald-500 hover:bg-emerald-600 " (ROW_BUTTON_CLASSES)} {
                    "Edit"
                }
                button hx-post="/internal/students/delete/request" hx-vals=(hx_vals) hx-target="#roster_app" hx-swap="outerHTML" class={"bg-red-500 hover:bg-red-600 " (ROW_BUTTON_CLASSES)} {
                    "Delete"
                }
            }
        }
    }
}

async fn app_fragment(state: &RosterState, outcome: RosterResult<()>) -> Markup {
    app_fragment_with(state, outcome.err().as_ref().map(error_notice)).await
}

async fn app_fragment_with(state: &RosterState, banner: Option<Markup>) -> Markup {
    let view = state.roster().view().await;
    render_app(&view, state.palette().await, banner)
}

pub async fn internal_get_app(State(state): State<RosterState>) -> Markup {
    app_fragment(&state, Ok(())).await
}

#[derive(Deserialize)]
pub struct FieldInput {
    field: Field,
    #[serde(default)]
    value: String,
}

pub async fn internal_post_field(
    State(state): State<RosterState>,
    Form(FieldInput { field, value }): Form<FieldInput>,
) -> Markup {
    if let Err(rejection) = state.roster().input(field, &value).await {
        debug!(?rejection, "Rejected keystroke");
    }

    let view = state.roster().view().await;
    render_field(&view, state.palette().await, field)
}

pub async fn internal_post_student(State(state): State<RosterState>) -> Markup {
    let outcome = state.roster().submit_create().await;
    app_fragment(&state, outcome).await
}

pub async fn internal_put_student(State(state): State<RosterState>) -> Markup {
    let outcome = state.roster().submit_update().await;
    app_fragment(&state, outcome).await
}

pub async fn internal_get_edit_form(
    State(state): State<RosterState>,
    Query(IdForm { id }): Query<IdForm>,
) -> Markup {
    let outcome = state.roster().start_edit(id).await;
    app_fragment(&state, outcome).await
}

pub async fn internal_post_new_form(State(state): State<RosterState>) -> Markup {
    state.roster().start_create().await;
    app_fragment(&state, Ok(())).await
}

pub async fn internal_post_cancel_form(State(state): State<RosterState>) -> Markup {
    state.roster().cancel().await;
    app_fragment(&state, Ok(())).await
}

pub async fn internal_post_request_delete(
    State(state): State<RosterState>,
    Form(IdForm { id }): Form<IdForm>,
) -> Markup {
    state.roster().request_delete(id).await;
    app_fragment(&state, Ok(())).await
}

pub async fn internal_delete_student(
    State(state): State<RosterState>,
    Query(IdForm { id }): Query<IdForm>,
) -> Markup {
    let outcome = state.roster().confirm_delete(id).await;
    app_fragment(&state, outcome).await
}

pub async fn internal_post_select_student(
    State(state): State<RosterState>,
    Form(IdForm { id }): Form<IdForm>,
) -> Markup {
    let outcome = state.roster().toggle_selected(id).await;
    app_fragment(&state, outcome).await
}

pub async fn internal_post_delete_selected(State(state): State<RosterState>) -> Markup {
    let banner = match state.roster().delete_selected().await {
        Ok(count) => notice(NoticeKind::Success, format!("Deleted {count} student(s).")),
        Err(e) => error_notice(&e),
    };
    app_fragment_with(&state, Some(banner)).await
}

pub async fn internal_post_cancel_delete(State(state): State<RosterState>) -> Markup {
    state.roster().cancel_delete().await;
    app_fragment(&state, Ok(())).await
}

pub async fn internal_post_refresh(State(state): State<RosterState>) -> Markup {
    let outcome = state.roster().load_roster().await;
    app_fragment(&state, outcome).await
}
