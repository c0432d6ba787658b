use crate::{
    routes::{import_export::render_import_panel, students::render_app},
    state::RosterState,
};
use axum::extract::State;
use maud::{Markup, html};

pub async fn get_index_route(State(state): State<RosterState>) -> Markup {
    let view = state.roster().view().await;
    let palette = state.palette().await;

    state
        .render(html! {
            (render_app(&view, palette, None))
            (render_import_panel(palette))
        })
        .await
}
