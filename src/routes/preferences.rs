use crate::{error::RosterResult, state::RosterState};
use axum::{extract::State, response::Redirect};

pub async fn post_toggle_theme(State(state): State<RosterState>) -> RosterResult<Redirect> {
    let preferences = state.preferences().toggle_dark_mode().await?;
    info!(dark_mode = preferences.dark_mode, "Switched theme");

    Ok(Redirect::to("/"))
}
