use crate::{
    config::{RuntimeConfiguration, StoreLocation, preferences::PreferencesStore},
    error::RosterResult,
    maud_conveniences::{Palette, title},
    roster::Roster,
    store::{RosterStore, http::HttpStore, memory::MemoryStore},
};
use maud::{DOCTYPE, Markup, html};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct RosterState {
    roster: Roster,
    preferences: PreferencesStore,
}

impl RosterState {
    pub async fn new(config: &RuntimeConfiguration) -> RosterResult<Self> {
        let store_config = config.store_config();
        let store: Arc<dyn RosterStore> = match store_config.location() {
            StoreLocation::Http(url) => {
                info!(?url, timeout = ?store_config.timeout(), "Using HTTP student store");
                Arc::new(HttpStore::new(url, store_config.timeout())?)
            }
            StoreLocation::Memory => {
                warn!("Using in-memory student store, nothing will be kept");
                Arc::new(MemoryStore::default())
            }
        };

        let preferences = PreferencesStore::load(config.preferences_path()).await?;

        Ok(Self::from_parts(Roster::new(store), preferences))
    }

    pub const fn from_parts(roster: Roster, preferences: PreferencesStore) -> Self {
        Self {
            roster,
            preferences,
        }
    }

    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    pub const fn preferences(&self) -> &PreferencesStore {
        &self.preferences
    }

    pub async fn palette(&self) -> Palette {
        Palette::for_preferences(self.preferences.get().await)
    }

    pub async fn render(&self, markup: Markup) -> Markup {
        let preferences = self.preferences.get().await;
        let palette = Palette::for_preferences(preferences);

        html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="UTF-8" {}
                    meta name="viewport" content="width=device-width, initial-scale=1.0" {}
                    script src="https://unpkg.com/htmx.org@2.0.4" integrity="sha384-HGfztofotfshcF7+8n44JQL2oJmowVChPTg48S+jvZoztPfvwD79OC/LTtG6dMp+" crossorigin="anonymous" {}
                    script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                    title { "Student Management" }
                }
                body class={"min-h-screen p-4 sm:p-6 md:p-8 transition-colors duration-300 " (palette.page)} {
                    div class="max-w-6xl mx-auto" {
                        div class="flex justify-between items-center mb-6 sm:mb-8" {
                            (title(palette, "Student Management"))
                            div class="flex gap-2" {
                                a href="/export" class="bg-slate-500 hover:bg-slate-600 text-white text-sm px-4 py-2 rounded-full" {"Export CSV"}
                                form method="post" action="/preferences/theme" {
                                    button type="submit" class="bg-slate-800 hover:bg-slate-700 text-white text-sm px-4 py-2 rounded-full" {
                                        @if preferences.dark_mode { "Light mode" } @else { "Dark mode" }
                                    }
                                }
                            }
                        }
                        (markup)
                    }
                }
            }
        }
    }
}
