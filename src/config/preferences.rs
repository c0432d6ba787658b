use crate::error::{
    ReadPreferencesSnafu, RmpSerdeDecodeSnafu, RmpSerdeEncodeSnafu, RosterResult,
    WritePreferencesSnafu,
};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::{io::ErrorKind, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;

/// Per-installation display settings. Nothing here touches the roster.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

/// Loaded once at startup, written back on every change.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
    current: Arc<RwLock<Preferences>>,
}

impl PreferencesStore {
    pub async fn load(path: PathBuf) -> RosterResult<Self> {
        let current = match tokio::fs::read(&path).await {
            Ok(bytes) => rmp_serde::from_slice(&bytes).context(RmpSerdeDecodeSnafu)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(?path, "No saved preferences, using defaults");
                Preferences::default()
            }
            Err(source) => return Err(source).context(ReadPreferencesSnafu { path }),
        };

        Ok(Self {
            path,
            current: Arc::new(RwLock::new(current)),
        })
    }

    pub async fn get(&self) -> Preferences {
        *self.current.read().await
    }

    pub async fn toggle_dark_mode(&self) -> RosterResult<Preferences> {
        let mut current = self.current.write().await;
        let updated = Preferences {
            dark_mode: !current.dark_mode,
        };

        let bytes = rmp_serde::to_vec_named(&updated).context(RmpSerdeEncodeSnafu)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .context(WritePreferencesSnafu {
                path: self.path.clone(),
            })?;

        *current = updated;
        Ok(updated)
    }
}
