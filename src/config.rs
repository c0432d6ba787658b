use crate::error::{BadEnvVarSnafu, ParseTimeoutSnafu, RosterResult, ZeroTimeoutSnafu};
use dotenvy::var;
use snafu::{ResultExt, ensure};
use std::{env::VarError, path::PathBuf, sync::Arc, time::Duration};

pub mod preferences;

const DEFAULT_SERVER_IP: &str = "127.0.0.1:8080";
const DEFAULT_STORE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_STORE_TIMEOUT_SECS: &str = "15";
const DEFAULT_PREFERENCES_PATH: &str = "roster_preferences.msgpack";

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    server_ip: String,
    store_config: Arc<StoreConfig>,
    preferences_path: PathBuf,
}

impl RuntimeConfiguration {
    pub fn new() -> RosterResult<Self> {
        Ok(Self {
            server_ip: var_or("ROSTER_SERVER_IP", DEFAULT_SERVER_IP)?,
            store_config: Arc::new(StoreConfig::new()?),
            preferences_path: var_or("ROSTER_PREFERENCES_PATH", DEFAULT_PREFERENCES_PATH)?
                .into(),
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub fn store_config(&self) -> Arc<StoreConfig> {
        self.store_config.clone()
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Http(String),
    Memory,
}

#[derive(Debug)]
pub struct StoreConfig {
    location: StoreLocation,
    timeout: Duration,
}

impl StoreConfig {
    pub fn new() -> RosterResult<Self> {
        let url = var_or("ROSTER_STORE_URL", DEFAULT_STORE_URL)?;
        let timeout = var_or("ROSTER_STORE_TIMEOUT_SECS", DEFAULT_STORE_TIMEOUT_SECS)?;

        Ok(Self {
            location: Self::parse_location(url),
            timeout: Self::parse_timeout(&timeout)?,
        })
    }

    ///whole seconds, at least one
    fn parse_timeout(timeout: &str) -> RosterResult<Duration> {
        let secs = timeout
            .trim()
            .parse::<u64>()
            .context(ParseTimeoutSnafu { original: timeout })?;
        ensure!(secs > 0, ZeroTimeoutSnafu { original: timeout });

        Ok(Duration::from_secs(secs))
    }

    fn parse_location(url: String) -> StoreLocation {
        if url.trim().eq_ignore_ascii_case("memory") {
            StoreLocation::Memory
        } else {
            StoreLocation::Http(url)
        }
    }

    pub const fn location(&self) -> &StoreLocation {
        &self.location
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

///missing vars fall back to `default`, anything else wrong with them is an error
fn var_or(name: &'static str, default: &str) -> RosterResult<String> {
    match var(name) {
        Ok(value) => Ok(value),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(default.to_string()),
        Err(e) => Err(e).context(BadEnvVarSnafu { name }),
    }
}
