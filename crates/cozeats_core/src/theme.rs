//! Persisted theme preference

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    Result,
    store::{SharedStore, keys},
};

/// A concrete color scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// What the user picked; `System` follows the platform scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeOption {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemeOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeOption::Light => "light",
            ThemeOption::Dark => "dark",
            ThemeOption::System => "system",
        }
    }

    pub fn resolve(&self, system: Theme) -> Theme {
        match self {
            ThemeOption::Light => Theme::Light,
            ThemeOption::Dark => Theme::Dark,
            ThemeOption::System => system,
        }
    }
}

impl fmt::Display for ThemeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for ThemeOption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeOption::Light),
            "dark" => Ok(ThemeOption::Dark),
            "system" => Ok(ThemeOption::System),
            other => Err(format!(
                "unknown theme '{other}', expected light, dark or system"
            )),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.parse::<ThemeOption>()? {
            ThemeOption::Light => Ok(Theme::Light),
            ThemeOption::Dark => Ok(Theme::Dark),
            ThemeOption::System => Err("'system' is not a concrete theme".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct ThemePreference {
    store: SharedStore,
    option: Arc<RwLock<ThemeOption>>,
}

impl ThemePreference {
    /// Load the stored preference, falling back to `default`
    pub async fn load(store: SharedStore, default: ThemeOption) -> Self {
        let option = match store.get(keys::THEME).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|e| {
                warn!("Ignoring stored theme: {}", e);
                default
            }),
            Ok(None) => default,
            Err(e) => {
                warn!("Failed to load theme preference: {}", e);
                default
            }
        };

        Self {
            store,
            option: Arc::new(RwLock::new(option)),
        }
    }

    pub fn option(&self) -> ThemeOption {
        *self.option.read()
    }

    pub fn resolve(&self, system: Theme) -> Theme {
        self.option().resolve(system)
    }

    pub async fn set(&self, option: ThemeOption) -> Result<()> {
        self.store.set(keys::THEME, option.as_str()).await?;
        *self.option.write() = option;
        debug!(theme = %option, "saved theme preference");
        Ok(())
    }
}
