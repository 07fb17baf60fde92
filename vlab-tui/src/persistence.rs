//! UI preference persistence: JSON save/load across restarts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::{AppState, FormState, Page};

/// Serializable subset of app state that persists across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub active_page: Page,
    pub last_symbol: String,
    pub last_start: String,
    pub last_end: String,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            active_page: Page::Home,
            last_symbol: String::new(),
            last_start: String::new(),
            last_end: String::new(),
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
        Err(_) => PersistedState::default(),
    }
}

/// Save persisted state to disk. Creates parent directories if needed.
pub fn save(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Extract persisted state from AppState.
pub fn extract(app: &AppState) -> PersistedState {
    PersistedState {
        active_page: app.active_page,
        last_symbol: app.form.symbol.clone(),
        last_start: app.form.start.clone(),
        last_end: app.form.end.clone(),
    }
}

/// Apply persisted state to AppState. The form is prefilled; the controller
/// only sees it once a strategy is chosen.
pub fn apply(app: &mut AppState, state: PersistedState) {
    app.active_page = state.active_page;
    app.form = FormState {
        symbol: state.last_symbol,
        start: state.last_start,
        end: state.last_end,
        ..FormState::default()
    };
}
