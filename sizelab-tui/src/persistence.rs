//! Form persistence: JSON save/load across restarts.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sizelab_core::{PositionMetrics, PositionType};

/// What survives a restart. Prices are kept as typed so a half-finished
/// form comes back exactly as it was left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub entry_price: String,
    pub stop_loss: String,
    pub leverage: String,
    pub position_type: PositionType,
    pub portfolio_value: f64,
    /// Fraction of the portfolio risked per trade (0.01 = 1%).
    pub r_percent: f64,
    /// Last committed sizing, if any.
    pub metrics: Option<PositionMetrics>,
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            entry_price: "100".into(),
            stop_loss: "95".into(),
            leverage: "10".into(),
            position_type: PositionType::Long,
            portfolio_value: 10_000.0,
            r_percent: 0.01,
            metrics: None,
            saved_at: None,
        }
    }
}

/// Load persisted state from disk. Returns defaults if file is missing or corrupt.
pub fn load(path: &Path) -> PersistedState {
    match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "corrupt state file, using defaults");
            PersistedState::default()
        }),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let state = PersistedState {
            entry_price: "64250.5".into(),
            position_type: PositionType::Short,
            portfolio_value: 50_000.0,
            metrics: Some(PositionMetrics::new(100.0, 1000.0, 10.0, 50.0)),
            saved_at: Some(Utc::now()),
            ..PersistedState::default()
        };

        save(&path, &state).unwrap();
        let loaded = load(&path);

        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_file_returns_defaults() {
        let loaded = load(Path::new("/nonexistent/path/state.json"));
        assert_eq!(loaded, PersistedState::default());
    }

    #[test]
    fn corrupt_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(load(&path), PersistedState::default());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{ "entry_price": "42", "position_type": "SHORT" }"#).unwrap();

        let loaded = load(&path);
        assert_eq!(loaded.entry_price, "42");
        assert_eq!(loaded.position_type, PositionType::Short);
        assert_eq!(loaded.portfolio_value, 10_000.0);
    }
}
