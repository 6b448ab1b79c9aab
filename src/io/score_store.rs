use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::io::recovery::atomic_write;
use crate::model::DailyScore;

/// Score history, persisted to `stats.json` keyed by ISO date
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ScoreHistory {
    #[serde(default)]
    pub daily_scores: BTreeMap<String, DailyScore>,
}

/// Read the score history. A missing or corrupt file gives an empty history.
pub fn read_score_history(path: &Path) -> ScoreHistory {
    let Ok(content) = fs::read_to_string(path) else {
        return ScoreHistory::default();
    };
    match serde_json::from_str(&content) {
        Ok(history) => history,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt score history; starting empty");
            ScoreHistory::default()
        }
    }
}

pub fn write_score_history(path: &Path, history: &ScoreHistory) -> Result<(), std::io::Error> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let content = serde_json::to_string_pretty(history)?;
    atomic_write(path, content.as_bytes())
}
