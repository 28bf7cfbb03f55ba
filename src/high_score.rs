use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_DIR_NAME: &str = "snake-engine";
const SCORE_FILE_NAME: &str = "high_scores.json";

/// Best scores keyed by rule set name.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    #[serde(default)]
    by_ruleset: BTreeMap<String, u32>,
}

impl HighScores {
    #[must_use]
    pub fn get(&self, ruleset: &str) -> u32 {
        self.by_ruleset.get(ruleset).copied().unwrap_or(0)
    }

    /// Stores `score` when it beats the current best. Returns true on a new best.
    pub fn record(&mut self, ruleset: &str, score: u32) -> bool {
        let best = self.by_ruleset.entry(ruleset.to_owned()).or_insert(0);
        if score > *best {
            *best = score;
            true
        } else {
            false
        }
    }
}

/// Returns the platform-correct score file path.
#[must_use]
pub fn scores_path() -> PathBuf {
    let mut base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push(APP_DIR_NAME);
    base.push(SCORE_FILE_NAME);
    base
}

/// Loads high scores from `path`.
///
/// Returns empty scores when the file does not yet exist (first run).
/// Returns `Err` when the file exists but cannot be read or parsed, so the
/// caller can surface a warning before entering raw terminal mode.
pub fn load_high_scores(path: &Path) -> io::Result<HighScores> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HighScores::default()),
        Err(e) => return Err(e),
    };

    serde_json::from_str::<HighScores>(&raw)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Saves high scores to `path`, creating parent directories when needed.
pub fn save_high_scores(path: &Path, scores: &HighScores) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(scores)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;

    fs::write(path, json)
}
