//! Tunable parameters for the rollout policy and the position evaluator.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Flat set of named weights, stored as a JSON object with snake_case keys.
/// Keys missing from a file take their default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    /// Evaluator bonus per joker held.
    pub ace_bonus: f64,
    /// Evaluator bonus per wildcard held.
    pub wild_bonus: f64,
    pub synergy_bonus: f64,
    /// Evaluator shift per card of lead over the best opponent.
    pub card_diff_weight: f64,
    pub king_penalty: f64,
    pub queen_penalty: f64,
    pub isolated_low_penalty: f64,
    pub cluster_bonus: f64,
    pub tempo_bonus: f64,
    /// Rollout multiplier per joker spent.
    pub ace_play_factor: f64,
    /// Rollout multiplier per wildcard spent.
    pub wild_play_factor: f64,
    pub synergy_penalty: f64,
    pub rank_preference: f64,
    pub pass_base: f64,
    pub pass_special_factor: f64,
    /// Reserved: read, validated and written back so existing weight files
    /// round-trip, but no search code consumes it. Rollouts use a fixed
    /// behind-schedule instead.
    pub pass_behind_factor: f64,
    pub urgency_penalty: f64,
    pub early_game_pass_factor: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            ace_bonus: 0.33,
            wild_bonus: 0.38,
            synergy_bonus: 0.20,
            card_diff_weight: 0.085,
            king_penalty: 0.05,
            queen_penalty: 0.032,
            isolated_low_penalty: 0.042,
            cluster_bonus: 0.038,
            tempo_bonus: 0.085,
            ace_play_factor: 0.52,
            wild_play_factor: 0.33,
            synergy_penalty: 0.40,
            rank_preference: 0.11,
            pass_base: 0.085,
            pass_special_factor: 0.225,
            pass_behind_factor: 0.31,
            urgency_penalty: 0.09,
            early_game_pass_factor: 0.32,
        }
    }
}

/// Inclusive valid range of one weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightRange {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

const fn range(name: &'static str, min: f64, max: f64) -> WeightRange {
    WeightRange { name, min, max }
}

/// Documented ranges, in field order.
pub const WEIGHT_RANGES: [WeightRange; 18] = [
    range("ace_bonus", 0.08, 0.85),
    range("wild_bonus", 0.08, 0.65),
    range("synergy_bonus", 0.02, 0.45),
    range("card_diff_weight", 0.02, 0.30),
    range("king_penalty", 0.01, 0.18),
    range("queen_penalty", 0.01, 0.15),
    range("isolated_low_penalty", 0.01, 0.18),
    range("cluster_bonus", 0.01, 0.20),
    range("tempo_bonus", 0.02, 0.30),
    range("ace_play_factor", 0.15, 1.30),
    range("wild_play_factor", 0.15, 1.10),
    range("synergy_penalty", 0.15, 1.10),
    range("rank_preference", 0.02, 0.45),
    range("pass_base", 0.02, 0.35),
    range("pass_special_factor", 0.05, 0.65),
    range("pass_behind_factor", 0.10, 0.85),
    range("urgency_penalty", 0.02, 0.25),
    range("early_game_pass_factor", 0.0, 0.60),
];

#[derive(Debug, Error)]
pub enum WeightsError {
    #[error("failed to read weights file {path}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to write weights file {path}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse weights file {path}")]
    Parse {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("failed to encode weights")]
    Encode(#[source] serde_json::Error),
    #[error("weight {field} = {value} is outside {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl Weights {
    /// Values in the same order as [`WEIGHT_RANGES`].
    pub fn values(&self) -> [f64; 18] {
        [
            self.ace_bonus,
            self.wild_bonus,
            self.synergy_bonus,
            self.card_diff_weight,
            self.king_penalty,
            self.queen_penalty,
            self.isolated_low_penalty,
            self.cluster_bonus,
            self.tempo_bonus,
            self.ace_play_factor,
            self.wild_play_factor,
            self.synergy_penalty,
            self.rank_preference,
            self.pass_base,
            self.pass_special_factor,
            self.pass_behind_factor,
            self.urgency_penalty,
            self.early_game_pass_factor,
        ]
    }

    pub fn validate(&self) -> Result<(), WeightsError> {
        for (range, value) in WEIGHT_RANGES.iter().zip(self.values()) {
            if !value.is_finite() || value < range.min || value > range.max {
                return Err(WeightsError::OutOfRange {
                    field: range.name,
                    value,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Reads and validates a weights file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WeightsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WeightsError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let weights = Self::from_json(&text).map_err(|source| WeightsError::Parse {
            source,
            path: path.to_path_buf(),
        })?;
        weights.validate()?;
        Ok(weights)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), WeightsError> {
        let path = path.as_ref();
        let json = self.to_json().map_err(WeightsError::Encode)?;
        fs::write(path, json).map_err(|source| WeightsError::Write {
            source,
            path: path.to_path_buf(),
        })
    }

    /// Loads a weights file, falling back to defaults when it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(weights) => weights,
            Err(err) => {
                warn!(
                    target: "azen_engine::weights",
                    path = %path.display(),
                    error = %err,
                    "using default weights"
                );
                Self::default()
            }
        }
    }
}
