use crate::weights::{Weights, WeightsError};
use azen_core::game::dominance::DominanceRule;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Bounds for the exact endgame search that runs before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcedWinLimits {
    /// Exact search only runs when at most this many cards remain in hands.
    pub card_ceiling: usize,
    /// Plies allowed per card in hands.
    pub depth_per_card: usize,
    pub node_budget: usize,
}

impl Default for ForcedWinLimits {
    fn default() -> Self {
        Self {
            card_ceiling: 10,
            depth_per_card: 4,
            node_budget: 500_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub iterations: usize,
    /// Wall-clock limit in milliseconds; `None` or zero means unbounded.
    pub max_time_ms: Option<u64>,
    pub exploration: f64,
    pub workers: usize,
    /// Search the true deal instead of sampled worlds.
    pub full_information: bool,
    /// Master seed; `None` draws one from the OS.
    pub seed: Option<u64>,
    pub rollout_move_cap: usize,
    pub analysis_samples: usize,
    pub dominance: DominanceRule,
    pub forced_win: ForcedWinLimits,
    pub weights: Weights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            max_time_ms: None,
            exploration: 1.4,
            workers: 2,
            full_information: false,
            seed: None,
            rollout_move_cap: 400,
            analysis_samples: 1_000,
            dominance: DominanceRule::default(),
            forced_win: ForcedWinLimits::default(),
            weights: Weights::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("exploration constant {0} must be finite and non-negative")]
    Exploration(f64),
    #[error(transparent)]
    Weights(#[from] WeightsError),
}

impl SearchConfig {
    /// Small, seeded configuration for tests and quick experiments.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            iterations: 400,
            workers: 1,
            seed: Some(seed),
            analysis_samples: 200,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iterations == 0 {
            return Err(ConfigError::NotPositive { field: "iterations" });
        }
        if self.workers == 0 {
            return Err(ConfigError::NotPositive { field: "workers" });
        }
        if self.rollout_move_cap == 0 {
            return Err(ConfigError::NotPositive {
                field: "rollout_move_cap",
            });
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return Err(ConfigError::Exploration(self.exploration));
        }
        self.weights.validate()?;
        Ok(())
    }

    /// Splits the iteration budget; the last worker absorbs the remainder.
    pub(crate) fn iteration_shares(&self) -> Vec<usize> {
        let workers = self.workers.max(1);
        let per_worker = (self.iterations / workers).max(1);
        (0..workers)
            .map(|index| {
                if index + 1 == workers {
                    self.iterations.saturating_sub(per_worker * (workers - 1)).max(1)
                } else {
                    per_worker
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SearchConfig};
    use std::time::Duration;

    #[test]
    fn defaults_validate() {
        let config = SearchConfig::default();
        config.validate().unwrap();
        assert_eq!(config.iterations, 10_000);
        assert_eq!(config.workers, 2);
        assert_eq!(config.max_time(), None);
    }

    #[test]
    fn zero_time_means_unbounded() {
        let mut config = SearchConfig::default();
        config.max_time_ms = Some(0);
        assert_eq!(config.max_time(), None);
        config.max_time_ms = Some(250);
        assert_eq!(config.max_time(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_zero_workers() {
        let config = SearchConfig::default().with_workers(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "workers" })
        ));
    }

    #[test]
    fn shares_cover_the_budget() {
        let config = SearchConfig::default().with_iterations(1003).with_workers(4);
        let shares = config.iteration_shares();
        assert_eq!(shares, vec![250, 250, 250, 253]);
        assert_eq!(shares.iter().sum::<usize>(), 1003);

        let tiny = SearchConfig::default().with_iterations(2).with_workers(4);
        assert!(tiny.iteration_shares().iter().all(|share| *share >= 1));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{ "iterations": 50, "full_information": true }"#).unwrap();
        assert_eq!(config.iterations, 50);
        assert!(config.full_information);
        assert_eq!(config.rollout_move_cap, 400);
    }
}
