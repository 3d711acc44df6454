use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::selfplay::{DecisionSummary, GameOutcome};

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for game {1}")]
    MissingBaselineGame(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

pub struct AnalyticsCollector {
    baseline: Option<String>,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.metrics.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        Self {
            baseline: config.metrics.baseline.clone(),
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
            latency_budget_ms: config.metrics.latency_budget_ms,
        }
    }

    pub fn record_game(
        &mut self,
        game_index: usize,
        outcome: &GameOutcome,
    ) -> Result<(), AnalyticsError> {
        for seat in &outcome.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_game(seat.placement_score, seat.placement == 0, &seat.metrics);
        }

        let Some(baseline) = self.baseline.as_ref() else {
            return Ok(());
        };
        let baseline_score = outcome
            .seat_results
            .iter()
            .find(|seat| &seat.agent_name == baseline)
            .map(|seat| seat.placement_score)
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineGame(baseline.clone(), format!("G{game_index:05}"))
            })?;

        for seat in &outcome.seat_results {
            if &seat.agent_name == baseline {
                continue;
            }
            self.comparisons
                .entry(seat.agent_name.clone())
                .or_insert_with(ComparisonAccumulator::new)
                .record(seat.placement_score - baseline_score);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let z = confidence_z();
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report(z));
            }
        }

        let mut comparisons = Vec::new();
        if let Some(baseline) = self.baseline.as_ref() {
            for report in &reports {
                if &report.name == baseline {
                    continue;
                }
                let (p_value, sample_size) = self
                    .comparisons
                    .remove(&report.name)
                    .map_or((1.0, 0), ComparisonAccumulator::wilcoxon_signed_rank);
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size,
                });
            }
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

fn confidence_z() -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0),
        Err(_) => 1.96,
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    games: u32,
    wins: u32,
    scores: Vec<f64>,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            games: 0,
            wins: 0,
            scores: Vec::new(),
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_game(&mut self, score: f64, is_winner: bool, metrics: &DecisionSummary) {
        self.games += 1;
        self.scores.push(score);
        if is_winner {
            self.wins += 1;
        }
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += metrics.decisions as u64;
    }

    fn into_report(self, z: f64) -> AgentReport {
        let (mean_score, ci95) = mean_with_interval(&self.scores, z);
        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind.clone(),
            games: self.games as usize,
            mean_score,
            ci95,
            wins: self.wins as usize,
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: None,
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided Wilcoxon signed-rank test (normal approximation, tie-corrected).
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for pair in &paired[i..=j] {
                ranks.push((rank, pair.1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5) / variance_w.sqrt();
        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: Option<String>,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_mean = self.baseline.as_ref().and_then(|baseline| {
            self.agents
                .iter()
                .find(|agent| &agent.name == baseline)
                .map(|agent| agent.mean_score)
        });

        if let Some(baseline_mean) = baseline_mean {
            for agent in &mut self.agents {
                agent.delta_vs_baseline = Some(agent.mean_score - baseline_mean);
            }
        }

        self
    }

    pub fn agent(&self, name: &str) -> Option<&AgentReport> {
        self.agents.iter().find(|agent| agent.name == name)
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Self-Play Summary\n\n");
        if let Some(baseline) = self.baseline.as_ref() {
            rows.push_str(&format!("Baseline: {baseline}\n\n"));
        }
        rows.push_str(&format!(
            "Latency budget: {} ms average per decision\n\n",
            self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Games | Mean score | Δ vs baseline | 95% CI | Win % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|-------|------------|----------------|--------|-------|------------------|-------------|---------|\n");

        for agent in &self.agents {
            let p_value = self
                .comparisons
                .iter()
                .find(|c| c.agent == agent.name)
                .map_or_else(|| "-".to_string(), |c| format!("{:.3}", c.p_value));
            let delta = agent
                .delta_vs_baseline
                .map_or_else(|| "-".to_string(), |delta| format!("{delta:+.3}"));
            let win_rate = if agent.games == 0 {
                0.0
            } else {
                agent.wins as f64 / agent.games as f64
            };

            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {mean:.3} | {delta} | [{ci_low:.3}, {ci_high:.3}] | {win:.1}% | {latency:.2} | {over_budget} | {p_value} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                mean = agent.mean_score,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                win = win_rate * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub games: usize,
    /// Mean placement score: 1.0 for first place, 0.0 for last.
    pub mean_score: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub average_ms_per_decision: f64,
    pub delta_vs_baseline: Option<f64>,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn mean_with_interval(scores: &[f64], z: f64) -> (f64, (f64, f64)) {
    if scores.is_empty() {
        return (0.0, (0.0, 0.0));
    }
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    if scores.len() == 1 {
        return (mean, (mean, mean));
    }
    let variance = scores
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (scores.len() as f64 - 1.0);
    let margin = z * (variance / scores.len() as f64).sqrt();
    (mean, (mean - margin, mean + margin))
}
