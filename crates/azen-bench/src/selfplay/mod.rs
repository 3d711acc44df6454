mod rotation;

pub use rotation::SeatRotation;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use azen_core::game::position::Position;
use azen_core::game::serialization::PositionSnapshot;
use azen_core::knowledge::KnowledgeModel;
use azen_core::model::player::PlayerId;
use azen_core::model::table::TableConfig;
use azen_engine::search::score_for_placement;
use azen_engine::{
    Agent, AgentContext, EngineError, HeuristicAgent, SearchAgent, SearchConfig, Weights,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs, ValidationError};
use crate::logging::telemetry_path;

/// Orchestrates a series of self-play games between configured agents.
pub struct SelfPlayRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    table: TableConfig,
    agents: Vec<AgentBlueprint>,
    rotation: SeatRotation,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub games_completed: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl SelfPlayRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let table = config.table.resolve()?;
        let agents = AgentBlueprint::from_configs(&config.agents)?;

        if agents.len() != table.players {
            return Err(RunnerError::SeatCount {
                expected: table.players,
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            rotation: SeatRotation::new(table.players),
            config,
            outputs,
            table,
            agents,
        })
    }

    /// Play every configured game, streaming one JSONL row per game.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut games_completed = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config);

        for game_index in 0..self.config.games.count {
            let deal_seed = rng.next_u64();
            let outcome = self.play_game(game_index, deal_seed)?;
            if outcome.completed {
                games_completed += 1;
            }
            analytics.record_game(game_index, &outcome)?;
            write_game_row(&mut writer, &self.config, game_index, deal_seed, &outcome)?;
            rows_written += 1;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .logging_enabled
            .then(|| telemetry_path(&self.outputs));

        Ok(RunSummary {
            games_played: self.config.games.count,
            games_completed,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    /// Deal and play one game to completion or the move limit.
    pub fn play_game(&self, game_index: usize, deal_seed: u64) -> Result<GameOutcome, RunnerError> {
        let seating = self.rotation.for_game(game_index);
        let mut position = Position::deal_with_seed(self.table, PlayerId(0), deal_seed);
        let deal = PositionSnapshot::capture(&position);
        let mut seats = build_seat_states(&seating, &self.agents, &position, deal_seed)?;
        let mut moves = 0usize;

        while !position.is_terminal() && moves < self.config.games.move_limit {
            let turn = position.turn();
            let seat = &mut seats[turn.index()];
            let start = Instant::now();
            let chosen = seat.agent.choose(&AgentContext {
                position: &position,
                knowledge: &seat.knowledge,
            })?;
            let elapsed_ms = seat.metrics.record(start.elapsed());

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                let (score, visits) = chosen
                    .evaluation
                    .as_ref()
                    .map_or((None, None), |eval| (Some(eval.score), Some(eval.visits)));
                event!(
                    target: "azen_bench::selfplay",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    move_index = moves as u32,
                    seat = %turn,
                    agent = %seat.agent_name,
                    chosen = %chosen.mv.key(),
                    score,
                    visits,
                    elapsed_ms
                );
            }

            let round = *position.round();
            position.apply_move(&chosen.mv).map_err(|err| {
                RunnerError::game(format!(
                    "invalid move by {} ({}): {err} [{}]",
                    turn,
                    seat.agent_name,
                    chosen.mv.key()
                ))
            })?;
            for observer in &mut seats {
                if chosen.mv.is_pass() {
                    observer.knowledge.record_pass(turn, &round);
                } else {
                    observer.knowledge.record_move(&chosen.mv);
                }
            }
            moves += 1;
        }

        let ranking = final_ranking(&position);
        let players = position.players();
        let seat_snapshots = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat.seat.to_string(),
                agent: seat.agent_name.clone(),
            })
            .collect();
        let finish_order = ranking
            .iter()
            .map(|player| seats[player.index()].agent_name.clone())
            .collect();

        let mut seat_results = Vec::with_capacity(players);
        for seat in seats {
            let placement = ranking
                .iter()
                .position(|&player| player == seat.seat)
                .unwrap_or(players - 1);
            seat_results.push(SeatResult {
                agent_name: seat.agent_name,
                seat: seat.seat,
                placement,
                placement_score: score_for_placement(players, placement),
                metrics: seat.metrics.finalize(),
            });
        }

        Ok(GameOutcome {
            seating: seat_snapshots,
            seat_results,
            finish_order,
            completed: position.is_terminal(),
            moves,
            deal,
        })
    }
}

/// Finished players in finishing order, then everyone else by cards left.
pub fn final_ranking(position: &Position) -> Vec<PlayerId> {
    let mut ranking = position.finish_order().to_vec();
    let mut unfinished: Vec<PlayerId> = PlayerId::all(position.players())
        .filter(|player| !ranking.contains(player))
        .collect();
    unfinished.sort_by_key(|player| (position.hand_len(*player), player.index()));
    ranking.extend(unfinished);
    ranking
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    deal_seed: u64,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: config.run_id.clone(),
        game_id: format!("G{game_index:05}"),
        game_index,
        deal_seed,
        seating: outcome.seating.clone(),
        finish_order: outcome.finish_order.clone(),
        completed: outcome.completed,
        moves: outcome.moves,
        results: outcome
            .seat_results
            .iter()
            .map(|result| SeatResultRow {
                seat: result.seat.to_string(),
                agent: result.agent_name.clone(),
                placement: result.placement,
                placement_score: result.placement_score,
                decisions: result.metrics.decisions,
                speed_ms_turn: result.metrics.avg_ms_per_decision,
            })
            .collect(),
        deal: outcome.deal.clone(),
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

fn build_seat_states(
    seating: &[usize],
    agents: &[AgentBlueprint],
    position: &Position,
    deal_seed: u64,
) -> Result<Vec<SeatState>, RunnerError> {
    let table = *position.table();
    let mut seats = Vec::with_capacity(seating.len());
    for (seat_idx, agent_idx) in seating.iter().enumerate() {
        let seat = PlayerId(seat_idx);
        let agent = agents
            .get(*agent_idx)
            .ok_or(RunnerError::InvalidSeating {
                index: seat_idx,
                agent_index: *agent_idx,
            })?;
        seats.push(SeatState {
            seat,
            agent_name: agent.name.clone(),
            agent: agent.spawn(seat, deal_seed),
            knowledge: KnowledgeModel::new(table, seat, position.hand(seat), &[]),
            metrics: DecisionMetrics::default(),
        });
    }
    Ok(seats)
}

struct SeatState {
    seat: PlayerId,
    agent_name: String,
    agent: Box<dyn Agent>,
    knowledge: KnowledgeModel,
    metrics: DecisionMetrics,
}

pub struct GameOutcome {
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    /// Agent names from first to last place.
    pub finish_order: Vec<String>,
    pub completed: bool,
    pub moves: usize,
    pub deal: PositionSnapshot,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: String,
    pub agent: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: PlayerId,
    pub placement: usize,
    pub placement_score: f64,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn finalize(self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    deal_seed: u64,
    seating: Vec<SeatSnapshot>,
    finish_order: Vec<String>,
    completed: bool,
    moves: usize,
    results: Vec<SeatResultRow>,
    deal: PositionSnapshot,
}

#[derive(Serialize)]
struct SeatResultRow {
    seat: String,
    agent: String,
    placement: usize,
    placement_score: f64,
    decisions: u32,
    speed_ms_turn: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("{0}")]
    Config(#[from] ValidationError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("engine failed: {0}")]
    Engine(#[from] EngineError),
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("table seats {expected} players but {found} agents are configured")]
    SeatCount { expected: usize, found: usize },
    #[error("seat {index} references invalid agent index {agent_index}")]
    InvalidSeating { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid search parameter for agent '{name}': {message}")]
    InvalidSearchParam { name: String, message: String },
    #[error("invalid heuristic parameter for agent '{name}': {message}")]
    InvalidHeuristicParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Search(SearchOptions),
    Heuristic,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Search => {
                AgentImplementation::Search(SearchOptions::from_params(&config.name, &config.params)?)
            }
            AgentKind::Heuristic => {
                check_heuristic_params(&config.name, &config.params)?;
                AgentImplementation::Heuristic
            }
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn(&self, seat: PlayerId, deal_seed: u64) -> Box<dyn Agent> {
        match &self.implementation {
            AgentImplementation::Search(opts) => {
                Box::new(SearchAgent::new(self.name.clone(), opts.config_for(seat, deal_seed)))
            }
            AgentImplementation::Heuristic => Box::new(HeuristicAgent::new(self.name.clone())),
        }
    }
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(flatten)]
    search: SearchConfig,
    #[serde(default)]
    weights_file: Option<PathBuf>,
}

struct SearchOptions {
    config: SearchConfig,
}

impl SearchOptions {
    fn from_params(name: &str, params: &serde_yaml::Value) -> Result<Self, AgentError> {
        let params = if params.is_null() {
            serde_yaml::Value::Mapping(Default::default())
        } else {
            params.clone()
        };
        let parsed: SearchParams =
            serde_yaml::from_value(params).map_err(|err| AgentError::InvalidSearchParam {
                name: name.to_string(),
                message: err.to_string(),
            })?;

        let mut config = parsed.search;
        if let Some(path) = parsed.weights_file {
            config.weights = Weights::load_or_default(path);
        }
        config
            .validate()
            .map_err(|err| AgentError::InvalidSearchParam {
                name: name.to_string(),
                message: err.to_string(),
            })?;
        Ok(Self { config })
    }

    /// Per-game engine settings; every seat gets its own reproducible seed.
    fn config_for(&self, seat: PlayerId, deal_seed: u64) -> SearchConfig {
        let base = self.config.seed.unwrap_or(deal_seed);
        let seed = base ^ (seat.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        self.config.clone().with_seed(seed)
    }
}

fn check_heuristic_params(name: &str, params: &serde_yaml::Value) -> Result<(), AgentError> {
    if params.is_null() {
        return Ok(());
    }
    let mapping = params
        .as_mapping()
        .ok_or_else(|| AgentError::InvalidHeuristicParam {
            name: name.to_string(),
            message: "expected mapping for heuristic params".to_string(),
        })?;
    if let Some((key, _)) = mapping.iter().next() {
        return Err(AgentError::InvalidHeuristicParam {
            name: name.to_string(),
            message: format!("heuristic agents take no parameters (got {key:?})"),
        });
    }
    Ok(())
}
