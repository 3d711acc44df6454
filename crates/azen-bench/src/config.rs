//! YAML description of a self-play run.

use azen_core::model::table::{DEFAULT_HAND_SIZE, TableConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

const DEFAULT_PLAYERS: usize = 4;
const DEFAULT_MOVE_LIMIT: usize = 600;
const DEFAULT_LATENCY_BUDGET_MS: u64 = 1_200;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    #[serde(default)]
    pub table: TableSection,
    pub games: GamesConfig,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Reads and validates a run description.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            source,
            path: path.clone(),
        })?;
        let mut cfg: BenchmarkConfig = match serde_yaml::from_str(&text) {
            Ok(cfg) => cfg,
            Err(source) => return Err(ConfigError::Parse { source, path }),
        };
        match cfg.validate() {
            Ok(()) => Ok(cfg),
            Err(source) => Err(ConfigError::Invalid { path, source }),
        }
    }

    /// Checks every section; also fills empty agent params with an empty mapping.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        if self.run_id.trim().is_empty() || !is_identifier(&self.run_id, false) {
            return Err(invalid(
                "run_id",
                "run_id must be non-empty and use only letters, digits, '.', '_' or '-'",
            ));
        }
        let table = self.table.resolve()?;
        self.games.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.level()?;
        validate_agents(&mut self.agents, table.players)?;
        self.metrics.validate(&self.agents)
    }

    /// Output paths with every `{run_id}` substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: self.outputs.resolve(&self.run_id, &self.outputs.jsonl),
            summary_md: self.outputs.resolve(&self.run_id, &self.outputs.summary_md),
        }
    }
}

/// Table shape. Deck count follows the player count unless given.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TableSection {
    pub players: usize,
    pub decks: Option<usize>,
    pub hand_size: usize,
}

impl Default for TableSection {
    fn default() -> Self {
        Self {
            players: DEFAULT_PLAYERS,
            decks: None,
            hand_size: DEFAULT_HAND_SIZE,
        }
    }
}

impl TableSection {
    pub fn resolve(&self) -> Result<TableConfig, ValidationError> {
        let decks = match self.decks {
            Some(decks) => decks,
            None => TableConfig::for_players(self.players)
                .map_err(|err| invalid("table", err.to_string()))?
                .decks,
        };
        TableConfig::new(self.players, decks, self.hand_size)
            .map_err(|err| invalid("table", err.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub count: usize,
    /// Master seed for deal seeds; 0 when absent.
    pub seed: Option<u64>,
    #[serde(default = "default_move_limit")]
    pub move_limit: usize,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(invalid("games.count", "at least one game is required"));
        }
        if self.move_limit == 0 {
            return Err(invalid("games.move_limit", "move limit must be at least 1"));
        }
        Ok(())
    }
}

fn default_move_limit() -> usize {
    DEFAULT_MOVE_LIMIT
}

/// One seat's player. `params` is interpreted per `kind`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Search,
    Heuristic,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn resolve(&self, run_id: &str, template: &str) -> PathBuf {
        PathBuf::from(template.replace("{run_id}", run_id))
    }

    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (field, template) in [
            ("outputs.jsonl", &self.jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if template.trim().is_empty() {
                return Err(invalid(field, "path must not be empty"));
            }
            if self.resolve(run_id, template).file_name().is_none() {
                return Err(invalid(field, "path must name a file"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Agent the others are compared against; comparisons are skipped when unset.
    pub baseline: Option<String>,
    /// Average per-decision latency above which an agent is flagged.
    pub latency_budget_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            baseline: None,
            latency_budget_ms: DEFAULT_LATENCY_BUDGET_MS,
        }
    }
}

impl MetricsConfig {
    fn validate(&self, agents: &[AgentConfig]) -> Result<(), ValidationError> {
        if let Some(baseline) = self.baseline.as_ref()
            && !agents.iter().any(|agent| &agent.name == baseline)
        {
            return Err(invalid(
                "metrics.baseline",
                format!("baseline agent '{baseline}' is not one of the agents"),
            ));
        }
        if self.latency_budget_ms == 0 {
            return Err(invalid(
                "metrics.latency_budget_ms",
                "latency budget must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Structured JSON telemetry is off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub enable_structured: bool,
    /// `trace`, `debug`, `info`, `warn` or `error`; `info` when blank.
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Result<Level, ValidationError> {
        let text = self.tracing_level.trim();
        if text.is_empty() {
            return Ok(Level::INFO);
        }
        Level::from_str(text).map_err(|_| {
            invalid(
                "logging.tracing_level",
                format!("unknown tracing level '{text}'"),
            )
        })
    }
}

fn validate_agents(agents: &mut [AgentConfig], seats: usize) -> Result<(), ValidationError> {
    if agents.len() != seats {
        return Err(invalid(
            "agents",
            format!("table has {seats} seats but {} agents are listed", agents.len()),
        ));
    }

    let mut names = HashSet::new();
    for (index, agent) in agents.iter_mut().enumerate() {
        if agent.name.trim().is_empty() || !is_identifier(&agent.name, true) {
            return Err(invalid(
                format!("agents[{index}].name"),
                "agent names use only letters, digits, '.', '_', '-' or '/'",
            ));
        }
        if !names.insert(agent.name.clone()) {
            return Err(invalid(
                "agents",
                format!("agent name '{}' is listed twice", agent.name),
            ));
        }
        if agent.params.is_null() {
            agent.params = serde_yaml::Value::Mapping(Default::default());
        }
    }
    Ok(())
}

fn is_identifier(text: &str, allow_slash: bool) -> bool {
    text.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') || (allow_slash && c == '/')
    })
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.into(),
        message: message.into(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "stage0_smoke"
table:
  players: 3
games:
  seed: 123
  count: 16
agents:
  - name: "ismcts"
    kind: "search"
    params:
      iterations: 500
      workers: 1
  - name: "rules"
    kind: "heuristic"
  - name: "rules_b"
    kind: "heuristic"
outputs:
  jsonl: "bench/out/{run_id}/games.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
metrics:
  baseline: "rules"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    fn failing_field(yaml: &str) -> String {
        match parse(yaml).validate() {
            Err(ValidationError::InvalidField { field, .. }) => field,
            Ok(()) => panic!("configuration unexpectedly valid"),
        }
    }

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert_eq!(cfg.games.move_limit, DEFAULT_MOVE_LIMIT);
        assert_eq!(cfg.metrics.latency_budget_ms, DEFAULT_LATENCY_BUDGET_MS);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level().unwrap(), Level::DEBUG);
        assert!(cfg.agents[1].params.is_mapping());

        let table = cfg.table.resolve().expect("table");
        assert_eq!((table.players, table.decks, table.hand_size), (3, 1, 18));

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/stage0_smoke/games.jsonl")
        );
    }

    #[test]
    fn sections_fall_back_to_defaults() {
        let yaml = BASIC_YAML
            .replace("table:\n  players: 3\n", "")
            .replace("  - name: \"rules_b\"\n    kind: \"heuristic\"\n", "  - name: \"rules_b\"\n    kind: \"heuristic\"\n  - name: \"rules_c\"\n    kind: \"heuristic\"\n");
        let mut cfg = parse(&yaml);
        cfg.validate().expect("validate");
        assert_eq!(cfg.table, TableSection::default());
        assert_eq!(cfg.table.resolve().expect("table").decks, 2);
    }

    #[test]
    fn rejects_bad_fields() {
        let cases = [
            (BASIC_YAML.replace("baseline: \"rules\"", "baseline: \"nobody\""), "metrics.baseline"),
            (BASIC_YAML.replace("rules_b", "rules"), "agents"),
            (BASIC_YAML.replace("players: 3", "players: 4"), "agents"),
            (BASIC_YAML.replace("players: 3", "players: 3\n  hand_size: 30"), "table"),
            (BASIC_YAML.replace("stage0_smoke", "stage 0 smoke"), "run_id"),
            (BASIC_YAML.replace("count: 16", "count: 0"), "games.count"),
            (BASIC_YAML.replace("\"debug\"", "\"chatty\""), "logging.tracing_level"),
            (BASIC_YAML.replace("name: \"rules\"", "name: \"ru les\""), "agents[1].name"),
        ];
        for (yaml, field) in cases {
            assert_eq!(failing_field(&yaml), field);
        }
    }

    #[test]
    fn blank_level_means_info() {
        let logging = LoggingConfig {
            enable_structured: true,
            tracing_level: "  ".to_string(),
        };
        assert_eq!(logging.level().unwrap(), Level::INFO);
    }

    #[test]
    fn outputs_resolve_template_multiple_occurrences() {
        let yaml = BASIC_YAML.replace(
            "bench/out/{run_id}/summary.md",
            "bench/out/{run_id}/{run_id}/summary.md",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("valid");
        assert_eq!(
            cfg.resolved_outputs().summary_md,
            PathBuf::from("bench/out/stage0_smoke/stage0_smoke/summary.md")
        );
    }
}
