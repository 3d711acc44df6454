use std::fs;
use std::path::Path;

use azen_bench::config::BenchmarkConfig;
use azen_bench::selfplay::{RunSummary, SelfPlayRunner};
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
table:
  players: 3
games:
  seed: 4242
  count: 2
agents:
  - name: "rules"
    kind: "heuristic"
  - name: "rules_b"
    kind: "heuristic"
  - name: "ismcts"
    kind: "search"
    params:
      iterations: 60
      workers: 2
      rollout_move_cap: 200
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
metrics:
  baseline: "rules"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("games.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_once(dir: &Path) -> RunSummary {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = SelfPlayRunner::new(config, outputs).expect("runner created");
    runner.run().expect("self-play completes")
}

/// Hash of the JSONL log with wall-clock timings zeroed.
fn normalized_hash(path: &Path) -> String {
    let jsonl = fs::read_to_string(path).expect("jsonl readable");
    let mut normalized = String::new();
    for line in jsonl.lines() {
        let mut value: serde_json::Value = serde_json::from_str(line).expect("row decodes to JSON");
        if let Some(results) = value.get_mut("results").and_then(|r| r.as_array_mut()) {
            for result in results {
                if let Some(speed) = result.get_mut("speed_ms_turn") {
                    *speed = serde_json::json!(0.0);
                }
            }
        }
        normalized.push_str(&serde_json::to_string(&value).expect("re-serialize normalized row"));
        normalized.push('\n');
    }

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[test]
fn selfplay_smoke_test_is_reproducible() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let first = run_once(first_dir.path());
    let second = run_once(second_dir.path());

    assert_eq!(first.games_played, 2);
    assert_eq!(first.rows_written, 2);
    assert!(first.summary_path.exists(), "summary markdown missing");
    assert!(first.telemetry_path.is_none());

    assert_eq!(
        normalized_hash(&first.jsonl_path),
        normalized_hash(&second.jsonl_path),
        "same seed should replay the same games"
    );
}

#[test]
fn rows_carry_full_rankings() {
    let dir = tempdir().expect("temp dir");
    let summary = run_once(dir.path());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    for (index, line) in jsonl.lines().enumerate() {
        let row: serde_json::Value = serde_json::from_str(line).expect("row decodes");
        assert_eq!(row["game_index"], index);
        assert_eq!(row["finish_order"].as_array().map(Vec::len), Some(3));

        let mut placements: Vec<u64> = row["results"]
            .as_array()
            .expect("results array")
            .iter()
            .filter_map(|result| result["placement"].as_u64())
            .collect();
        placements.sort_unstable();
        assert_eq!(placements, vec![0, 1, 2]);
    }

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| ismcts |"));
    assert!(markdown.contains("Baseline: rules"));
}
