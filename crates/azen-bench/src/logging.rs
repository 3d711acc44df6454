//! JSON telemetry for self-play runs.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;

use crate::config::{LoggingConfig, ResolvedOutputs};

const TELEMETRY_FILE: &str = "telemetry.jsonl";
const LOGGED_CRATES: [&str; 2] = ["azen_bench", "azen_engine"];

/// Keeps the background writer alive; dropping it flushes pending lines.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Sends engine and harness events to `telemetry.jsonl` beside the summary.
/// `RUST_LOG` replaces the configured filter when set.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let telemetry_path = telemetry_path(outputs);
    let (writer, guard) = open_writer(&telemetry_path)?;
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => crate_filter(logging)?,
    };

    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .with_current_span(false)
        .with_writer(writer)
        .finish();

    // Tests may have installed a subscriber already.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

/// Where telemetry lands for these outputs.
pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        .join(TELEMETRY_FILE)
}

fn open_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("creating telemetry file at {}", path.display()))?;
    Ok(NonBlockingBuilder::default().lossy(false).finish(file))
}

/// Only this workspace's crates, at the configured level.
fn crate_filter(logging: &LoggingConfig) -> Result<EnvFilter> {
    let level = logging.level()?;
    let directives = LOGGED_CRATES
        .iter()
        .map(|name| format!("{name}={}", level.as_str().to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).with_context(|| format!("building log filter '{directives}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outputs(summary: &str) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: PathBuf::from("games.jsonl"),
            summary_md: PathBuf::from(summary),
        }
    }

    #[test]
    fn telemetry_sits_next_to_the_summary() {
        assert_eq!(
            telemetry_path(&outputs("bench/out/run/summary.md")),
            PathBuf::from("bench/out/run/telemetry.jsonl")
        );
        assert_eq!(
            telemetry_path(&outputs("summary.md")),
            PathBuf::from("./telemetry.jsonl")
        );
    }

    #[test]
    fn disabled_logging_installs_nothing() {
        let logging = LoggingConfig::default();
        let guard = init_logging(&logging, &outputs("unused/summary.md")).unwrap();
        assert!(guard.is_none());
    }

    #[test]
    fn filter_names_workspace_crates() {
        let logging = LoggingConfig {
            enable_structured: true,
            tracing_level: "debug".to_string(),
        };
        let filter = crate_filter(&logging).unwrap();
        let rendered = filter.to_string().to_ascii_lowercase();
        assert!(rendered.contains("azen_engine=debug"));
        assert!(rendered.contains("azen_bench=debug"));
    }
}
