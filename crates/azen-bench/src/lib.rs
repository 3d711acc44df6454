//! Self-play harness for the Azen search engine.

pub mod analytics;
pub mod config;
pub mod logging;
pub mod selfplay;
