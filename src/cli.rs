//! Command-line interface for the lookup service
//!
//! Provides argument parsing and subcommand handling for the server binary.

use clap::{Parser, Subcommand};

/// Instrumented demo lookup service
#[derive(Parser)]
#[command(name = "lookup-service")]
#[command(version)]
#[command(about = "Instrumented HTTP lookup service for users and notes")]
#[command(
    long_about = "Serves user and note lookups from an in-memory store and exposes \
    in-flight, conversion and latency metrics in Prometheus format at /metrics."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Config path used when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

impl Cli {
    /// Whether the config path is the implicit default
    ///
    /// A missing default file means "run with built-in defaults"; a missing
    /// explicitly named file is an error.
    pub fn uses_default_config(&self) -> bool {
        self.config == DEFAULT_CONFIG_PATH
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# Lookup Service Configuration
# ============================
#
# Every section is optional. Omitted values fall back to the defaults shown.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8080

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG overrides this when set
log_level = "info"

# ─────────────────────────────────────────────────────────────────────────────
# METRICS
# ─────────────────────────────────────────────────────────────────────────────
#
# Prometheus metrics are always available at /metrics on the server port.

[metrics]
# Prefix of every metric name (demo_requests_in_flight, ...)
namespace = "demo"

# Value of the `result` label on successful id conversions:
#   - "outcome": always "ok" (bounded cardinality)
#   - "raw_id": the id itself, one series per distinct id
label_policy = "outcome"

# What happens when a metric cannot be recorded:
#   - "warn": log, count in *_metrics_recording_failures_total, keep serving
#   - "panic": fail loudly (development only)
failure_policy = "warn"

# Request duration histogram upper bounds in seconds (+Inf is implicit)
# Defaults to the Prometheus client defaults when omitted
# duration_buckets = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
"#
}
