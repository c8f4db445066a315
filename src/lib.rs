//! Proxy latency measurement with moving-average forecasting.
//!
//! Each run probes every proxy on the list once through a timed HTTP fetch,
//! appends the measured throughput and its forecast to that proxy's bounded
//! history, and rewrites the record file with the updated state. A proxy
//! selector picks the best proxy from the latest forecasts; that part lives
//! elsewhere.

pub mod cli;
pub mod config;
pub mod history;
pub mod probe;
pub mod registry;
pub mod store;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::registry::Registry;

/// Run one full measurement pass.
pub fn run() -> Result<()> {
    let args = cli::Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt().with_env_filter(filter).init();
    let cfg = Config::from_cli(&args)?;
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async move { run_pass(&cfg).await })
}

/// Load inputs, reconcile, probe every proxy once, persist the result.
pub async fn run_pass(cfg: &Config) -> Result<()> {
    store::preflight(&cfg.proxy_list, false)?;
    store::preflight(&cfg.record_file, true)?;
    let list = store::read_lines(&cfg.proxy_list)?;
    let persisted = store::read_lines(&cfg.record_file)?;
    let mut registry = Registry::reconcile(&list, &persisted, cfg)?;
    registry.run_pass(cfg).await;
    store::write_records(&cfg.record_file, &registry.serialize())
}
