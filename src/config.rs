//! Runtime configuration, built once from the CLI and passed down explicitly.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::cli::Cli;
use crate::history::{BUFFER_LENGTH, MA_PERIOD};

pub const DEFAULT_TARGET: &str = "http://www.google.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Everything the pass needs to run. No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL fetched through each proxy.
    pub target: Url,
    /// Per-operation socket timeout.
    pub timeout: Duration,
    /// Sample/prediction pairs kept per proxy.
    pub buffer_length: usize,
    /// Moving-average interval.
    pub ma_period: usize,
    pub proxy_list: PathBuf,
    pub record_file: PathBuf,
    /// Print full history lines instead of the latest pair.
    pub show_records: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: Url::parse(DEFAULT_TARGET).expect("default target URL is valid"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            buffer_length: BUFFER_LENGTH,
            ma_period: MA_PERIOD,
            proxy_list: PathBuf::from("proxylist.txt"),
            record_file: PathBuf::from("record.txt"),
            show_records: false,
        }
    }
}

impl Config {
    /// Merge CLI options over the defaults. A target that does not parse as
    /// an URL is a configuration error.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(target) = &cli.target {
            cfg.target = Url::parse(target).with_context(|| format!("invalid target URL {}", target))?;
        }
        cfg.timeout = Duration::from_secs(cli.timeout);
        cfg.proxy_list = cli.list.clone();
        cfg.record_file = cli.record.clone();
        cfg.show_records = cli.show;
        Ok(cfg)
    }
}
