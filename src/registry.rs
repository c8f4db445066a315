//! Proxy records, reconciliation against persisted state, and the probing pass.

use std::collections::HashSet;
use std::fmt::Write as _;

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::history::HistoryBuffer;
use crate::probe::{self, ProbeOutcome};

/// Fixed header written ahead of every record-file rewrite. Kept verbatim for
/// compatibility with existing record files.
pub const RECORD_HEADER: &str = "# This file is used to store the records of the proxies tested\n\
# Modifying this file directly is not recommended, as for it can affect the program's performance\n\n";

/// One proxy's identity plus its full measurement history.
#[derive(Debug, Clone)]
pub struct ProxyRecord {
    pub address: String,
    pub port: u16,
    pub history: HistoryBuffer,
}

impl ProxyRecord {
    /// The `address:port` key used for list/record matching.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Render the persisted-state line: identity followed by
    /// `sample:prediction` pairs, most recent first.
    pub fn to_line(&self) -> String {
        let mut line = self.identity();
        for (sample, prediction) in self.history.pairs() {
            let _ = write!(line, " {}:{}", sample, prediction);
        }
        line
    }
}

/// Split an `address:port` identity. Returns `None` for anything that does
/// not carry a non-empty address and a valid non-zero port.
pub fn parse_identity(s: &str) -> Option<(String, u16)> {
    let (address, port) = s.rsplit_once(':')?;
    if address.is_empty() {
        return None;
    }
    let port: u16 = port.parse().ok()?;
    if port == 0 {
        return None;
    }
    Some((address.to_string(), port))
}

/// Parse one persisted record line into its identity and history pairs,
/// most recent first. Any malformed token drops the whole entry.
pub fn parse_record_line(line: &str) -> Option<(String, Vec<(f64, f64)>)> {
    let mut tokens = line.split_whitespace();
    let identity = tokens.next()?;
    parse_identity(identity)?;
    let mut pairs = Vec::new();
    for token in tokens {
        let (sample, prediction) = token.split_once(':')?;
        pairs.push((sample.parse().ok()?, prediction.parse().ok()?));
    }
    Some((identity.to_string(), pairs))
}

fn is_content(line: &str) -> bool {
    !line.is_empty() && !line.starts_with('#')
}

/// The full set of proxies under test for one pass.
#[derive(Debug)]
pub struct Registry {
    records: Vec<ProxyRecord>,
}

impl Registry {
    /// Match the proxy list against previously persisted records.
    ///
    /// Persisted records whose identity appears in the list carry their
    /// history over, in record-file order; list entries without a persisted
    /// match follow with empty history, in first-seen list order. Persisted
    /// entries absent from the list are discarded, as are malformed lines.
    pub fn reconcile(list_lines: &[String], record_lines: &[String], cfg: &Config) -> Result<Self> {
        let mut pending: Vec<String> = Vec::new();
        let mut pending_set: HashSet<String> = HashSet::new();
        for line in list_lines.iter().map(|l| l.trim()).filter(|l| is_content(l)) {
            if parse_identity(line).is_none() {
                warn!(entry = line, "skipping malformed proxy list entry");
                continue;
            }
            if pending_set.insert(line.to_string()) {
                pending.push(line.to_string());
            }
        }
        if pending.is_empty() {
            bail!("proxy list {} is empty", cfg.proxy_list.display());
        }

        let mut records = Vec::with_capacity(pending.len());
        for line in record_lines.iter().map(|l| l.trim()).filter(|l| is_content(l)) {
            let Some((identity, pairs)) = parse_record_line(line) else {
                warn!(line, "skipping malformed record line");
                continue;
            };
            if !pending_set.remove(&identity) {
                continue;
            }
            // parse_record_line already validated the identity.
            let (address, port) = parse_identity(&identity).unwrap();
            records.push(ProxyRecord {
                address,
                port,
                history: HistoryBuffer::from_pairs(pairs, cfg.buffer_length, cfg.ma_period),
            });
        }

        for identity in pending.iter().filter(|id| pending_set.contains(*id)) {
            let (address, port) = parse_identity(identity).unwrap();
            records.push(ProxyRecord {
                address,
                port,
                history: HistoryBuffer::new(cfg.buffer_length, cfg.ma_period),
            });
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[ProxyRecord] {
        &self.records
    }

    /// Probe every record once, strictly in order, appending each outcome to
    /// its history and printing one summary line per proxy.
    pub async fn run_pass(&mut self, cfg: &Config) {
        for record in &mut self.records {
            let outcome =
                probe::probe(&record.address, record.port, &cfg.target, cfg.timeout).await;
            if let ProbeOutcome::Down(reason) = outcome {
                debug!(proxy = %record.identity(), %reason, "probe outage");
            }
            record.history.append(outcome.sample());
            if cfg.show_records {
                println!("{}", record.to_line());
            } else {
                let (sample, prediction) = record.history.latest().unwrap_or((0.0, 0.0));
                println!("{} {}:{}", record.identity(), sample, prediction);
            }
        }
        info!(proxies = self.records.len(), "pass complete");
    }

    /// Render the full persisted-state file contents for this registry.
    pub fn serialize(&self) -> String {
        let mut out = String::from(RECORD_HEADER);
        for record in &self.records {
            out.push_str(&record.to_line());
            out.push('\n');
        }
        out
    }
}
