use clap::Parser;
use std::path::PathBuf;

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Change default testing URL
    #[arg(short = 't', long = "target", value_name = "URL")]
    pub target: Option<String>,

    /// Show contents of record file
    #[arg(short = 's', long = "show")]
    pub show: bool,

    /// Read proxy list from file
    #[arg(short = 'l', long = "list", value_name = "filename", default_value = "proxylist.txt")]
    pub list: PathBuf,

    /// Save record on file
    #[arg(short = 'r', long = "record", value_name = "filename", default_value = "record.txt")]
    pub record: PathBuf,

    /// Socket timeout seconds
    #[arg(long = "timeout", default_value_t = 10)]
    pub timeout: u64,

    /// Log level
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,
}
