//! CLI command definitions and output helpers

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// pomoedit - countdown timers declared in your task lists
#[derive(Parser, Debug)]
#[command(
    name = "pe",
    about = "Drive pomodoro-style timers from task lines in a text file",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a file and run the timer it declares
    ///
    /// Type `stop`, `retry`, `status` or `quit` on stdin while watching.
    Watch {
        /// File to watch
        file: PathBuf,

        /// Stream timer events to TCP listeners
        #[arg(short, long)]
        broadcast: bool,

        /// Address for the broadcast listener (implies --broadcast)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,

        /// Append broadcast events to this JSONL file
        #[arg(long, value_name = "PATH")]
        event_log: Option<PathBuf>,
    },

    /// Show the declaration found in a file, or why there is none
    Check {
        /// File to scan
        file: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Compile a timer expression and print its plan
    Plan {
        /// Timer expression, e.g. "(25m 5m)4"
        #[arg(allow_hyphen_values = true)]
        dsl: String,

        /// Repetitions for groups without a count
        #[arg(long)]
        loop_cap: Option<u32>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print events from a running broadcast listener
    Listen {
        /// Address of the broadcast listener
        #[arg(short, long, value_name = "ADDR")]
        addr: Option<String>,
    },
}

/// Get the path to the log file
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pomoedit")
        .join("logs")
        .join("pomoedit.log")
}

/// Generate the after_help text
pub fn generate_after_help() -> String {
    format!("Logs are written to: {}\n", get_log_path().display())
}

/// Render seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_clock(seconds: u64) -> String {
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Output format for check/plan commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
