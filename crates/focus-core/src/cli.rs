use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// One `key=value` config override, from `--rc` or a bare `rc.key=value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcOverride {
    pub key: String,
    pub value: String,
}

impl RcOverride {
    pub fn into_pair(self) -> (String, String) {
        (self.key, self.value)
    }
}

impl std::str::FromStr for RcOverride {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        let key = key.trim().trim_start_matches("rc.");
        if key.is_empty() {
            return Err(anyhow!("override has no key: {s}"));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "focus",
    version,
    about = "Focus Board: a kanban board with task timers",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    /// More log output; repeat for debug and trace.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count)]
    pub quiet: u8,

    /// Config override, e.g. `--rc color=off`.
    #[arg(long = "rc", value_name = "KEY=VALUE", action = ArgAction::Append)]
    pub rc_overrides: Vec<RcOverride>,

    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Directory holding the board file.
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    /// Answer yes to every confirmation.
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub rest: Vec<OsString>,
}

/// Filter used when `RUST_LOG` is unset. Quiet wins over verbose.
pub fn log_level(verbose: u8, quiet: u8) -> &'static str {
    match (quiet, verbose) {
        (2.., _) => "error",
        (1, _) | (0, 0) => "warn",
        (0, 1) => "info",
        (0, 2) => "debug",
        (0, _) => "trace",
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level(verbose, quiet)))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Arguments with bare `rc.key=value` words lifted out.
#[derive(Debug, Clone, Default)]
pub struct SplitArgs {
    pub args: Vec<OsString>,
    pub overrides: Vec<RcOverride>,
}

/// Lifts `rc.key=value` words out of `raw` so clap never sees them. The
/// binary name stays first. A word like `rc.notes` without `=` is kept.
#[tracing::instrument(skip_all)]
pub fn split_rc_overrides(raw: &[OsString]) -> SplitArgs {
    let mut split = SplitArgs::default();

    for (index, arg) in raw.iter().enumerate() {
        let word = arg.to_string_lossy();
        if index > 0
            && word.starts_with("rc.")
            && let Ok(rc) = word.parse::<RcOverride>()
        {
            debug!(key = %rc.key, value = %rc.value, "captured rc override");
            split.overrides.push(rc);
            continue;
        }
        split.args.push(arg.clone());
    }

    split
}

/// The command word and its arguments after prefix expansion.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub command_args: Vec<String>,
}

impl Invocation {
    #[tracing::instrument(skip(cfg, rest))]
    pub fn parse(cfg: &Config, rest: Vec<OsString>) -> anyhow::Result<Self> {
        let mut words = rest
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned());

        let Some(first) = words.next() else {
            let command = cfg
                .get("default.command")
                .unwrap_or_else(|| "board".to_string());
            debug!(command = %command, "no explicit command, using default");
            return Ok(Self {
                command,
                command_args: Vec::new(),
            });
        };

        let known = crate::commands::known_command_names();
        let command = crate::commands::expand_command_abbrev(&first, &known)
            .ok_or_else(|| anyhow!("unknown or ambiguous command: {first}"))?;
        debug!(word = %first, expanded = %command, "resolved command word");

        Ok(Self {
            command: command.to_string(),
            command_args: words.collect(),
        })
    }
}
