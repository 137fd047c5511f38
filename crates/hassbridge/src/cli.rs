//! Clap derive structures for the `hassbridge` CLI.
//!
//! Every engine command works offline against a registry snapshot file;
//! no automation-platform connection is made.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hassbridge_core::TemperatureUnit;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hassbridge -- expose Home Assistant entities as Matter devices
#[derive(Debug, Parser)]
#[command(
    name = "hassbridge",
    version,
    about = "Inspect how Home Assistant entities are bridged to Matter",
    long_about = "Classifies Home Assistant entities into Matter device types and clusters,\n\
        composes them into bridged devices, and translates protocol commands\n\
        and attribute writes into Home Assistant service calls.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HASSBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HASSBRIDGE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Merge child endpoints into the root when no cluster collides
    #[arg(long, global = true)]
    pub remap: bool,

    /// Temperature unit for entities that report none (c, f)
    #[arg(long, global = true)]
    pub unit: Option<TemperatureUnit>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Yaml,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

// ── Command Tree ─────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compose bridged devices from a snapshot and show their endpoints
    #[command(alias = "c")]
    Compose(ComposeArgs),

    /// Show how each entity in a snapshot classifies
    Classify(SnapshotArgs),

    /// Translate a protocol command into a service call
    #[command(name = "command", alias = "cmd")]
    Invoke(InvokeArgs),

    /// Translate a protocol attribute write into a service call
    Write(WriteArgs),

    /// Replay automation events and show the attribute updates they cause
    Replay(ReplayArgs),

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Snapshot-driven commands ─────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Registry snapshot (JSON)
    pub snapshot: PathBuf,
}

#[derive(Debug, Args)]
pub struct ComposeArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Only show this device
    #[arg(long, short = 'd')]
    pub device: Option<String>,
}

/// Addresses one endpoint of one composed device.
#[derive(Debug, Args)]
pub struct TargetArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// Device name
    #[arg(long, short = 'd')]
    pub device: String,

    /// Endpoint name (empty for the root endpoint)
    #[arg(long, short = 'e', default_value = "")]
    pub endpoint: String,

    /// Cluster name (e.g. onOff, levelControl)
    #[arg(long)]
    pub cluster: String,
}

#[derive(Debug, Args)]
pub struct InvokeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Command name (e.g. on, moveToLevel)
    pub command: String,

    /// Command request payload (JSON)
    #[arg(long, default_value = "{}")]
    pub payload: String,
}

#[derive(Debug, Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Attribute name (e.g. occupiedHeatingSetpoint)
    pub attribute: String,

    /// New attribute value (JSON)
    pub new: String,

    /// Previous attribute value (JSON)
    #[arg(long, default_value = "null")]
    pub old: String,
}

#[derive(Debug, Args)]
pub struct ReplayArgs {
    #[command(flatten)]
    pub source: SnapshotArgs,

    /// JSON array of automation events
    pub events: PathBuf,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
