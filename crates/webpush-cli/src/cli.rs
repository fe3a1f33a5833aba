//! Clap derive structures for the `webpush` CLI.
//!
//! Only depends on clap and clap_complete so `build.rs` can include it to
//! render man pages.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// webpush -- inspect and exercise web push client instances
#[derive(Debug, Parser)]
#[command(
    name = "webpush",
    version,
    about = "Check web push client configuration and simulate its subscription lifecycle",
    long_about = "Validates push client instances, prints the worker script URL each one\n\
        registers, and runs the subscribe/unsubscribe lifecycle against an\n\
        in-memory browser to show the UI states and backend reports it produces.",
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
    #[arg(long, env = "WEBPUSH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Instance to use (defaults to `default_instance`)
    #[arg(long, short = 'i', env = "WEBPUSH_INSTANCE", global = true)]
    pub instance: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "WEBPUSH_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table / colored text (default, interactive)
    Table,
    /// Pretty-printed JSON (JSON lines for `simulate`)
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write a starter configuration file
    Init(InitArgs),

    /// Validate the configuration and show the resolved instance
    Check,

    /// Print the worker script URL of the instance
    #[command(alias = "url")]
    ScriptUrl,

    /// Decode an instance id from a worker script URL path segment
    DecodeId(DecodeIdArgs),

    /// Run the subscription lifecycle against an in-memory browser
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── init ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Identifier of the client instance
    #[arg(long)]
    pub id: String,

    /// VAPID public key (base64url)
    #[arg(long)]
    pub public_key: String,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

// ── decode-id ────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DecodeIdArgs {
    /// Percent-encoded path segment, e.g. `8f2c%2E3a1`
    pub segment: String,
}

// ── simulate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct SimulateArgs {
    /// Browser without service worker support
    #[arg(long)]
    pub no_worker: bool,

    /// Browser without push manager support
    #[arg(long)]
    pub no_push: bool,

    /// Answer given by the permission prompt
    #[arg(long, default_value = "granted", value_enum)]
    pub permission: PermissionAnswer,

    /// Start with a subscription left over from an earlier visit
    #[arg(long)]
    pub existing: bool,

    /// Make a platform call fail (repeatable)
    #[arg(long = "fail", value_enum)]
    pub faults: Vec<FaultArg>,

    /// Browser refuses to remove the subscription
    #[arg(long)]
    pub refuse_unsubscribe: bool,

    /// Number of button clicks
    #[arg(long, default_value = "1")]
    pub clicks: u32,

    /// Send the worker reload signal after the clicks
    #[arg(long)]
    pub reload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PermissionAnswer {
    Granted,
    Denied,
    /// Prompt dismissed without a decision
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FaultArg {
    Register,
    Update,
    Query,
    Subscribe,
    Unsubscribe,
    Prompt,
}

// ── completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
