//! Command dispatch: bridges CLI args -> config / core -> output formatting.

pub mod config_cmd;
pub mod ids;
pub mod simulate;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Init(args) => config_cmd::init(&args, global),
        Command::Check => config_cmd::check(global),
        Command::ScriptUrl => ids::script_url(global),
        Command::DecodeId(args) => ids::decode_id(&args, global),
        Command::Simulate(args) => simulate::handle(&args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
