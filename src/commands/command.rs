//! Command trait definition for CLI commands.
//!
//! Every `chunkfetch` subcommand implements [`Command`]; `enum_dispatch` routes the
//! parsed subcommand to its implementation.

use anyhow::Result;
use enum_dispatch::enum_dispatch;

/// Trait implemented by all chunkfetch CLI commands.
///
/// `command_line` is the full invocation, logged when the command starts.
#[enum_dispatch]
pub trait Command {
    #[allow(clippy::missing_errors_doc)]
    fn execute(&self, command_line: &str) -> Result<()>;
}
