use crate::builtin;
use crate::expr::{Evaluator, ExprError};
use crate::machine::{AddressError, Machine};
use std::io::{self, Write};
use thiserror::Error;

/// What the console should do after a command returns.
///
/// Embedders that expect the classic signed status can use [`Status::as_raw`]:
/// non-negative keeps the loop running, negative ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Keep reading commands.
    Continue,
    /// End the session.
    Stop,
}

impl Status {
    /// Signed form of the status: `0` to continue, `-1` to stop.
    pub fn as_raw(self) -> i32 {
        match self {
            Status::Continue => 0,
            Status::Stop => -1,
        }
    }
}

/// Errors a command can report to the operator.
///
/// Everything except [`CommandError::Io`] is local to one input line: the
/// console prints it and reads the next line.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
    #[error("{command}: missing {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
    #[error("{command}: invalid argument '{value}'")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),
    #[error("{0:#}")]
    Machine(anyhow::Error),
    /// The console output itself failed; the session cannot go on.
    #[error("console output failed: {0}")]
    Io(#[from] io::Error),
}

/// Everything a handler may touch while it runs.
pub struct Context<'a> {
    pub machine: &'a mut dyn Machine,
    pub out: &'a mut dyn Write,
    pub evaluator: &'a Evaluator,
}

/// Signature shared by every command.
///
/// The second argument is the rest of the input line after the command name,
/// or `None` when nothing follows it.
pub type Handler = fn(&mut Context<'_>, Option<&str>) -> Result<Status, CommandError>;

/// One row of the command table.
#[derive(Debug, Clone, Copy)]
pub struct CommandEntry {
    /// Exact, case-sensitive name the operator types.
    pub name: &'static str,
    /// One-line help text.
    pub description: &'static str,
    pub handler: Handler,
}

/// All commands the console understands, in listing order.
pub static COMMANDS: &[CommandEntry] = &[
    CommandEntry {
        name: "help",
        description: "Display information about all supported commands",
        handler: builtin::help,
    },
    CommandEntry {
        name: "c",
        description: "Continue the execution of the program",
        handler: builtin::continue_execution,
    },
    CommandEntry {
        name: "q",
        description: "Exit NEMU",
        handler: builtin::quit,
    },
    CommandEntry {
        name: "si",
        description: "si N, run N steps, one by default",
        handler: builtin::step,
    },
    CommandEntry {
        name: "info",
        description: "info r or info w, print registers or watchpoints",
        handler: builtin::info,
    },
    CommandEntry {
        name: "x",
        description: "x N EXPR, scan N bytes of memory starting at EXPR",
        handler: builtin::examine,
    },
];

/// Look a command up by exact name. The first matching entry wins.
pub fn find(name: &str) -> Option<&'static CommandEntry> {
    COMMANDS.iter().find(|entry| entry.name == name)
}
