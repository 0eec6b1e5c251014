//! Handlers behind the entries of [`COMMANDS`](crate::command::COMMANDS).

use crate::color::Category;
use crate::command::{self, COMMANDS, CommandError, Context, Status};
use crate::machine::{AddressError, SessionState, Steps};
use tracing::debug;

fn first_token(args: Option<&str>) -> Option<&str> {
    args.and_then(|args| args.split_whitespace().next())
}

/// `help [name]`: list every command, or describe one.
pub(crate) fn help(ctx: &mut Context<'_>, args: Option<&str>) -> Result<Status, CommandError> {
    match first_token(args) {
        None => {
            for entry in COMMANDS {
                writeln!(ctx.out, "{} - {}", entry.name, entry.description)?;
            }
        }
        Some(name) => match command::find(name) {
            Some(entry) => writeln!(ctx.out, "{} - {}", entry.name, entry.description)?,
            None => writeln!(
                ctx.out,
                "{}",
                Category::Error.paint(CommandError::UnknownCommand(name.to_string()))
            )?,
        },
    }
    Ok(Status::Continue)
}

/// `c`: run until the machine stops by itself.
pub(crate) fn continue_execution(
    ctx: &mut Context<'_>,
    _args: Option<&str>,
) -> Result<Status, CommandError> {
    ctx.machine
        .execute(Steps::UntilStop)
        .map_err(CommandError::Machine)?;
    Ok(Status::Continue)
}

/// `q`: end the session successfully.
pub(crate) fn quit(ctx: &mut Context<'_>, _args: Option<&str>) -> Result<Status, CommandError> {
    writeln!(ctx.out, "{}", Category::Status.paint("exited successfully"))?;
    ctx.machine.set_state(SessionState::Quit);
    Ok(Status::Stop)
}

/// `si [N]`: execute `N` steps, one when `N` is omitted.
pub(crate) fn step(ctx: &mut Context<'_>, args: Option<&str>) -> Result<Status, CommandError> {
    let count = match first_token(args) {
        None => 1,
        Some(token) => token
            .parse::<u64>()
            .map_err(|_| CommandError::InvalidArgument {
                command: "si",
                value: token.to_string(),
            })?,
    };
    ctx.machine
        .execute(Steps::Exactly(count))
        .map_err(CommandError::Machine)?;
    Ok(Status::Continue)
}

/// `info r|w`: print registers or watchpoints.
pub(crate) fn info(ctx: &mut Context<'_>, args: Option<&str>) -> Result<Status, CommandError> {
    match first_token(args) {
        None => {
            return Err(CommandError::MissingArgument {
                command: "info",
                what: "subcommand (r or w)",
            });
        }
        Some("r" | "reg" | "regs") => ctx.machine.display_registers(ctx.out)?,
        Some("w" | "watch") => writeln!(
            ctx.out,
            "{}",
            Category::Error.paint("watchpoints are not implemented yet")
        )?,
        Some(other) => writeln!(
            ctx.out,
            "{}",
            Category::Error.paint(format_args!("unknown info subcommand '{other}'"))
        )?,
    }
    Ok(Status::Continue)
}

/// `x N EXPR`: dump `N` bytes of guest memory starting at `EXPR`.
///
/// The whole range is translated before anything is printed, so a dump that
/// would leave mapped memory prints only the error.
pub(crate) fn examine(ctx: &mut Context<'_>, args: Option<&str>) -> Result<Status, CommandError> {
    let mut tokens = args.unwrap_or_default().split_whitespace();
    let count = tokens.next().ok_or(CommandError::MissingArgument {
        command: "x",
        what: "byte count N",
    })?;
    let expr = tokens.next().ok_or(CommandError::MissingArgument {
        command: "x",
        what: "address EXPR",
    })?;

    let count = count
        .parse::<usize>()
        .map_err(|_| CommandError::InvalidArgument {
            command: "x",
            value: count.to_string(),
        })?;
    let addr = ctx.evaluator.eval(expr)?;
    debug!(count, addr = format_args!("{addr:#x}"), "scanning guest memory");

    let bytes = ctx
        .machine
        .translate(addr)?
        .get(..count)
        .ok_or(AddressError::OutOfBounds { addr, len: count })?;

    writeln!(
        ctx.out,
        "{}",
        Category::Status.paint(format_args!("scan {count} bytes starting from {addr:#x}"))
    )?;
    for (offset, byte) in bytes.iter().enumerate() {
        let guest = addr.wrapping_add(offset as u32);
        writeln!(
            ctx.out,
            "{}",
            Category::Data.paint(format_args!("{guest:#x} : {byte:#04x}"))
        )?;
    }
    Ok(Status::Continue)
}
