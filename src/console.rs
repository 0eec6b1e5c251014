use crate::color::Category;
use crate::command::{self, CommandError, Context, Status};
use crate::expr::Evaluator;
use crate::io_adapters::LineReader;
use crate::machine::Machine;
use anyhow::Context as _;
use std::io::Write;
use tracing::{debug, info};

/// Prompt shown before every interactive read.
pub const PROMPT: &str = "(nemu) ";

/// How the console gets its commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Prompt the operator and execute commands until `q` or end of input.
    #[default]
    Interactive,
    /// Run the program to completion once and leave without reading input.
    Batch,
}

/// Split a line into its command name and the rest of the line.
///
/// The rest starts after the first run of whitespace following the name and
/// is `None` when nothing but whitespace follows. Lines that are empty or all
/// whitespace yield `None`.
pub fn split_command(line: &str) -> Option<(&str, Option<&str>)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    let (name, rest) = match line.find(char::is_whitespace) {
        Some(end) => line.split_at(end),
        None => (line, ""),
    };
    let rest = rest.trim_start();
    Some((name, (!rest.is_empty()).then_some(rest)))
}

/// The monitor's read-dispatch-print loop.
///
/// A console owns the machine it controls and the sink it prints to. The mode
/// is fixed before [`Console::run`] is called; `run` consumes the console and
/// hands the machine back once the session is over.
///
/// Example
/// ```
/// use nemu_sdb::console::{Console, Mode};
/// use nemu_sdb::flat::FlatMachine;
/// use nemu_sdb::io_adapters::ScriptedLines;
/// use nemu_sdb::machine::Machine;
///
/// let mut machine = FlatMachine::new(0x8000_0000, 64);
/// machine.load_builtin_image().unwrap();
/// let mut out = Vec::new();
/// let console = Console::new(machine, &mut out, Mode::Interactive).unwrap();
/// let machine = console.run(&mut ScriptedLines::new(["si 2", "q"])).unwrap();
/// assert!(machine.state().is_good());
/// ```
pub struct Console<M, W> {
    machine: M,
    out: W,
    mode: Mode,
    evaluator: Evaluator,
}

impl<M: Machine, W: Write> Console<M, W> {
    /// Prepare a session: compiles the literal patterns and initialises the
    /// machine's watchpoint registry. Either failing aborts start-up.
    pub fn new(mut machine: M, out: W, mode: Mode) -> anyhow::Result<Self> {
        let evaluator = Evaluator::compile().context("failed to compile expression patterns")?;
        machine
            .init_watch_registry()
            .context("failed to initialise the watchpoint registry")?;
        Ok(Self {
            machine,
            out,
            mode,
            evaluator,
        })
    }

    /// Switch to batch mode. Only possible before the session starts.
    pub fn enable_batch_mode(&mut self) {
        self.mode = Mode::Batch;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// Run the session until `q`, end of input, or (in batch mode) the end of
    /// the single continue.
    ///
    /// Only a failure to read input or to write output is returned as an
    /// error; command failures are printed and the loop goes on.
    pub fn run(mut self, input: &mut dyn LineReader) -> anyhow::Result<M> {
        info!(mode = ?self.mode, "monitor session started");
        match self.mode {
            Mode::Batch => {
                self.dispatch("c")?;
            }
            Mode::Interactive => {
                while let Some(line) = input.read_line(PROMPT)? {
                    if line.trim_start().is_empty() {
                        continue;
                    }
                    input.add_history(&line);
                    if self.dispatch(&line)? == Status::Stop {
                        break;
                    }
                }
            }
        }
        self.out.flush().context("failed to flush console output")?;
        info!(state = ?self.machine.state(), "monitor session ended");
        Ok(self.machine)
    }

    /// Execute a single input line.
    ///
    /// Blank lines do nothing. Unknown commands and command failures are
    /// reported on the console and yield [`Status::Continue`].
    pub fn dispatch(&mut self, line: &str) -> anyhow::Result<Status> {
        let Some((name, args)) = split_command(line) else {
            return Ok(Status::Continue);
        };

        self.machine.drain_events();

        let result = match command::find(name) {
            Some(entry) => {
                debug!(command = name, args = ?args, "dispatching");
                let mut ctx = Context {
                    machine: &mut self.machine,
                    out: &mut self.out,
                    evaluator: &self.evaluator,
                };
                (entry.handler)(&mut ctx, args)
            }
            None => Err(CommandError::UnknownCommand(name.to_string())),
        };

        match result {
            Ok(status) => Ok(status),
            Err(CommandError::Io(err)) => Err(err).context("failed to write console output"),
            Err(err) => {
                debug!(command = name, error = %err, "command failed");
                writeln!(self.out, "{}", Category::Error.paint(&err))
                    .context("failed to write console output")?;
                Ok(Status::Continue)
            }
        }
    }
}
