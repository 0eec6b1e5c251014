use std::io::{self, Write};
use thiserror::Error;

/// How far a call to [`Machine::execute`] should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steps {
    /// Run until the machine stops on its own (halt, fault, breakpoint).
    UntilStop,
    /// Execute exactly this many steps unless the machine stops first.
    Exactly(u64),
}

/// Lifecycle of the emulated program as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Executing, or ready to execute.
    #[default]
    Running,
    /// Paused after a bounded run.
    Stopped,
    /// The program halted on its own with `halt_ret` as its result.
    Ended { pc: u32, halt_ret: u32 },
    /// Execution faulted at `pc`.
    Aborted { pc: u32 },
    /// The operator left the monitor with `q`.
    Quit,
}

impl SessionState {
    /// Whether the session finished in a way that counts as a clean exit.
    pub fn is_good(self) -> bool {
        match self {
            SessionState::Running | SessionState::Stopped | SessionState::Quit => true,
            SessionState::Ended { halt_ret, .. } => halt_ret == 0,
            SessionState::Aborted { .. } => false,
        }
    }

    /// Whether the program can no longer execute.
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            SessionState::Ended { .. } | SessionState::Aborted { .. } | SessionState::Quit
        )
    }
}

/// Guest to host translation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address {addr:#x} is not mapped")]
    Unmapped { addr: u32 },
    #[error("{len} bytes at {addr:#x} run past the end of mapped memory")]
    OutOfBounds { addr: u32, len: usize },
}

/// The emulator the monitor controls.
///
/// The console only drives the machine through this trait; it never looks at
/// registers or memory layout directly.
pub trait Machine {
    /// Run the program. Blocks until the requested steps are done or the
    /// machine stops.
    fn execute(&mut self, steps: Steps) -> anyhow::Result<()>;

    /// Write a human-readable register dump.
    fn display_registers(&self, out: &mut dyn Write) -> io::Result<()>;

    /// Host view of guest memory starting at `addr` and running to the end of
    /// the mapping that contains it.
    fn translate(&self, addr: u32) -> Result<&[u8], AddressError>;

    fn state(&self) -> SessionState;

    fn set_state(&mut self, state: SessionState);

    /// Set up the watchpoint pool. Called once before the first command.
    fn init_watch_registry(&mut self) -> anyhow::Result<()>;

    /// Flush input events queued by devices (e.g. a display window) before a
    /// command runs. Machines without such devices have nothing to do.
    fn drain_events(&mut self) {}
}
