use crate::machine::{AddressError, Machine, SessionState, Steps};
use regex::Regex;
use std::io::{self, Write};

/// Machine double that records what the console asked of it.
#[derive(Debug, Default)]
pub(crate) struct MockMachine {
    pub base: u32,
    pub memory: Vec<u8>,
    pub executions: Vec<Steps>,
    pub state: SessionState,
    pub watch_inits: usize,
    pub drained: usize,
    pub fail_execute: bool,
}

impl MockMachine {
    pub fn with_memory(base: u32, memory: &[u8]) -> Self {
        Self {
            base,
            memory: memory.to_vec(),
            ..Self::default()
        }
    }
}

impl Machine for MockMachine {
    fn execute(&mut self, steps: Steps) -> anyhow::Result<()> {
        self.executions.push(steps);
        if self.fail_execute {
            anyhow::bail!("instruction fetch failed");
        }
        Ok(())
    }

    fn display_registers(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "pc   0x80000000")
    }

    fn translate(&self, addr: u32) -> Result<&[u8], AddressError> {
        addr.checked_sub(self.base)
            .and_then(|offset| self.memory.get(offset as usize..))
            .ok_or(AddressError::Unmapped { addr })
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    fn init_watch_registry(&mut self) -> anyhow::Result<()> {
        self.watch_inits += 1;
        Ok(())
    }

    fn drain_events(&mut self) {
        self.drained += 1;
    }
}

/// Console output with the colour escapes removed.
pub(crate) fn plain(out: &[u8]) -> String {
    let escapes = Regex::new(r"\x1b\[[0-9;]*m").unwrap();
    escapes
        .replace_all(&String::from_utf8_lossy(out), "")
        .into_owned()
}
