//! A flat-memory reference machine.
//!
//! [`FlatMachine`] maps one contiguous block of guest RAM at a fixed base
//! address. It "executes" by fetching little-endian 32-bit words at the PC and
//! stepping over them; an `ebreak` word halts the program with `a0` as its
//! result. Nothing is decoded. The machine gives the monitor something real to
//! drive from the command line and in tests.

use crate::machine::{AddressError, Machine, SessionState, Steps};
use anyhow::{Context, bail};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

pub const DEFAULT_MEM_BASE: u32 = 0x8000_0000;
pub const DEFAULT_MEM_SIZE: usize = 128 * 1024 * 1024;

/// Halts the program.
pub const EBREAK: u32 = 0x0010_0073;

const WATCHPOINT_SLOTS: usize = 32;

/// Loaded when no image is given on the command line.
const BUILTIN_IMAGE: [u32; 5] = [
    0x0000_0297, // auipc t0, 0
    0x0002_8823, // sb    zero, 16(t0)
    0x0102_c503, // lbu   a0, 16(t0)
    EBREAK,
    0xdead_beef,
];

const REG_NAMES: [&str; 32] = [
    "$0", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

const A0: usize = 10;

#[derive(Debug)]
pub struct FlatMachine {
    base: u32,
    ram: Vec<u8>,
    pc: u32,
    gpr: [u32; 32],
    state: SessionState,
    watch_slots: Option<usize>,
}

impl FlatMachine {
    /// Zeroed RAM of `size` bytes mapped at `base`, with the PC at `base`.
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            base,
            ram: vec![0; size],
            pc: base,
            gpr: [0; 32],
            state: SessionState::default(),
            watch_slots: None,
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Free watchpoint slots, once the registry is initialised.
    pub fn watch_slots(&self) -> Option<usize> {
        self.watch_slots
    }

    /// Copy `image` to the start of RAM. Returns the number of bytes loaded.
    pub fn load_image(&mut self, image: &[u8]) -> anyhow::Result<usize> {
        let ram_size = self.ram.len();
        let dest = self.ram.get_mut(..image.len()).with_context(|| {
            format!(
                "image of {} bytes does not fit in {ram_size} bytes of guest RAM",
                image.len()
            )
        })?;
        dest.copy_from_slice(image);
        Ok(image.len())
    }

    pub fn load_image_file(&mut self, path: &Path) -> anyhow::Result<usize> {
        let image = fs::read(path)
            .with_context(|| format!("failed to read image {}", path.display()))?;
        self.load_image(&image)
    }

    pub fn load_builtin_image(&mut self) -> anyhow::Result<usize> {
        let image: Vec<u8> = BUILTIN_IMAGE
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();
        self.load_image(&image)
    }

    fn fetch(&self, addr: u32) -> Result<u32, AddressError> {
        let word = self
            .translate(addr)?
            .first_chunk::<4>()
            .ok_or(AddressError::OutOfBounds { addr, len: 4 })?;
        Ok(u32::from_le_bytes(*word))
    }
}

impl Machine for FlatMachine {
    fn execute(&mut self, steps: Steps) -> anyhow::Result<()> {
        if self.state.is_finished() {
            bail!("program execution has ended; restart the monitor to run it again");
        }
        self.state = SessionState::Running;

        let budget = match steps {
            Steps::UntilStop => u64::MAX,
            Steps::Exactly(n) => n,
        };
        let mut executed = 0u64;
        while executed < budget {
            let pc = self.pc;
            let word = match self.fetch(pc) {
                Ok(word) => word,
                Err(err) => {
                    self.state = SessionState::Aborted { pc };
                    return Err(err).with_context(|| format!("instruction fetch at {pc:#x} failed"));
                }
            };
            executed += 1;

            if word == EBREAK {
                let halt_ret = self.gpr[A0];
                self.state = SessionState::Ended { pc, halt_ret };
                if halt_ret == 0 {
                    info!(pc = format_args!("{pc:#x}"), executed, "HIT GOOD TRAP");
                } else {
                    warn!(pc = format_args!("{pc:#x}"), halt_ret, "HIT BAD TRAP");
                }
                return Ok(());
            }
            self.pc = pc.wrapping_add(4);
        }

        self.state = SessionState::Stopped;
        debug!(executed, pc = format_args!("{:#x}", self.pc), "execution paused");
        Ok(())
    }

    fn display_registers(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{:<4} {:#010x}", "pc", self.pc)?;
        for (name, value) in REG_NAMES.iter().zip(self.gpr) {
            writeln!(out, "{name:<4} {value:#010x} {value}")?;
        }
        Ok(())
    }

    fn translate(&self, addr: u32) -> Result<&[u8], AddressError> {
        let view = addr
            .checked_sub(self.base)
            .and_then(|offset| self.ram.get(offset as usize..))
            .filter(|view| !view.is_empty())
            .ok_or(AddressError::Unmapped { addr })?;
        // RAM configured past 0xffffffff has no guest address.
        let addressable = ((u32::MAX - addr) as usize).saturating_add(1);
        Ok(&view[..view.len().min(addressable)])
    }

    fn state(&self) -> SessionState {
        self.state
    }

    fn set_state(&mut self, state: SessionState) {
        self.state = state;
    }

    fn init_watch_registry(&mut self) -> anyhow::Result<()> {
        if self.watch_slots.is_some() {
            bail!("watchpoint registry is already initialised");
        }
        self.watch_slots = Some(WATCHPOINT_SLOTS);
        debug!(slots = WATCHPOINT_SLOTS, "watchpoint registry ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = DEFAULT_MEM_BASE;

    fn builtin() -> FlatMachine {
        let mut machine = FlatMachine::new(BASE, 64);
        assert_eq!(machine.load_builtin_image().unwrap(), 20);
        machine
    }

    #[test]
    fn test_builtin_image_hits_good_trap() {
        let mut machine = builtin();
        machine.execute(Steps::UntilStop).unwrap();
        assert_eq!(
            machine.state(),
            SessionState::Ended {
                pc: BASE + 12,
                halt_ret: 0
            }
        );
        assert!(machine.state().is_good());
    }

    #[test]
    fn test_bounded_steps_pause() {
        let mut machine = builtin();
        machine.execute(Steps::Exactly(2)).unwrap();
        assert_eq!(machine.pc(), BASE + 8);
        assert_eq!(machine.state(), SessionState::Stopped);

        machine.execute(Steps::Exactly(0)).unwrap();
        assert_eq!(machine.pc(), BASE + 8);
    }

    #[test]
    fn test_execute_after_end_is_refused() {
        let mut machine = builtin();
        machine.execute(Steps::UntilStop).unwrap();
        assert!(machine.execute(Steps::Exactly(1)).is_err());
    }

    #[test]
    fn test_running_off_ram_aborts() {
        let mut machine = FlatMachine::new(BASE, 8);
        let err = machine.execute(Steps::UntilStop).unwrap_err();
        assert!(format!("{err:#}").contains("instruction fetch at 0x80000008 failed"));
        assert_eq!(machine.state(), SessionState::Aborted { pc: BASE + 8 });
        assert!(!machine.state().is_good());
    }

    #[test]
    fn test_translate_bounds() {
        let machine = builtin();
        assert_eq!(machine.translate(BASE).unwrap().len(), 64);
        assert_eq!(machine.translate(BASE + 12).unwrap()[..4], EBREAK.to_le_bytes());
        assert_eq!(
            machine.translate(BASE - 1),
            Err(AddressError::Unmapped { addr: BASE - 1 })
        );
        assert_eq!(
            machine.translate(BASE + 64),
            Err(AddressError::Unmapped { addr: BASE + 64 })
        );
    }

    #[test]
    fn test_translate_stops_at_top_of_address_space() {
        let machine = FlatMachine::new(0xffff_fff0, 32);
        assert_eq!(machine.translate(0xffff_fff0).unwrap().len(), 16);
        assert_eq!(machine.translate(0xffff_ffff).unwrap().len(), 1);
    }

    #[test]
    fn test_image_too_large() {
        let mut machine = FlatMachine::new(BASE, 4);
        let err = machine.load_image(&[0; 5]).unwrap_err();
        assert!(err.to_string().contains("does not fit"));
    }

    #[test]
    fn test_load_image_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0x13, 0x00, 0x00, 0x00]).unwrap();
        file.write_all(&EBREAK.to_le_bytes()).unwrap();
        file.flush().unwrap();

        let mut machine = FlatMachine::new(BASE, 16);
        assert_eq!(machine.load_image_file(file.path()).unwrap(), 8);
        machine.execute(Steps::UntilStop).unwrap();
        assert_eq!(
            machine.state(),
            SessionState::Ended {
                pc: BASE + 4,
                halt_ret: 0
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let mut machine = FlatMachine::new(BASE, 16);
        let err = machine
            .load_image_file(Path::new("/nonexistent/image.bin"))
            .unwrap_err();
        assert!(err.to_string().contains("failed to read image"));
    }

    #[test]
    fn test_display_registers() {
        let mut out = Vec::new();
        builtin().display_registers(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 33);
        assert!(text.starts_with("pc   0x80000000\n"));
        assert!(text.contains("a0   0x00000000 0\n"));
    }

    #[test]
    fn test_watch_registry_initialises_once() {
        let mut machine = builtin();
        assert_eq!(machine.watch_slots(), None);
        machine.init_watch_registry().unwrap();
        assert_eq!(machine.watch_slots(), Some(32));
        assert!(machine.init_watch_registry().is_err());
    }
}
