//! A command monitor for emulated machines.
//!
//! The monitor reads one line at a time from an operator, looks the first word
//! up in a fixed table of commands and runs the matching handler: continue or
//! single-step the program, dump registers, scan guest memory, or quit.
//!
//! The machine being controlled sits behind the [`machine::Machine`] trait.
//! [`flat::FlatMachine`] is a small flat-RAM implementation used by the
//! `nemu-sdb` binary and the tests. [`Console`] owns the loop; input comes from
//! any [`io_adapters::LineReader`], normally the `rustyline` editor.

mod builtin;
pub mod color;
pub mod command;
pub mod console;
pub mod expr;
pub mod flat;
pub mod io_adapters;
pub mod log;
pub mod machine;
#[cfg(test)]
mod test_utils;

/// The monitor loop and its run mode.
pub use console::{Console, Mode};
