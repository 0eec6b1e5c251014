use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Source of operator input lines.
pub trait LineReader {
    /// Show `prompt` and block for the next line.
    ///
    /// Returns `Ok(None)` once input is exhausted, which ends the session
    /// cleanly.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Remember `line` for later recall.
    fn add_history(&mut self, line: &str);
}

/// Terminal input with line editing and history, backed by `rustyline`.
pub struct Readline {
    editor: DefaultEditor,
}

impl Readline {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("failed to set up the line editor")?;
        Ok(Self { editor })
    }
}

impl LineReader for Readline {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            // Ctrl-C leaves the monitor like end of input does.
            Err(ReadlineError::Interrupted) => {
                debug!("input interrupted");
                Ok(None)
            }
            Err(err) => Err(err).context("failed to read operator input"),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            warn!(%err, "failed to record history entry");
        }
    }
}

/// Pre-recorded input, for tests and for driving the console from a program.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    history: Vec<String>,
    reads: usize,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Lines recorded through [`LineReader::add_history`], oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of times a line was requested, including the final one that
    /// found no input left.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl LineReader for ScriptedLines {
    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        self.reads += 1;
        Ok(self.lines.pop_front())
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}
