//! ANSI colouring of console output by message category.

use std::fmt;

const FG_RED: &str = "\x1b[31m";
const FG_YELLOW: &str = "\x1b[33m";
const FG_MAGENTA: &str = "\x1b[35m";
const RESET: &str = "\x1b[0m";

/// Kind of message written to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Progress and session notices.
    Status,
    /// Failures and unsupported requests.
    Error,
    /// Values read out of the machine.
    Data,
}

impl Category {
    fn code(self) -> &'static str {
        match self {
            Category::Status => FG_YELLOW,
            Category::Error => FG_RED,
            Category::Data => FG_MAGENTA,
        }
    }

    /// Wrap `inner` in this category's colour.
    pub fn paint<T: fmt::Display>(self, inner: T) -> Painted<T> {
        Painted {
            category: self,
            inner,
        }
    }
}

/// A value that renders surrounded by its category's escape codes.
pub struct Painted<T> {
    category: Category,
    inner: T,
}

impl<T: fmt::Display> fmt::Display for Painted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category.code(), self.inner, RESET)
    }
}
