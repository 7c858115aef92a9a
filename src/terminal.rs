//! Terminal capability boundary: size queries and one-time priming.

use std::io::{self, IsTerminal};

use crate::error::Result;
#[cfg(windows)]
use crate::error::ScopeError;

/// Terminal dimensions; `None` when unknown (not a terminal, redirected, or
/// the query failed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminalSize {
    pub columns: Option<u16>,
    pub rows: Option<u16>,
}

impl TerminalSize {
    pub const UNKNOWN: Self = Self {
        columns: None,
        rows: None,
    };

    pub const fn new(columns: u16, rows: u16) -> Self {
        Self {
            columns: Some(columns),
            rows: Some(rows),
        }
    }
}

/// Source of terminal capabilities for the interactive renderer.
pub trait TerminalAccess: Send + Sync {
    fn size(&self) -> TerminalSize;

    /// Platform setup needed before escape sequences are interpreted. A no-op
    /// where nothing is required.
    fn prepare(&self) -> Result<()> {
        Ok(())
    }
}

/// Queries the process's stdout through crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermTerminal;

impl TerminalAccess for CrosstermTerminal {
    fn size(&self) -> TerminalSize {
        if !io::stdout().is_terminal() {
            return TerminalSize::UNKNOWN;
        }
        match crossterm::terminal::size() {
            Ok((columns, rows)) if columns > 0 && rows > 0 => TerminalSize::new(columns, rows),
            _ => TerminalSize::UNKNOWN,
        }
    }

    /// Enables virtual terminal processing on Windows consoles.
    #[cfg(windows)]
    fn prepare(&self) -> Result<()> {
        if crossterm::ansi_support::supports_ansi() {
            Ok(())
        } else {
            Err(ScopeError::Terminal(
                "virtual terminal processing unavailable".to_string(),
            ))
        }
    }
}

/// Fixed answer, for redirected output and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedTerminal {
    size: TerminalSize,
}

impl FixedTerminal {
    pub fn new(size: TerminalSize) -> Self {
        Self { size }
    }

    pub fn unknown() -> Self {
        Self::new(TerminalSize::UNKNOWN)
    }
}

impl TerminalAccess for FixedTerminal {
    fn size(&self) -> TerminalSize {
        self.size
    }
}
