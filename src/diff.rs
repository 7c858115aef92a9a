//! Incremental terminal redraw.
//!
//! After every update the cursor rests at column 1 of the row just below the
//! last written line. The next update moves back up over the previous frame,
//! skips rows that did not change, rewrites the ones that did and clears
//! whatever the new frame no longer covers.

use std::io::{self, Write};

use crate::cursor;

/// What a single update wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffOutcome {
    pub lines_written: usize,
    pub lines_skipped: usize,
    pub lines_cleared: usize,
    pub bytes: usize,
}

/// Write the sequence that turns `previous` (as currently displayed above the
/// cursor) into `next`.
pub fn incremental_update(
    out: &mut impl Write,
    previous: &[String],
    next: &[String],
) -> io::Result<DiffOutcome> {
    let mut outcome = DiffOutcome::default();
    if previous == next {
        outcome.lines_skipped = next.len();
        return Ok(outcome);
    }

    let mut buf = String::new();
    buf.push_str(&cursor::move_up_lines(previous.len()));

    let mut pending_skip = 0;
    for (row, line) in next.iter().enumerate() {
        if previous.get(row) == Some(line) {
            pending_skip += 1;
            outcome.lines_skipped += 1;
            continue;
        }
        buf.push_str(&cursor::move_down_lines(pending_skip));
        pending_skip = 0;
        buf.push_str(line);
        buf.push_str(cursor::clear_to_line_end());
        buf.push('\n');
        outcome.lines_written += 1;
    }
    buf.push_str(&cursor::move_down_lines(pending_skip));

    if previous.len() > next.len() {
        buf.push_str(cursor::clear_to_screen_end());
        outcome.lines_cleared = previous.len() - next.len();
    }

    out.write_all(buf.as_bytes())?;
    outcome.bytes = buf.len();
    Ok(outcome)
}

/// Same as [`incremental_update`], restricted to the lines that fit in a
/// terminal of `rows` rows. One row stays reserved for the resting cursor,
/// older lines scroll out of the compared window.
pub fn incremental_update_bounded(
    out: &mut impl Write,
    previous: &[String],
    next: &[String],
    rows: usize,
) -> io::Result<DiffOutcome> {
    let budget = rows.saturating_sub(1).max(1);
    incremental_update(out, tail(previous, budget), tail(next, budget))
}

fn tail(lines: &[String], budget: usize) -> &[String] {
    &lines[lines.len().saturating_sub(budget)..]
}

/// Holds the last emitted frame so each update diffs against what was
/// actually written.
#[derive(Debug, Default)]
pub struct DiffEngine {
    rows: Option<usize>,
    previous: Vec<String>,
}

impl DiffEngine {
    /// `rows` is the terminal height, or `None` when unknown (piped output).
    pub fn new(rows: Option<usize>) -> Self {
        Self {
            rows: rows.filter(|r| *r > 0),
            previous: Vec::new(),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(None)
    }

    pub fn bounded(rows: usize) -> Self {
        Self::new(Some(rows))
    }

    pub fn rows(&self) -> Option<usize> {
        self.rows
    }

    pub fn previous(&self) -> &[String] {
        &self.previous
    }

    pub fn update(&mut self, out: &mut impl Write, next: Vec<String>) -> io::Result<DiffOutcome> {
        let outcome = match self.rows {
            Some(rows) => incremental_update_bounded(out, &self.previous, &next, rows)?,
            None => incremental_update(out, &self.previous, &next)?,
        };
        self.previous = next;
        Ok(outcome)
    }
}
