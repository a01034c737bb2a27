//! Line splitting with an exit line and an overall deadline.

use std::time::{Duration, Instant};

/// A firmware line equal to this ends the session.
pub const EXIT_LINE: &str = "exit";

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    ExitLine,
    Timeout,
}

pub struct LineMonitor {
    pending: Vec<u8>,
    deadline: Instant,
}

impl LineMonitor {
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            pending: Vec::new(),
            deadline: now + timeout,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    /// Hand every complete line in `bytes` to `on_line`, without its line
    /// ending. Returns [`Stop::ExitLine`] as soon as the exit line arrives;
    /// bytes after it are discarded.
    pub fn feed(&mut self, bytes: &[u8], mut on_line: impl FnMut(&str)) -> Option<Stop> {
        for &byte in bytes {
            if byte != b'\n' {
                self.pending.push(byte);
                continue;
            }

            let raw = std::mem::take(&mut self.pending);
            let text = String::from_utf8_lossy(&raw);
            let line = text.strip_suffix('\r').unwrap_or(&text);
            on_line(line);
            if line == EXIT_LINE {
                return Some(Stop::ExitLine);
            }
        }
        None
    }

    /// Bytes received since the last line ending.
    pub fn partial(&self) -> &[u8] {
        &self.pending
    }
}
