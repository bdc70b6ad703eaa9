//! In-memory line buffer
//!
//! Keeps the most recent formatted lines for display or inspection.

use std::collections::VecDeque;
use std::sync::RwLock;

use super::Destination;
use crate::error::DestinationWriteError;

/// Thread-safe ring buffer of formatted lines
pub struct MemoryDestination {
    lines: RwLock<VecDeque<String>>,
    max_lines: usize,
}

impl MemoryDestination {
    /// Create a buffer that keeps at most `max_lines` lines
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: RwLock::new(VecDeque::with_capacity(max_lines.min(1024))),
            max_lines,
        }
    }

    /// Get all lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .read()
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Get the number of lines in the buffer
    pub fn len(&self) -> usize {
        self.lines.read().map(|l| l.len()).unwrap_or(0)
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.write() {
            lines.clear();
        }
    }
}

impl Destination for MemoryDestination {
    fn write_line(&self, line: &str) -> Result<(), DestinationWriteError> {
        if self.max_lines == 0 {
            return Ok(());
        }
        let mut lines = self
            .lines
            .write()
            .map_err(|_| DestinationWriteError::Poisoned)?;
        if lines.len() >= self.max_lines {
            lines.pop_front();
        }
        lines.push_back(line.to_string());
        Ok(())
    }
}
