// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

use super::LogSink;
use arrayvec::ArrayString;
use core::fmt::{self, Arguments, Write};
use spin::mutex::SpinMutex;

/// A log sink keeping the most recent `LINES - 1` lines of at most `LINE_LEN` bytes each.
///
/// Longer lines are cut at a character boundary. Once full, each new line replaces the oldest.
pub struct MemoryLogger<const LINES: usize, const LINE_LEN: usize> {
    ring: SpinMutex<Ring<LINES, LINE_LEN>>,
}

struct Ring<const LINES: usize, const LINE_LEN: usize> {
    lines: [ArrayString<LINE_LEN>; LINES],
    /// Index of the line currently being written.
    current: usize,
    /// Number of completed lines. One slot always holds the line in progress.
    completed: usize,
}

impl<const LINES: usize, const LINE_LEN: usize> Ring<LINES, LINE_LEN> {
    fn push_str(&mut self, mut s: &str) {
        while let Some((line, rest)) = s.split_once('\n') {
            self.append(line);
            self.current = (self.current + 1) % LINES;
            self.lines[self.current].clear();
            self.completed = (self.completed + 1).min(LINES - 1);
            s = rest;
        }
        self.append(s);
    }

    fn append(&mut self, s: &str) {
        let line = &mut self.lines[self.current];
        let mut end = s.len().min(line.remaining_capacity());
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        line.push_str(&s[..end]);
    }
}

impl<const LINES: usize, const LINE_LEN: usize> Write for Ring<LINES, LINE_LEN> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

impl<const LINES: usize, const LINE_LEN: usize> MemoryLogger<LINES, LINE_LEN> {
    /// Creates an empty logger.
    pub const fn new() -> Self {
        Self {
            ring: SpinMutex::new(Ring {
                lines: [const { ArrayString::new_const() }; LINES],
                current: 0,
                completed: 0,
            }),
        }
    }

    /// Calls `f` with each completed line, oldest first.
    pub fn for_each_line(&self, mut f: impl FnMut(&str)) {
        let ring = self.ring.lock();
        let first = (ring.current + LINES - ring.completed) % LINES;
        for offset in 0..ring.completed {
            f(&ring.lines[(first + offset) % LINES]);
        }
    }

    /// Returns whether any completed line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        let mut found = false;
        self.for_each_line(|line| found |= line.contains(needle));
        found
    }

    /// Drops all lines.
    pub fn clear(&self) {
        let mut ring = self.ring.lock();
        ring.lines.iter_mut().for_each(ArrayString::clear);
        ring.current = 0;
        ring.completed = 0;
    }
}

impl<const LINES: usize, const LINE_LEN: usize> Default for MemoryLogger<LINES, LINE_LEN> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LINES: usize, const LINE_LEN: usize> LogSink for MemoryLogger<LINES, LINE_LEN> {
    fn write_fmt(&self, args: Arguments) {
        // The ring never fails.
        let _ = self.ring.lock().write_fmt(args);
    }
}
