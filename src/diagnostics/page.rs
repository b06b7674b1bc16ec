// Copyright The Rusted Firmware-A Contributors.
//
// SPDX-License-Identifier: BSD-3-Clause

use arrayvec::ArrayString;
use core::fmt::{self, Arguments, Write};

/// Size of the buffer an attribute is shown into.
pub const PAGE_SIZE: usize = 4096;

/// The text of one attribute read.
///
/// Writes past the end are dropped, so that the text is at most `PAGE_SIZE - 1` bytes including
/// the final newline.
#[derive(Clone)]
pub struct Page {
    text: ArrayString<PAGE_SIZE>,
}

struct Truncating<'a>(&'a mut ArrayString<PAGE_SIZE>);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        // Keep room for the newline.
        let room = (PAGE_SIZE - 2).saturating_sub(self.0.len());
        let mut end = s.len().min(room);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        self.0.push_str(&s[..end]);
        Ok(())
    }
}

impl Page {
    /// Creates an empty page.
    pub const fn new() -> Self {
        Self {
            text: ArrayString::new_const(),
        }
    }

    /// Appends formatted text, dropping whatever does not fit.
    pub fn write_fmt(&mut self, args: Arguments) {
        // Truncating never fails.
        let _ = Truncating(&mut self.text).write_fmt(args);
    }

    /// Terminates the text with a newline.
    pub(super) fn finish(mut self) -> Self {
        // There is always room, as writes stop two bytes short of the end.
        let _ = self.text.try_push('\n');
        self
    }

    /// Returns the text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the length of the text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Returns whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}
