// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

#[cfg(test)]
mod tests;

use serde::Serialize;

/// A 1-based line and column position within a source text.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Converts a byte offset into a [`Position`] against the given source text.
/// Offsets past the end of the text map to the position just after the last
/// character.
#[must_use]
pub fn position(contents: &str, offset: u32) -> Position {
    let offset = (offset as usize).min(contents.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, c) in contents.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }

    let column = u32::try_from(contents[line_start..offset].chars().count() + 1)
        .expect("column should fit into u32");
    Position { line, column }
}
