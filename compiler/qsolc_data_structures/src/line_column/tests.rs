// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use super::{position, Position};

#[test]
fn start_of_text() {
    assert_eq!(position("set A;", 0), Position { line: 1, column: 1 });
}

#[test]
fn middle_of_first_line() {
    assert_eq!(position("set A;", 4), Position { line: 1, column: 5 });
}

#[test]
fn second_line() {
    assert_eq!(
        position("set A;\nset B;", 7),
        Position { line: 2, column: 1 }
    );
}

#[test]
fn offset_past_end_clamps() {
    assert_eq!(position("ab", 10), Position { line: 1, column: 3 });
}

#[test]
fn multibyte_counts_chars_not_bytes() {
    // "é" is two bytes but one column.
    assert_eq!(position("é x", 2), Position { line: 1, column: 2 });
}
