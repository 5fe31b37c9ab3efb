#![allow(dead_code)]

use kumiawase_core::{Piece, PieceDefinition, Point};

pub const CELL: f32 = 100.0;
pub const PAD: f32 = 20.0;

pub fn def(id: usize, col: i32, row: i32) -> PieceDefinition {
    PieceDefinition::new(id, col, row, CELL, CELL, PAD, [0; 4]).unwrap()
}

/// Piece whose core anchor sits at `anchor` in layer space.
pub fn piece_with_anchor(id: usize, col: i32, row: i32, anchor: Point) -> Piece {
    Piece::at(def(id, col, row), (anchor.0 - PAD, anchor.1 - PAD))
}

pub fn assert_close(actual: Point, expected: Point) {
    assert!(
        (actual.0 - expected.0).abs() < 1e-3 && (actual.1 - expected.1).abs() < 1e-3,
        "expected {expected:?}, got {actual:?}"
    );
}
