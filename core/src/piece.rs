use std::fmt;

use crate::geometry::{add, Bounds, Point};
use crate::transform::ClusterTransform;

pub type PieceId = usize;

pub const DIR_UP: usize = 0;
pub const DIR_RIGHT: usize = 1;
pub const DIR_DOWN: usize = 2;
pub const DIR_LEFT: usize = 3;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PieceError {
    #[error("piece {id}: edge {side} has value {value}, expected -1, 0 or 1")]
    InvalidEdge { id: PieceId, side: usize, value: i8 },
    #[error("piece {id}: cell size {width}x{height} must be positive")]
    InvalidSize { id: PieceId, width: f32, height: f32 },
    #[error("piece {id}: pad {pad} must be finite and non-negative")]
    InvalidPad { id: PieceId, pad: f32 },
}

/// Logical grid cell. Displays as `"col,row"`, the registry key format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    pub col: i32,
    pub row: i32,
}

impl GridCoord {
    pub fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn offset(self, dcol: i32, drow: i32) -> Self {
        Self {
            col: self.col + dcol,
            row: self.row + drow,
        }
    }

    /// Grid neighbours in search order: `col-1`, `col+1`, `row-1`, `row+1`.
    pub fn neighbors(self) -> [GridCoord; 4] {
        [
            self.offset(-1, 0),
            self.offset(1, 0),
            self.offset(0, -1),
            self.offset(0, 1),
        ]
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.col, self.row)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Edge {
    Blank = -1,
    Flat = 0,
    Tab = 1,
}

impl Edge {
    pub fn sign(self) -> i8 {
        self as i8
    }

    pub fn negated(self) -> Edge {
        match self {
            Edge::Blank => Edge::Tab,
            Edge::Flat => Edge::Flat,
            Edge::Tab => Edge::Blank,
        }
    }

    pub fn from_sign(value: i8) -> Option<Edge> {
        match value {
            -1 => Some(Edge::Blank),
            0 => Some(Edge::Flat),
            1 => Some(Edge::Tab),
            _ => None,
        }
    }
}

/// Immutable geometry of one piece as produced by the generator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceDefinition {
    pub id: PieceId,
    pub col: i32,
    pub row: i32,
    pub piece_width: f32,
    pub piece_height: f32,
    pub pad: f32,
    /// Top, right, bottom, left.
    pub edges: [Edge; 4],
}

impl PieceDefinition {
    pub fn new(
        id: PieceId,
        col: i32,
        row: i32,
        piece_width: f32,
        piece_height: f32,
        pad: f32,
        edges: [i8; 4],
    ) -> Result<Self, PieceError> {
        let mut parsed = [Edge::Flat; 4];
        for (side, value) in edges.iter().copied().enumerate() {
            parsed[side] = Edge::from_sign(value).ok_or(PieceError::InvalidEdge { id, side, value })?;
        }
        if !(piece_width.is_finite() && piece_height.is_finite())
            || piece_width <= 0.0
            || piece_height <= 0.0
        {
            return Err(PieceError::InvalidSize {
                id,
                width: piece_width,
                height: piece_height,
            });
        }
        if !pad.is_finite() || pad < 0.0 {
            return Err(PieceError::InvalidPad { id, pad });
        }
        Ok(Self {
            id,
            col,
            row,
            piece_width,
            piece_height,
            pad,
            edges: parsed,
        })
    }

    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.col, self.row)
    }

    /// Padded silhouette size, tabs included.
    pub fn padded_size(&self) -> (f32, f32) {
        (
            self.piece_width + self.pad * 2.0,
            self.piece_height + self.pad * 2.0,
        )
    }
}

/// A piece placed in its owning cluster's local space.
#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    def: PieceDefinition,
    local: Point,
}

impl Piece {
    pub fn new(def: PieceDefinition) -> Self {
        Self {
            def,
            local: (0.0, 0.0),
        }
    }

    pub fn at(def: PieceDefinition, local: Point) -> Self {
        Self { def, local }
    }

    pub fn def(&self) -> &PieceDefinition {
        &self.def
    }

    pub fn id(&self) -> PieceId {
        self.def.id
    }

    pub fn coord(&self) -> GridCoord {
        self.def.coord()
    }

    pub fn local_position(&self) -> Point {
        self.local
    }

    pub(crate) fn set_local_position(&mut self, local: Point) {
        self.local = local;
    }

    /// Corner of the core cell in the parent's local space.
    pub fn core_origin_local(&self) -> Point {
        add(self.local, (self.def.pad, self.def.pad))
    }

    pub fn core_center_local(&self) -> Point {
        add(
            self.core_origin_local(),
            (self.def.piece_width * 0.5, self.def.piece_height * 0.5),
        )
    }

    /// Core anchor in the parent's world space. Tab geometry never moves it.
    pub fn core_origin_global(&self, parent: &ClusterTransform) -> Point {
        parent.apply(self.core_origin_local())
    }

    pub fn local_bounds(&self) -> Bounds {
        let (width, height) = self.def.padded_size();
        Bounds::from_origin_size(self.local, width, height)
    }

    pub fn core_local_bounds(&self) -> Bounds {
        Bounds::from_origin_size(
            self.core_origin_local(),
            self.def.piece_width,
            self.def.piece_height,
        )
    }
}
