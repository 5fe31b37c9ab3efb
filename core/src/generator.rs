//! Deterministic piece generation and initial scatter.

use crate::geometry::{Bounds, Point};
use crate::manager::ClusterManager;
use crate::piece::{Piece, PieceDefinition, PieceError, DIR_DOWN, DIR_LEFT, DIR_RIGHT, DIR_UP};
use crate::rotation::QuarterTurn;

const EDGE_SALT_HORIZONTAL: u32 = 0xED6E_0000;
const EDGE_SALT_VERTICAL: u32 = 0xED6E_8000;
const ROTATION_SALT: u32 = 0xC001;
const ORDER_SALT: u32 = 0xC0DE;

pub fn splitmix32(mut value: u32) -> u32 {
    value = value.wrapping_add(0x9E37_79B9);
    let mut z = value;
    z = (z ^ (z >> 16)).wrapping_mul(0x85EB_CA6B);
    z = (z ^ (z >> 13)).wrapping_mul(0xC2B2_AE35);
    z ^ (z >> 16)
}

/// Uniform in `[0, 1)`.
pub fn rand_unit(seed: u32, salt: u32) -> f32 {
    let mixed = splitmix32(seed ^ salt);
    (mixed >> 8) as f32 / ((1u32 << 24) as f32)
}

pub fn rand_range(seed: u32, salt: u32, min: f32, max: f32) -> f32 {
    min + (max - min) * rand_unit(seed, salt)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PuzzleLayout {
    pub cols: u32,
    pub rows: u32,
    pub piece_width: f32,
    pub piece_height: f32,
    /// Room reserved around each core cell for tabs.
    pub pad: f32,
}

impl PuzzleLayout {
    pub fn new(cols: u32, rows: u32, piece_width: f32, piece_height: f32) -> Self {
        Self {
            cols,
            rows,
            piece_width,
            piece_height,
            pad: piece_width.min(piece_height) * 0.2,
        }
    }

    pub fn total(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    pub fn image_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * self.piece_width,
            self.rows as f32 * self.piece_height,
        )
    }
}

fn edge_sign(seed: u32, salt: u32) -> i8 {
    if splitmix32(seed ^ salt) & 1 == 0 {
        1
    } else {
        -1
    }
}

/// Row-major definitions. Border sides are flat; a shared side gets a random
/// sign on one piece and its negation on the neighbour.
pub fn generate_definitions(
    layout: &PuzzleLayout,
    seed: u32,
) -> Result<Vec<PieceDefinition>, PieceError> {
    let cols = layout.cols as usize;
    let rows = layout.rows as usize;
    let mut defs = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let id = row * cols + col;
            let mut edges = [0i8; 4];
            if col + 1 < cols {
                edges[DIR_RIGHT] = edge_sign(seed, EDGE_SALT_HORIZONTAL.wrapping_add(id as u32));
            }
            if row + 1 < rows {
                edges[DIR_DOWN] = edge_sign(seed, EDGE_SALT_VERTICAL.wrapping_add(id as u32));
            }
            if col > 0 {
                let left: &PieceDefinition = &defs[id - 1];
                edges[DIR_LEFT] = -left.edges[DIR_RIGHT].sign();
            }
            if row > 0 {
                let up: &PieceDefinition = &defs[id - cols];
                edges[DIR_UP] = -up.edges[DIR_DOWN].sign();
            }
            defs.push(PieceDefinition::new(
                id,
                col as i32,
                row as i32,
                layout.piece_width,
                layout.piece_height,
                layout.pad,
                edges,
            )?);
        }
    }
    Ok(defs)
}

/// Local position of a piece in the assembled image.
pub fn solved_position(def: &PieceDefinition) -> Point {
    (
        def.col as f32 * def.piece_width - def.pad,
        def.row as f32 * def.piece_height - def.pad,
    )
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub piece: usize,
    /// Padded top-left corner in layer space.
    pub position: Point,
    pub rotation: QuarterTurn,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scatter {
    pub placements: Vec<Placement>,
    /// Piece ids, bottom to top.
    pub order: Vec<usize>,
}

impl Scatter {
    pub fn pieces(&self, defs: &[PieceDefinition]) -> Vec<Piece> {
        self.placements
            .iter()
            .filter_map(|placement| {
                defs.get(placement.piece)
                    .map(|def| Piece::at(*def, placement.position))
            })
            .collect()
    }

    /// Applies rotations and stacking to freshly created one-piece clusters.
    pub fn arrange(&self, manager: &mut ClusterManager) {
        for placement in &self.placements {
            let Some(cluster) = manager.cluster_of(placement.piece) else {
                continue;
            };
            for _ in 0..placement.rotation.index() {
                manager.rotate_cluster_cw(cluster);
            }
        }
        for piece in &self.order {
            if let Some(cluster) = manager.cluster_of(*piece) {
                manager.bring_to_front(cluster);
            }
        }
    }
}

/// Places every padded piece fully inside `area` (pinned to its min corner
/// when the area is too small) with a shuffled stacking order.
pub fn scatter(defs: &[PieceDefinition], seed: u32, area: Bounds, rotation_allowed: bool) -> Scatter {
    let mut placements = Vec::with_capacity(defs.len());
    for (index, def) in defs.iter().enumerate() {
        let (width, height) = def.padded_size();
        let max_x = (area.max_x - width).max(area.min_x);
        let max_y = (area.max_y - height).max(area.min_y);
        let salt = (index as u32) << 1;
        let position = (
            rand_range(seed, salt, area.min_x, max_x),
            rand_range(seed, salt + 1, area.min_y, max_y),
        );
        let rotation = if rotation_allowed {
            let roll = splitmix32(seed ^ ROTATION_SALT.wrapping_add(index as u32));
            QuarterTurn::from_index(roll % 4)
        } else {
            QuarterTurn::Deg0
        };
        placements.push(Placement {
            piece: def.id,
            position,
            rotation,
        });
    }

    let mut order: Vec<usize> = defs.iter().map(|def| def.id).collect();
    for i in (1..order.len()).rev() {
        let j = (rand_unit(seed, ORDER_SALT + i as u32) * (i as f32 + 1.0)) as usize;
        order.swap(i, j.min(i));
    }
    Scatter { placements, order }
}
