use crate::geometry::{add, sub, Bounds, Point};
use crate::piece::{Piece, PieceId};
use crate::rotation::QuarterTurn;
use crate::transform::ClusterTransform;

pub type ClusterId = usize;

/// Settle lifecycle of a cluster: `Idle -> Dragging -> Settling -> Idle`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClusterPhase {
    #[default]
    Idle,
    Dragging,
    Settling,
}

/// A rigid group of pieces sharing one transform.
#[derive(Clone, Debug)]
pub struct Cluster {
    id: ClusterId,
    pieces: Vec<Piece>,
    transform: ClusterTransform,
    phase: ClusterPhase,
}

impl Cluster {
    /// Empty cluster whose local space coincides with the layer.
    pub(crate) fn new(id: ClusterId) -> Self {
        Self {
            id,
            pieces: Vec::new(),
            transform: ClusterTransform::default(),
            phase: ClusterPhase::Idle,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece_ids(&self) -> impl Iterator<Item = PieceId> + '_ {
        self.pieces.iter().map(Piece::id)
    }

    pub fn piece(&self, id: PieceId) -> Option<&Piece> {
        self.pieces.iter().find(|piece| piece.id() == id)
    }

    pub fn contains(&self, id: PieceId) -> bool {
        self.piece(id).is_some()
    }

    pub fn transform(&self) -> &ClusterTransform {
        &self.transform
    }

    pub fn rotation(&self) -> QuarterTurn {
        self.transform.rotation
    }

    pub fn phase(&self) -> ClusterPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: ClusterPhase) {
        self.phase = phase;
    }

    /// Takes ownership of `piece`, whose local position must already be in
    /// this cluster's local space, then re-centres the pivot.
    pub fn add_piece(&mut self, piece: Piece) {
        self.pieces.push(piece);
        self.rebuild_pivot_from_bounds();
    }

    /// Moves the pivot to the centroid of the local bounds while keeping the
    /// world position of local (0,0) where it was.
    pub fn rebuild_pivot_from_bounds(&mut self) {
        let Some(bounds) = self.local_bounds() else {
            return;
        };
        let origin_before = self.transform.origin_world();
        self.transform.pivot = bounds.center();
        let origin_after = self.transform.origin_world();
        self.transform.position = add(
            self.transform.position,
            sub(origin_before, origin_after),
        );
    }

    /// Advances one quarter turn clockwise about the pivot, in place.
    pub fn rotate_cw(&mut self) {
        let pivot_before = self.transform.pivot_world();
        self.transform.rotation = self.transform.rotation.next_cw();
        let pivot_after = self.transform.pivot_world();
        self.transform.position = add(
            self.transform.position,
            sub(pivot_before, pivot_after),
        );
    }

    pub fn rotate_to(&mut self, target: QuarterTurn) -> u32 {
        let steps = self.rotation().steps_cw_to(target);
        for _ in 0..steps {
            self.rotate_cw();
        }
        steps
    }

    pub fn translate(&mut self, delta: Point) {
        self.transform.position = add(self.transform.position, delta);
    }

    pub fn local_bounds(&self) -> Option<Bounds> {
        let mut iter = self.pieces.iter().map(Piece::local_bounds);
        let first = iter.next()?;
        Some(iter.fold(first, |acc, bounds| acc.union(&bounds)))
    }

    pub fn core_origin_world(&self, id: PieceId) -> Option<Point> {
        self.piece(id)
            .map(|piece| piece.core_origin_global(&self.transform))
    }

    pub fn core_centers_world(&self) -> Vec<Point> {
        self.pieces
            .iter()
            .map(|piece| self.transform.apply(piece.core_center_local()))
            .collect()
    }

    /// Whether a layer-space point falls on any piece's core cell.
    pub fn hit_test(&self, point: Point) -> bool {
        let local = self.transform.to_local(point);
        self.pieces
            .iter()
            .any(|piece| piece.core_local_bounds().contains(local))
    }

    /// Detaches every piece, leaving the cluster empty.
    pub(crate) fn take_pieces(&mut self) -> Vec<Piece> {
        std::mem::take(&mut self.pieces)
    }

    /// Re-homes a piece that currently sits under `from` without moving it
    /// on screen. Both transforms must share the same rotation.
    pub(crate) fn adopt(&mut self, mut piece: Piece, from: &ClusterTransform) {
        let world = from.apply(piece.local_position());
        piece.set_local_position(self.transform.to_local(world));
        self.pieces.push(piece);
    }
}
