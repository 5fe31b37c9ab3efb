use std::collections::{HashMap, HashSet};

use tracing::{debug, info, trace};

use crate::cluster::{Cluster, ClusterId, ClusterPhase};
use crate::events::{PieceConnected, PuzzleCompleted, PuzzleEvent};
use crate::geometry::{add, distance, Point};
use crate::layer::{LayerTransform, PieceLayer};
use crate::piece::{GridCoord, Piece, PieceId};
use crate::rotation::{project_about, QuarterTurn};
use crate::rules::SnapRules;
use crate::settle::SettlePass;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("grid cell {coord} is claimed by pieces {first} and {second}")]
    DuplicateCoord {
        coord: GridCoord,
        first: PieceId,
        second: PieceId,
    },
    #[error("piece id {0} registered twice")]
    DuplicateId(PieceId),
    #[error("piece {id} at {coord} was never registered")]
    Unregistered { id: PieceId, coord: GridCoord },
    #[error("{missing} registered pieces were not handed to create_initial_clusters")]
    MissingPieces { missing: usize },
    #[error("clusters already created for this puzzle")]
    AlreadyBuilt,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MergeError {
    #[error("cluster {0} does not exist or was merged away")]
    UnknownCluster(ClusterId),
    #[error("clusters {a} ({a_rot:?}) and {b} ({b_rot:?}) are not at the same rotation")]
    RotationMismatch {
        a: ClusterId,
        a_rot: QuarterTurn,
        b: ClusterId,
        b_rot: QuarterTurn,
    },
}

/// Best pairing found by the candidate search. Anchors are global.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapCandidate {
    pub moving_piece: PieceId,
    pub static_piece: PieceId,
    pub static_cluster: ClusterId,
    pub target_rotation: QuarterTurn,
    pub moving_anchor: Point,
    pub target_anchor: Point,
    pub distance: f32,
}

/// Owns every cluster of one puzzle and the fixed grid registry.
pub struct ClusterManager {
    pub(crate) rules: SnapRules,
    pub(crate) layer: Box<dyn PieceLayer>,
    registry: HashMap<GridCoord, PieceId>,
    registered: HashMap<PieceId, GridCoord>,
    membership: HashMap<PieceId, ClusterId>,
    clusters: Vec<Option<Cluster>>,
    stacking: Vec<ClusterId>,
    cluster_count: usize,
    total_pieces: usize,
    built: bool,
    completed: bool,
    events: Vec<PuzzleEvent>,
    pub(crate) settles: HashMap<ClusterId, SettlePass>,
}

impl ClusterManager {
    pub fn new(rules: SnapRules) -> Self {
        Self::with_layer(rules, LayerTransform::default())
    }

    pub fn with_layer<L>(rules: SnapRules, layer: L) -> Self
    where
        L: PieceLayer + 'static,
    {
        Self {
            rules: rules.sanitized(),
            layer: Box::new(layer),
            registry: HashMap::new(),
            registered: HashMap::new(),
            membership: HashMap::new(),
            clusters: Vec::new(),
            stacking: Vec::new(),
            cluster_count: 0,
            total_pieces: 0,
            built: false,
            completed: false,
            events: Vec::new(),
            settles: HashMap::new(),
        }
    }

    /// Registers and clusters `pieces` in one go, one cluster per piece.
    pub fn with_pieces(rules: SnapRules, pieces: Vec<Piece>) -> Result<Self, RegistryError> {
        let mut manager = Self::new(rules);
        manager.register_pieces(&pieces)?;
        manager.create_initial_clusters(pieces)?;
        Ok(manager)
    }

    pub fn register_pieces(&mut self, pieces: &[Piece]) -> Result<(), RegistryError> {
        if self.built {
            return Err(RegistryError::AlreadyBuilt);
        }
        let mut registry = self.registry.clone();
        let mut registered = self.registered.clone();
        for piece in pieces {
            let coord = piece.coord();
            if registered.contains_key(&piece.id()) {
                return Err(RegistryError::DuplicateId(piece.id()));
            }
            if let Some(first) = registry.get(&coord) {
                return Err(RegistryError::DuplicateCoord {
                    coord,
                    first: *first,
                    second: piece.id(),
                });
            }
            registry.insert(coord, piece.id());
            registered.insert(piece.id(), coord);
        }
        self.registry = registry;
        self.registered = registered;
        self.total_pieces = self.registered.len();
        debug!(total_pieces = self.total_pieces, "pieces registered");
        Ok(())
    }

    /// Wraps every registered piece in its own cluster. A piece's local
    /// position is taken as its initial position in the pieces layer.
    pub fn create_initial_clusters(
        &mut self,
        pieces: Vec<Piece>,
    ) -> Result<Vec<ClusterId>, RegistryError> {
        if self.built {
            return Err(RegistryError::AlreadyBuilt);
        }
        for piece in &pieces {
            if self.registered.get(&piece.id()) != Some(&piece.coord()) {
                return Err(RegistryError::Unregistered {
                    id: piece.id(),
                    coord: piece.coord(),
                });
            }
        }
        let mut seen = HashSet::with_capacity(pieces.len());
        for piece in &pieces {
            if !seen.insert(piece.id()) {
                return Err(RegistryError::DuplicateId(piece.id()));
            }
        }
        if seen.len() != self.total_pieces {
            return Err(RegistryError::MissingPieces {
                missing: self.total_pieces - seen.len(),
            });
        }
        let mut ids = Vec::with_capacity(pieces.len());
        for piece in pieces {
            let id = self.clusters.len();
            self.membership.insert(piece.id(), id);
            let mut cluster = Cluster::new(id);
            cluster.add_piece(piece);
            self.clusters.push(Some(cluster));
            self.stacking.push(id);
            ids.push(id);
        }
        self.cluster_count = ids.len();
        self.built = true;
        debug!(clusters = self.cluster_count, "initial clusters created");
        Ok(ids)
    }

    pub fn rules(&self) -> &SnapRules {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: SnapRules) {
        self.rules = rules.sanitized();
    }

    pub fn layer(&self) -> &dyn PieceLayer {
        self.layer.as_ref()
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id).and_then(|entry| entry.as_ref())
    }

    pub(crate) fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.clusters.get_mut(id).and_then(|entry| entry.as_mut())
    }

    /// Live clusters in id order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> + '_ {
        self.clusters.iter().filter_map(|entry| entry.as_ref())
    }

    pub fn cluster_of(&self, piece: PieceId) -> Option<ClusterId> {
        self.membership.get(&piece).copied()
    }

    pub fn piece_at(&self, coord: GridCoord) -> Option<PieceId> {
        self.registry.get(&coord).copied()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    pub fn total_pieces(&self) -> usize {
        self.total_pieces
    }

    pub fn is_complete(&self) -> bool {
        self.cluster_count == 1 && self.total_pieces > 0
    }

    pub fn core_origin_global(&self, piece: PieceId) -> Option<Point> {
        let cluster = self.cluster(self.cluster_of(piece)?)?;
        cluster
            .core_origin_world(piece)
            .map(|local| self.layer.to_global(local))
    }

    pub fn pending_events(&self) -> &[PuzzleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PuzzleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn translate_cluster(&mut self, id: ClusterId, delta: Point) -> bool {
        match self.cluster_mut(id) {
            Some(cluster) => {
                cluster.translate(delta);
                true
            }
            None => false,
        }
    }

    pub fn rotate_cluster_cw(&mut self, id: ClusterId) -> Option<QuarterTurn> {
        let cluster = self.cluster_mut(id)?;
        cluster.rotate_cw();
        Some(cluster.rotation())
    }

    pub(crate) fn set_phase(&mut self, id: ClusterId, phase: ClusterPhase) -> bool {
        match self.cluster_mut(id) {
            Some(cluster) => {
                cluster.set_phase(phase);
                true
            }
            None => false,
        }
    }

    /// Bottom to top.
    pub fn stacking_order(&self) -> &[ClusterId] {
        &self.stacking
    }

    pub fn bring_to_front(&mut self, id: ClusterId) {
        if let Some(index) = self.stacking.iter().position(|entry| *entry == id) {
            let entry = self.stacking.remove(index);
            self.stacking.push(entry);
        }
    }

    /// Topmost cluster whose core cells contain the global point.
    pub fn pick_cluster(&self, global: Point) -> Option<ClusterId> {
        let local = self.layer.to_local(global);
        self.stacking
            .iter()
            .rev()
            .copied()
            .find(|id| {
                self.cluster(*id)
                    .map(|cluster| cluster.hit_test(local))
                    .unwrap_or(false)
            })
    }

    /// True when every registered piece sits in exactly one live cluster and
    /// the membership map and cluster count agree with it.
    pub fn check_partition(&self) -> bool {
        let mut owner: HashMap<PieceId, ClusterId> = HashMap::with_capacity(self.total_pieces);
        let mut live = 0usize;
        for cluster in self.clusters() {
            if cluster.is_empty() {
                return false;
            }
            live += 1;
            for piece in cluster.piece_ids() {
                if owner.insert(piece, cluster.id()).is_some() {
                    return false;
                }
                if self.membership.get(&piece) != Some(&cluster.id()) {
                    return false;
                }
            }
        }
        live == self.cluster_count
            && owner.len() == self.total_pieces
            && self.registered.keys().all(|id| owner.contains_key(id))
    }

    /// Scans every grid neighbour of every piece in `active` and returns the
    /// closest pairing with a different cluster, first found on ties.
    pub fn find_best_snap_candidate(&self, active: ClusterId) -> Option<SnapCandidate> {
        let moving = self.cluster(active)?;
        let mut best: Option<SnapCandidate> = None;
        for piece in moving.pieces() {
            let def = piece.def();
            for coord in piece.coord().neighbors() {
                let Some(static_piece) = self.piece_at(coord) else {
                    continue;
                };
                let Some(static_id) = self.cluster_of(static_piece) else {
                    continue;
                };
                if static_id == active {
                    continue;
                }
                let Some(target) = self.cluster(static_id) else {
                    continue;
                };
                if target.phase() != ClusterPhase::Idle {
                    trace!(cluster = static_id, "neighbour cluster is in motion, skipped");
                    continue;
                }
                let target_rotation = target.rotation();
                if moving.rotation() != target_rotation {
                    trace!(
                        moving_piece = piece.id(),
                        static_piece,
                        "rotation mismatch, candidate rejected"
                    );
                    continue;
                }
                let Some(static_anchor) = target.core_origin_world(static_piece) else {
                    continue;
                };
                let static_anchor = self.layer.to_global(static_anchor);
                let solved_offset = (
                    (def.col - coord.col) as f32 * def.piece_width,
                    (def.row - coord.row) as f32 * def.piece_height,
                );
                let expected = self
                    .layer
                    .vector_to_global(target_rotation.rotate(solved_offset));
                let target_anchor = add(static_anchor, expected);
                let current_anchor =
                    self.layer.to_global(piece.core_origin_global(moving.transform()));
                let moving_anchor = if moving.rotation() == target_rotation {
                    current_anchor
                } else {
                    let origin = self.layer.to_global(moving.transform().origin_world());
                    let turn = QuarterTurn::from_index(moving.rotation().steps_cw_to(target_rotation));
                    project_about(origin, current_anchor, turn)
                };
                let dist = distance(moving_anchor, target_anchor);
                let better = match &best {
                    Some(current) => dist < current.distance,
                    None => true,
                };
                if better {
                    best = Some(SnapCandidate {
                        moving_piece: piece.id(),
                        static_piece,
                        static_cluster: static_id,
                        target_rotation,
                        moving_anchor,
                        target_anchor,
                        distance: dist,
                    });
                }
            }
        }
        best
    }

    /// Reparents the smaller cluster into the larger one (ties keep `a`),
    /// preserving every piece's world position. Merging a cluster with
    /// itself is a no-op.
    pub fn merge_clusters(&mut self, a: ClusterId, b: ClusterId) -> Result<ClusterId, MergeError> {
        let merged = self.merge_members(a, b)?;
        if a != b {
            self.note_possible_completion(merged);
        }
        Ok(merged)
    }

    pub(crate) fn merge_members(
        &mut self,
        a: ClusterId,
        b: ClusterId,
    ) -> Result<ClusterId, MergeError> {
        let a_cluster = self.cluster(a).ok_or(MergeError::UnknownCluster(a))?;
        if a == b {
            return Ok(a);
        }
        let b_cluster = self.cluster(b).ok_or(MergeError::UnknownCluster(b))?;
        if a_cluster.rotation() != b_cluster.rotation() {
            return Err(MergeError::RotationMismatch {
                a,
                a_rot: a_cluster.rotation(),
                b,
                b_rot: b_cluster.rotation(),
            });
        }
        let (target, source) = if b_cluster.len() > a_cluster.len() {
            (b, a)
        } else {
            (a, b)
        };
        let Some(mut absorbed) = self.clusters.get_mut(source).and_then(Option::take) else {
            return Err(MergeError::UnknownCluster(source));
        };
        let from = *absorbed.transform();
        let pieces = absorbed.take_pieces();
        for piece in &pieces {
            self.membership.insert(piece.id(), target);
        }
        let survivor = self
            .cluster_mut(target)
            .ok_or(MergeError::UnknownCluster(target))?;
        for piece in pieces {
            survivor.adopt(piece, &from);
        }
        survivor.rebuild_pivot_from_bounds();
        let size = survivor.len();

        let top = self
            .stacking
            .iter()
            .position(|id| *id == target)
            .max(self.stacking.iter().position(|id| *id == source));
        self.stacking.retain(|id| *id != target && *id != source);
        let slot = top.unwrap_or(self.stacking.len() + 1).saturating_sub(1);
        self.stacking.insert(slot.min(self.stacking.len()), target);

        self.cluster_count = self.cluster_count.saturating_sub(1);
        info!(
            survivor = target,
            absorbed = source,
            size,
            clusters_left = self.cluster_count,
            "clusters merged"
        );
        Ok(target)
    }

    pub(crate) fn push_connected(&mut self, event: PieceConnected) {
        self.events.push(PuzzleEvent::PieceConnected(event));
    }

    /// Fires the completion event the first time a single cluster remains.
    pub(crate) fn note_possible_completion(&mut self, merged: ClusterId) {
        if self.completed || self.cluster_count != 1 || self.total_pieces <= 1 {
            return;
        }
        self.completed = true;
        info!(
            final_cluster = merged,
            total_pieces = self.total_pieces,
            "puzzle completed"
        );
        self.events.push(PuzzleEvent::PuzzleCompleted(PuzzleCompleted {
            final_cluster: merged as u32,
            total_pieces: self.total_pieces as u32,
        }));
    }

    /// Global displacement to layer space, used when moving clusters by pointer.
    pub(crate) fn global_delta_to_local(&self, delta: Point) -> Point {
        self.layer.vector_to_local(delta)
    }
}
