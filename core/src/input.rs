//! Pointer handling: turns press/move/release into drags, tap rotations and
//! exactly one settle pass per gesture.

use tracing::debug;

use crate::cluster::{ClusterId, ClusterPhase};
use crate::geometry::{distance, Bounds, Point};
use crate::manager::ClusterManager;
use crate::settle::{CommitAnimator, SettleError, SettleOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub i32);

/// Presentation applied to the grabbed cluster; never part of its transform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragVisual {
    pub lift: f32,
    pub shadow: bool,
}

#[derive(Clone, Copy, Debug)]
struct DragSlopGate {
    start: Point,
    slop: f32,
    moved: bool,
}

impl DragSlopGate {
    fn new(start: Point, slop: f32) -> Self {
        Self {
            start,
            slop,
            moved: false,
        }
    }

    fn update(&mut self, point: Point) -> bool {
        if !self.moved && distance(point, self.start) > self.slop {
            self.moved = true;
        }
        self.moved
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveDrag {
    pointer: PointerId,
    cluster: ClusterId,
    last: Point,
    gate: DragSlopGate,
    visual: DragVisual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Release {
    /// Cluster the gesture ended on, after any merges.
    pub cluster: ClusterId,
    pub rotated: bool,
    pub settle: SettleOutcome,
}

pub struct InputController {
    enabled: bool,
    /// Global-space rectangle at least one core centre must stay inside.
    safe_area: Option<Bounds>,
    active: Option<ActiveDrag>,
}

impl Default for InputController {
    fn default() -> Self {
        Self::new()
    }
}

impl InputController {
    pub fn new() -> Self {
        Self {
            enabled: true,
            safe_area: None,
            active: None,
        }
    }

    pub fn with_safe_area(safe_area: Bounds) -> Self {
        Self {
            safe_area: Some(safe_area),
            ..Self::new()
        }
    }

    pub fn set_safe_area(&mut self, safe_area: Option<Bounds>) {
        self.safe_area = safe_area;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_cluster(&self) -> Option<ClusterId> {
        self.active.map(|drag| drag.cluster)
    }

    pub fn drag_visual(&self) -> Option<(ClusterId, DragVisual)> {
        self.active.map(|drag| (drag.cluster, drag.visual))
    }

    /// Disabling drops an in-progress drag without settling it.
    pub fn set_enabled(&mut self, manager: &mut ClusterManager, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.release_without_settle(manager);
        }
    }

    /// Grabs the topmost idle cluster under `global`. Returns the grabbed id.
    pub fn pointer_down(
        &mut self,
        manager: &mut ClusterManager,
        pointer: PointerId,
        global: Point,
    ) -> Option<ClusterId> {
        if !self.enabled || self.active.is_some() {
            return None;
        }
        let cluster = manager.pick_cluster(global)?;
        if manager.cluster(cluster)?.phase() != ClusterPhase::Idle {
            debug!(cluster, "cluster is busy, grab ignored");
            return None;
        }
        manager.bring_to_front(cluster);
        manager.set_phase(cluster, ClusterPhase::Dragging);
        let rules = manager.rules();
        self.active = Some(ActiveDrag {
            pointer,
            cluster,
            last: global,
            gate: DragSlopGate::new(global, rules.tap_slop),
            visual: DragVisual {
                lift: rules.drag_lift,
                shadow: true,
            },
        });
        debug!(cluster, pointer = pointer.0, "drag started");
        Some(cluster)
    }

    pub fn pointer_move(
        &mut self,
        manager: &mut ClusterManager,
        pointer: PointerId,
        global: Point,
    ) -> bool {
        let Some(drag) = self.active.as_mut() else {
            return false;
        };
        if drag.pointer != pointer {
            return false;
        }
        drag.gate.update(global);
        let delta = manager.global_delta_to_local((global.0 - drag.last.0, global.1 - drag.last.1));
        drag.last = global;
        let cluster = drag.cluster;
        manager.translate_cluster(cluster, delta);
        self.clamp_to_safe_area(manager, cluster);
        true
    }

    /// Ends the gesture: a tap rotates in place, then one settle pass runs.
    pub fn pointer_up(
        &mut self,
        manager: &mut ClusterManager,
        pointer: PointerId,
        global: Point,
        animator: &mut dyn CommitAnimator,
    ) -> Result<Option<Release>, SettleError> {
        let Some(mut drag) = self.active.filter(|drag| drag.pointer == pointer) else {
            return Ok(None);
        };
        self.active = None;
        let moved = drag.gate.update(global);
        let cluster = drag.cluster;
        manager.set_phase(cluster, ClusterPhase::Idle);
        let rotated = !moved && manager.rules().rotation_enabled;
        if rotated {
            manager.rotate_cluster_cw(cluster);
            debug!(cluster, "tap rotated cluster");
        }
        let settle = manager.try_snap_and_merge(cluster, animator)?;
        let settled = match settle {
            SettleOutcome::Settled { cluster, .. } => cluster,
            SettleOutcome::Busy => cluster,
        };
        self.clamp_to_safe_area(manager, settled);
        debug!(cluster = settled, rotated, "drag released");
        Ok(Some(Release {
            cluster: settled,
            rotated,
            settle,
        }))
    }

    pub fn pointer_cancel(&mut self, manager: &mut ClusterManager, pointer: PointerId) -> bool {
        match self.active {
            Some(drag) if drag.pointer == pointer => {
                self.release_without_settle(manager);
                true
            }
            _ => false,
        }
    }

    fn release_without_settle(&mut self, manager: &mut ClusterManager) {
        if let Some(drag) = self.active.take() {
            manager.set_phase(drag.cluster, ClusterPhase::Idle);
            debug!(cluster = drag.cluster, "drag cancelled");
        }
    }

    /// Pulls `cluster` back so its nearest core centre lies in the safe area.
    pub fn clamp_to_safe_area(&self, manager: &mut ClusterManager, cluster: ClusterId) -> bool {
        let Some(safe) = self.safe_area else {
            return false;
        };
        let Some(entry) = manager.cluster(cluster) else {
            return false;
        };
        let centers: Vec<Point> = entry
            .core_centers_world()
            .into_iter()
            .map(|center| manager.layer().to_global(center))
            .collect();
        if centers.iter().any(|center| safe.contains(*center)) {
            return false;
        }
        let shift = centers
            .iter()
            .map(|center| safe.shift_to_contain(*center))
            .min_by(|a, b| {
                let da = a.0 * a.0 + a.1 * a.1;
                let db = b.0 * b.0 + b.1 * b.1;
                da.total_cmp(&db)
            });
        let Some(shift) = shift else {
            return false;
        };
        let delta = manager.global_delta_to_local(shift);
        manager.translate_cluster(cluster, delta)
    }
}
