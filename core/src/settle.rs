//! Settle passes: the bounded search/commit/merge loop run after a drag
//! release or a tap-rotate.
//!
//! A pass is an explicit state machine. [`ClusterManager::begin_settle`]
//! either finishes immediately or hands back a [`CommitStep`] that the display
//! layer animates; once the tween's budget has elapsed the host calls
//! [`ClusterManager::finish_commit`] to evaluate the next candidate.
//! [`ClusterManager::try_snap_and_merge`] runs the same machine synchronously
//! through a [`CommitAnimator`].

use tracing::{debug, warn};

use crate::cluster::{ClusterId, ClusterPhase};
use crate::events::PieceConnected;
use crate::manager::{ClusterManager, MergeError, SnapCandidate};
use crate::piece::PieceId;
use crate::transform::DisplayTransform;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettleError {
    #[error("cluster {0} does not exist or was merged away")]
    UnknownCluster(ClusterId),
    #[error("cluster {0} has no settle pass waiting on a commit")]
    NoPendingCommit(ClusterId),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// One committed snap, described for the tween that presents it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommitStep {
    /// Surviving cluster; the pass continues on it.
    pub cluster: ClusterId,
    /// Cluster that was rotated and translated before merging.
    pub moved_cluster: ClusterId,
    pub moving_piece: PieceId,
    pub static_piece: PieceId,
    pub rotation_steps: u32,
    /// Pose of the moved pieces' frame before and after the commit.
    pub from: DisplayTransform,
    pub to: DisplayTransform,
    pub duration_ms: f32,
}

impl CommitStep {
    pub fn sample(&self, t: f32) -> DisplayTransform {
        self.from.lerp(&self.to, t)
    }

    pub fn sample_at_ms(&self, elapsed_ms: f32) -> DisplayTransform {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        self.sample(elapsed_ms / self.duration_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettleOutcome {
    Settled { cluster: ClusterId, merges: u32 },
    /// The cluster was already mid-settle; nothing was done.
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SettleStatus {
    Committing(CommitStep),
    Done(SettleOutcome),
}

/// Presents a commit and returns once its time budget has elapsed.
pub trait CommitAnimator {
    fn animate(&mut self, step: &CommitStep);
}

/// Completes every commit immediately.
#[derive(Clone, Copy, Debug, Default)]
pub struct InstantAnimator;

impl CommitAnimator for InstantAnimator {
    fn animate(&mut self, _step: &CommitStep) {}
}

impl<F> CommitAnimator for F
where
    F: FnMut(&CommitStep),
{
    fn animate(&mut self, step: &CommitStep) {
        self(step)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SettlePass {
    merges: u32,
    pending: Option<CommitStep>,
}

impl ClusterManager {
    /// Starts a settle pass on `cluster`. Re-entrant calls report `Busy`.
    pub fn begin_settle(&mut self, cluster: ClusterId) -> Result<SettleStatus, SettleError> {
        let phase = self
            .cluster(cluster)
            .map(|entry| entry.phase())
            .ok_or(SettleError::UnknownCluster(cluster))?;
        if phase == ClusterPhase::Settling {
            debug!(cluster, "settle already in progress");
            return Ok(SettleStatus::Done(SettleOutcome::Busy));
        }
        self.set_phase(cluster, ClusterPhase::Settling);
        self.settles.insert(cluster, SettlePass::default());
        self.advance_settle(cluster)
    }

    /// Called once the tween of the pending commit has finished.
    pub fn finish_commit(&mut self, cluster: ClusterId) -> Result<SettleStatus, SettleError> {
        let pass = self
            .settles
            .get_mut(&cluster)
            .ok_or(SettleError::NoPendingCommit(cluster))?;
        if pass.pending.take().is_none() {
            return Err(SettleError::NoPendingCommit(cluster));
        }
        self.advance_settle(cluster)
    }

    pub fn is_settling(&self, cluster: ClusterId) -> bool {
        self.settles.contains_key(&cluster)
    }

    /// Runs a whole settle pass, letting `animator` present each commit.
    pub fn try_snap_and_merge(
        &mut self,
        cluster: ClusterId,
        animator: &mut dyn CommitAnimator,
    ) -> Result<SettleOutcome, SettleError> {
        let mut status = self.begin_settle(cluster)?;
        loop {
            match status {
                SettleStatus::Committing(step) => {
                    animator.animate(&step);
                    status = self.finish_commit(step.cluster)?;
                }
                SettleStatus::Done(outcome) => return Ok(outcome),
            }
        }
    }

    fn advance_settle(&mut self, cluster: ClusterId) -> Result<SettleStatus, SettleError> {
        let pass = self.settles.get(&cluster).copied().unwrap_or_default();
        if pass.merges >= self.rules.snap_iterations {
            warn!(
                cluster,
                merges = pass.merges,
                "settle pass stopped at iteration bound"
            );
            return Ok(self.end_settle(cluster, pass.merges));
        }
        let candidate = match self.find_best_snap_candidate(cluster) {
            Some(candidate) if candidate.distance <= self.rules.snap_distance => candidate,
            Some(candidate) => {
                debug!(
                    cluster,
                    distance = candidate.distance,
                    snap_distance = self.rules.snap_distance,
                    "closest candidate out of range"
                );
                return Ok(self.end_settle(cluster, pass.merges));
            }
            None => return Ok(self.end_settle(cluster, pass.merges)),
        };
        debug!(
            cluster,
            moving_piece = candidate.moving_piece,
            static_piece = candidate.static_piece,
            distance = candidate.distance,
            "snap candidate accepted"
        );
        self.commit_or_abort(cluster, pass, &candidate)
    }

    /// Commits `candidate` and re-keys the pass to the surviving cluster. A
    /// failed commit still ends the pass so the cluster never stays `Settling`.
    fn commit_or_abort(
        &mut self,
        cluster: ClusterId,
        mut pass: SettlePass,
        candidate: &SnapCandidate,
    ) -> Result<SettleStatus, SettleError> {
        let step = match self.commit_candidate(cluster, candidate) {
            Ok(step) => step,
            Err(err) => {
                self.end_settle(cluster, pass.merges);
                return Err(err);
            }
        };
        self.settles.remove(&cluster);
        pass.merges += 1;
        pass.pending = Some(step);
        self.settles.insert(step.cluster, pass);
        Ok(SettleStatus::Committing(step))
    }

    fn end_settle(&mut self, cluster: ClusterId, merges: u32) -> SettleStatus {
        self.settles.remove(&cluster);
        self.set_phase(cluster, ClusterPhase::Idle);
        SettleStatus::Done(SettleOutcome::Settled { cluster, merges })
    }

    /// Rotates and translates `active` onto the candidate, merges it into the
    /// static cluster (unless `active` is larger), and queues the events.
    fn commit_candidate(
        &mut self,
        active: ClusterId,
        candidate: &SnapCandidate,
    ) -> Result<CommitStep, SettleError> {
        let target_local = self.layer.to_local(candidate.target_anchor);
        let cluster = self
            .cluster_mut(active)
            .ok_or(SettleError::UnknownCluster(active))?;
        let from = cluster.transform().display();
        let rotation_steps = cluster.rotate_to(candidate.target_rotation);
        let moving_local = cluster
            .core_origin_world(candidate.moving_piece)
            .ok_or(SettleError::UnknownCluster(active))?;
        cluster.translate((
            target_local.0 - moving_local.0,
            target_local.1 - moving_local.1,
        ));
        let to = cluster.transform().display();

        let merged = self.merge_members(candidate.static_cluster, active)?;
        self.set_phase(merged, ClusterPhase::Settling);
        self.push_connected(PieceConnected {
            moving_piece: candidate.moving_piece as u32,
            static_piece: candidate.static_piece as u32,
            from_cluster: active as u32,
            to_cluster: candidate.static_cluster as u32,
            merged_cluster: merged as u32,
        });
        self.note_possible_completion(merged);

        Ok(CommitStep {
            cluster: merged,
            moved_cluster: active,
            moving_piece: candidate.moving_piece,
            static_piece: candidate.static_piece,
            rotation_steps,
            from,
            to,
            duration_ms: self.rules.commit_duration_ms,
        })
    }
}
