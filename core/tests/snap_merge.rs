mod common;

use common::{assert_close, piece_with_anchor, CELL, PAD};
use kumiawase_core::{
    generate_definitions, solved_position, ClusterManager, InstantAnimator, LayerTransform,
    MergeError, Piece, PuzzleEvent, PuzzleLayout, QuarterTurn, SettleError, SettleOutcome,
    SnapRules,
};

/// Pieces (0,0), (0,1) and a far-away (1,0) so a pair snap never completes.
fn column_pair(moving_anchor: (f32, f32)) -> ClusterManager {
    let pieces = vec![
        piece_with_anchor(0, 0, 0, (300.0, 300.0)),
        piece_with_anchor(1, 0, 1, moving_anchor),
        piece_with_anchor(2, 1, 0, (1500.0, 1500.0)),
    ];
    ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap()
}

fn connected_events(events: &[PuzzleEvent]) -> usize {
    events.iter().filter(|event| event.as_connected().is_some()).count()
}

fn completed_events(events: &[PuzzleEvent]) -> usize {
    events.iter().filter(|event| event.as_completed().is_some()).count()
}

#[test]
fn pair_within_range_snaps_and_merges() {
    let mut manager = column_pair((302.0, 398.0));
    let active = manager.cluster_of(1).unwrap();

    let outcome = manager
        .try_snap_and_merge(active, &mut InstantAnimator)
        .unwrap();

    let merged = manager.cluster_of(1).unwrap();
    assert_eq!(
        outcome,
        SettleOutcome::Settled {
            cluster: merged,
            merges: 1
        }
    );
    assert_eq!(manager.cluster_of(0), Some(merged));
    assert_eq!(manager.cluster(merged).unwrap().len(), 2);
    assert_eq!(manager.cluster(merged).unwrap().rotation(), QuarterTurn::Deg0);
    assert_eq!(manager.cluster_count(), 2);
    assert_close(manager.core_origin_global(0).unwrap(), (300.0, 300.0));
    assert_close(manager.core_origin_global(1).unwrap(), (300.0, 400.0));

    let events = manager.drain_events();
    assert_eq!(events.len(), 1);
    let connected = events[0].as_connected().unwrap();
    assert_eq!(connected.moving_piece, 1);
    assert_eq!(connected.static_piece, 0);
    assert_eq!(connected.merged_cluster as usize, merged);
    assert!(manager.check_partition());
}

#[test]
fn equal_sized_snap_keeps_the_static_cluster() {
    let mut manager = column_pair((302.0, 398.0));
    let moving = manager.cluster_of(1).unwrap();
    let fixed = manager.cluster_of(0).unwrap();

    manager
        .try_snap_and_merge(moving, &mut InstantAnimator)
        .unwrap();

    let events = manager.drain_events();
    let connected = events[0].as_connected().unwrap();
    assert_eq!(connected.from_cluster as usize, moving);
    assert_eq!(connected.to_cluster as usize, fixed);
    assert_eq!(connected.merged_cluster, connected.to_cluster);
    assert!(manager.cluster(moving).is_none());
    assert_eq!(manager.cluster(fixed).unwrap().len(), 2);
    assert_eq!(manager.cluster_of(1), Some(fixed));
}

#[test]
fn pair_out_of_range_is_left_alone() {
    let mut manager = column_pair((340.0, 360.0));
    let active = manager.cluster_of(1).unwrap();

    let outcome = manager
        .try_snap_and_merge(active, &mut InstantAnimator)
        .unwrap();

    assert_eq!(
        outcome,
        SettleOutcome::Settled {
            cluster: active,
            merges: 0
        }
    );
    assert_eq!(manager.cluster_count(), 3);
    assert_ne!(manager.cluster_of(0), manager.cluster_of(1));
    assert_close(manager.core_origin_global(1).unwrap(), (340.0, 360.0));
    assert!(manager.pending_events().is_empty());
}

#[test]
fn candidate_search_reports_global_distance() {
    let manager = column_pair((302.0, 398.0));
    let candidate = manager
        .find_best_snap_candidate(manager.cluster_of(1).unwrap())
        .unwrap();
    assert_eq!(candidate.moving_piece, 1);
    assert_eq!(candidate.static_piece, 0);
    assert_close(candidate.target_anchor, (300.0, 400.0));
    assert!((candidate.distance - 8.0f32.sqrt()).abs() < 1e-3);
}

#[test]
fn ties_go_to_the_first_neighbour_found() {
    // Left and right neighbours both want the middle piece 5 units away.
    let pieces = vec![
        piece_with_anchor(0, 0, 0, (0.0, 0.0)),
        piece_with_anchor(1, 1, 0, (105.0, 0.0)),
        piece_with_anchor(2, 2, 0, (210.0, 0.0)),
    ];
    let manager = ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap();
    let candidate = manager
        .find_best_snap_candidate(manager.cluster_of(1).unwrap())
        .unwrap();
    assert_eq!(candidate.static_piece, 0);
    assert!((candidate.distance - 5.0).abs() < 1e-3);
}

#[test]
fn mismatched_rotation_is_never_a_candidate() {
    let mut manager = column_pair((300.0, 400.0));
    let static_cluster = manager.cluster_of(0).unwrap();
    manager.rotate_cluster_cw(static_cluster);

    let active = manager.cluster_of(1).unwrap();
    assert!(manager.find_best_snap_candidate(active).is_none());
    let outcome = manager
        .try_snap_and_merge(active, &mut InstantAnimator)
        .unwrap();
    assert_eq!(
        outcome,
        SettleOutcome::Settled {
            cluster: active,
            merges: 0
        }
    );
    assert_eq!(
        manager.merge_clusters(active, static_cluster),
        Err(MergeError::RotationMismatch {
            a: active,
            a_rot: QuarterTurn::Deg0,
            b: static_cluster,
            b_rot: QuarterTurn::Deg90,
        })
    );
}

#[test]
fn rotated_pair_snaps_along_rotated_offset() {
    let mut manager = column_pair((600.0, 600.0));
    let static_cluster = manager.cluster_of(0).unwrap();
    let active = manager.cluster_of(1).unwrap();
    manager.rotate_cluster_cw(static_cluster);
    manager.rotate_cluster_cw(active);

    // Solved offset (0, 100) turned clockwise becomes (-100, 0).
    let static_anchor = manager.core_origin_global(0).unwrap();
    let expected = (static_anchor.0 - CELL, static_anchor.1);
    let current = manager.core_origin_global(1).unwrap();
    manager.translate_cluster(
        active,
        (
            expected.0 + 4.0 - current.0,
            expected.1 - 3.0 - current.1,
        ),
    );

    let outcome = manager
        .try_snap_and_merge(active, &mut InstantAnimator)
        .unwrap();
    assert!(matches!(outcome, SettleOutcome::Settled { merges: 1, .. }));
    assert_close(manager.core_origin_global(1).unwrap(), expected);
    assert_close(manager.core_origin_global(0).unwrap(), static_anchor);
    let merged = manager.cluster_of(0).unwrap();
    assert_eq!(manager.cluster(merged).unwrap().rotation(), QuarterTurn::Deg90);
}

#[test]
fn four_piece_grid_completes_exactly_once() {
    let layout = PuzzleLayout {
        cols: 2,
        rows: 2,
        piece_width: CELL,
        piece_height: CELL,
        pad: PAD,
    };
    let defs = generate_definitions(&layout, 42).unwrap();
    let pieces: Vec<Piece> = defs
        .iter()
        .map(|def| {
            let (x, y) = solved_position(def);
            Piece::at(*def, (x + def.id as f32 * 400.0, y + 200.0))
        })
        .collect();
    let mut manager = ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap();
    assert_eq!(manager.cluster_count(), 4);

    let mut merged = manager
        .merge_clusters(manager.cluster_of(0).unwrap(), manager.cluster_of(1).unwrap())
        .unwrap();
    assert!(manager.check_partition());
    merged = manager
        .merge_clusters(merged, manager.cluster_of(2).unwrap())
        .unwrap();
    assert!(manager.check_partition());
    assert!(!manager.is_complete());
    assert_eq!(completed_events(manager.pending_events()), 0);
    merged = manager
        .merge_clusters(merged, manager.cluster_of(3).unwrap())
        .unwrap();
    assert!(manager.check_partition());

    assert_eq!(manager.cluster_count(), 1);
    assert!(manager.is_complete());
    assert_eq!(manager.merge_clusters(merged, merged), Ok(merged));
    let events = manager.drain_events();
    assert_eq!(completed_events(&events), 1);
    let completed = events[0].as_completed().unwrap();
    assert_eq!(completed.total_pieces, 4);
    assert_eq!(completed.final_cluster as usize, merged);
}

#[test]
fn settle_chains_through_a_near_solved_grid() {
    let layout = PuzzleLayout::new(2, 2, CELL, CELL);
    let defs = generate_definitions(&layout, 9).unwrap();
    let jitter = [(0.0, 0.0), (3.0, -2.0), (-2.0, 3.0), (2.0, 2.0)];
    let pieces: Vec<Piece> = defs
        .iter()
        .zip(jitter)
        .map(|(def, (dx, dy))| {
            let (x, y) = solved_position(def);
            Piece::at(*def, (x + 50.0 + dx, y + 50.0 + dy))
        })
        .collect();
    let mut manager = ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap();

    let mut steps = Vec::new();
    let mut record = |step: &kumiawase_core::CommitStep| steps.push(*step);
    let outcome = manager
        .try_snap_and_merge(manager.cluster_of(0).unwrap(), &mut record)
        .unwrap();

    assert!(matches!(outcome, SettleOutcome::Settled { merges: 3, .. }));
    assert_eq!(steps.len(), 3);
    assert!(manager.is_complete());
    assert!(manager.check_partition());
    let events = manager.drain_events();
    assert_eq!(connected_events(&events), 3);
    assert_eq!(completed_events(&events), 1);
    assert!(events.last().unwrap().as_completed().is_some());

    let origin = manager.core_origin_global(0).unwrap();
    for def in &defs {
        let anchor = manager.core_origin_global(def.id).unwrap();
        assert_close(
            anchor,
            (
                origin.0 + def.col as f32 * CELL,
                origin.1 + def.row as f32 * CELL,
            ),
        );
    }
}

#[test]
fn self_merge_is_a_no_op() {
    let mut manager = column_pair((302.0, 398.0));
    let cluster = manager.cluster_of(0).unwrap();
    assert_eq!(manager.merge_clusters(cluster, cluster), Ok(cluster));
    assert_eq!(manager.cluster_count(), 3);
    assert!(manager.pending_events().is_empty());
    assert!(manager.check_partition());
}

#[test]
fn merge_keeps_the_larger_cluster() {
    let pieces = vec![
        piece_with_anchor(0, 0, 0, (0.0, 0.0)),
        piece_with_anchor(1, 1, 0, (100.0, 0.0)),
        piece_with_anchor(2, 2, 0, (400.0, 0.0)),
    ];
    let mut manager = ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap();
    let pair = manager.merge_clusters(0, 1).unwrap();
    let merged = manager.merge_clusters(2, pair).unwrap();
    assert_eq!(merged, pair);
    assert!(manager.cluster(2).is_none());
    assert_close(manager.core_origin_global(2).unwrap(), (400.0, 0.0));
    assert_eq!(manager.merge_clusters(2, pair), Err(MergeError::UnknownCluster(2)));
}

#[test]
fn snap_distance_is_measured_in_global_units() {
    let layer = LayerTransform::new((10.0, 20.0), 2.0);
    let build = |offset: f32| {
        let mut manager = ClusterManager::with_layer(SnapRules::default(), layer);
        let pieces = vec![
            piece_with_anchor(0, 0, 0, (0.0, 0.0)),
            piece_with_anchor(1, 1, 0, (CELL + offset, offset)),
        ];
        manager.register_pieces(&pieces).unwrap();
        manager.create_initial_clusters(pieces).unwrap();
        manager
    };

    // 5 layer units each way is ~14 global units.
    let mut near = build(5.0);
    let active = near.cluster_of(1).unwrap();
    let outcome = near.try_snap_and_merge(active, &mut InstantAnimator).unwrap();
    assert!(matches!(outcome, SettleOutcome::Settled { merges: 1, .. }));
    assert_close(near.core_origin_global(1).unwrap(), (10.0 + 2.0 * CELL, 20.0));

    // 12 layer units each way is ~34 global units, past the 28 limit.
    let mut far = build(12.0);
    let active = far.cluster_of(1).unwrap();
    let outcome = far.try_snap_and_merge(active, &mut InstantAnimator).unwrap();
    assert!(matches!(outcome, SettleOutcome::Settled { merges: 0, .. }));
}

#[test]
fn empty_puzzle_has_nothing_to_settle() {
    let mut manager = ClusterManager::with_pieces(SnapRules::default(), Vec::new()).unwrap();
    assert_eq!(
        manager.try_snap_and_merge(0, &mut InstantAnimator),
        Err(SettleError::UnknownCluster(0))
    );
    assert!(manager.find_best_snap_candidate(0).is_none());
    assert!(!manager.is_complete());
    assert!(manager.drain_events().is_empty());
    assert!(manager.check_partition());
}

#[test]
fn single_piece_puzzle_settles_silently() {
    let pieces = vec![piece_with_anchor(0, 0, 0, (300.0, 300.0))];
    let mut manager = ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap();

    assert!(manager.find_best_snap_candidate(0).is_none());
    let outcome = manager
        .try_snap_and_merge(0, &mut InstantAnimator)
        .unwrap();
    assert_eq!(
        outcome,
        SettleOutcome::Settled {
            cluster: 0,
            merges: 0
        }
    );
    assert_eq!(manager.cluster_count(), 1);
    assert_close(manager.core_origin_global(0).unwrap(), (300.0, 300.0));
    let events = manager.drain_events();
    assert_eq!(connected_events(&events), 0);
    assert_eq!(completed_events(&events), 0);
}

#[test]
fn candidate_search_is_repeatable() {
    let build = || {
        let pieces = vec![
            piece_with_anchor(0, 0, 0, (0.0, 0.0)),
            piece_with_anchor(1, 1, 0, (104.0, 2.0)),
            piece_with_anchor(2, 2, 0, (207.0, -1.0)),
            piece_with_anchor(3, 1, 1, (101.0, 103.0)),
        ];
        ClusterManager::with_pieces(SnapRules::default(), pieces).unwrap()
    };
    let manager = build();
    let twin = build();
    for piece in 0..4 {
        let cluster = manager.cluster_of(piece).unwrap();
        let first = manager.find_best_snap_candidate(cluster);
        assert!(first.is_some());
        assert_eq!(manager.find_best_snap_candidate(cluster), first);
        assert_eq!(twin.find_best_snap_candidate(cluster), first);
    }
}
