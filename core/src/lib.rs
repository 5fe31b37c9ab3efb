pub mod cluster;
pub mod codec;
pub mod events;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod input;
pub mod layer;
pub mod manager;
pub mod piece;
pub mod rotation;
pub mod rules;
pub mod settle;
pub mod transform;

pub use cluster::{Cluster, ClusterId, ClusterPhase};
pub use codec::{decode, encode, read_event_frames, write_event_frame, CodecError};
pub use events::{PieceConnected, PuzzleCompleted, PuzzleEvent};
pub use generator::{generate_definitions, scatter, solved_position, Placement, PuzzleLayout, Scatter};
pub use geometry::{Bounds, Point};
pub use grid::{plan_choices, plan_grid, GridPlan};
pub use input::{DragVisual, InputController, PointerId, Release};
pub use layer::{LayerTransform, PieceLayer};
pub use manager::{ClusterManager, MergeError, RegistryError, SnapCandidate};
pub use piece::{Edge, GridCoord, Piece, PieceDefinition, PieceError, PieceId};
pub use rotation::QuarterTurn;
pub use rules::{RulesError, SnapRules};
pub use settle::{CommitAnimator, CommitStep, InstantAnimator, SettleError, SettleOutcome, SettleStatus};
pub use transform::{ClusterTransform, DisplayTransform};
