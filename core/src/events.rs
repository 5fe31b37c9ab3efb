use rkyv::{Archive, Deserialize, Serialize};

/// Raised once per successful merge. `from_cluster` is the cluster that was
/// moved, `to_cluster` the one it joined; both ids are as they were before
/// the merge, one of them equals `merged_cluster`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct PieceConnected {
    pub moving_piece: u32,
    pub static_piece: u32,
    pub from_cluster: u32,
    pub to_cluster: u32,
    pub merged_cluster: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub struct PuzzleCompleted {
    pub final_cluster: u32,
    pub total_pieces: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Archive, Serialize, Deserialize)]
pub enum PuzzleEvent {
    PieceConnected(PieceConnected),
    PuzzleCompleted(PuzzleCompleted),
}

impl PuzzleEvent {
    pub fn as_connected(&self) -> Option<&PieceConnected> {
        match self {
            PuzzleEvent::PieceConnected(event) => Some(event),
            PuzzleEvent::PuzzleCompleted(_) => None,
        }
    }

    pub fn as_completed(&self) -> Option<&PuzzleCompleted> {
        match self {
            PuzzleEvent::PuzzleCompleted(event) => Some(event),
            PuzzleEvent::PieceConnected(_) => None,
        }
    }
}
