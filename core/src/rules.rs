use serde::{Deserialize, Serialize};

pub const SNAP_DISTANCE_DEFAULT: f32 = 28.0;
pub const SNAP_DISTANCE_MIN: f32 = 1.0;
pub const SNAP_DISTANCE_MAX: f32 = 512.0;

pub const SNAP_DISTANCE_RATIO_MIN: f32 = 0.050;
pub const SNAP_DISTANCE_RATIO_MAX: f32 = 0.350;

pub const SNAP_ITERATIONS_DEFAULT: u32 = 8;
pub const SNAP_ITERATIONS_MIN: u32 = 1;
pub const SNAP_ITERATIONS_MAX: u32 = 64;

pub const COMMIT_DURATION_MS_DEFAULT: f32 = 160.0;
pub const COMMIT_DURATION_MS_MAX: f32 = 2000.0;

pub const TAP_SLOP_DEFAULT: f32 = 4.0;
pub const DRAG_LIFT_DEFAULT: f32 = 6.0;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("rules parse failed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("rule `{field}` is not a finite number")]
    NotFinite { field: &'static str },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapRules {
    /// Largest core-anchor distance (global units) accepted as a snap.
    pub snap_distance: f32,
    /// Upper bound on chained merges in one settle pass.
    pub snap_iterations: u32,
    /// Tween budget handed to the animator per commit.
    pub commit_duration_ms: f32,
    /// Whether a tap rotates the grabbed cluster.
    pub rotation_enabled: bool,
    pub tap_slop: f32,
    pub drag_lift: f32,
}

impl Default for SnapRules {
    fn default() -> Self {
        Self {
            snap_distance: SNAP_DISTANCE_DEFAULT,
            snap_iterations: SNAP_ITERATIONS_DEFAULT,
            commit_duration_ms: COMMIT_DURATION_MS_DEFAULT,
            rotation_enabled: true,
            tap_slop: TAP_SLOP_DEFAULT,
            drag_lift: DRAG_LIFT_DEFAULT,
        }
    }
}

impl SnapRules {
    pub fn from_toml_str(contents: &str) -> Result<Self, RulesError> {
        let rules: SnapRules = toml::from_str(contents)?;
        for (field, value) in [
            ("snap_distance", rules.snap_distance),
            ("commit_duration_ms", rules.commit_duration_ms),
            ("tap_slop", rules.tap_slop),
            ("drag_lift", rules.drag_lift),
        ] {
            if !value.is_finite() {
                return Err(RulesError::NotFinite { field });
            }
        }
        Ok(rules.sanitized())
    }

    pub fn sanitized(self) -> Self {
        Self {
            snap_distance: self.snap_distance.clamp(SNAP_DISTANCE_MIN, SNAP_DISTANCE_MAX),
            snap_iterations: self
                .snap_iterations
                .clamp(SNAP_ITERATIONS_MIN, SNAP_ITERATIONS_MAX),
            commit_duration_ms: self.commit_duration_ms.clamp(0.0, COMMIT_DURATION_MS_MAX),
            rotation_enabled: self.rotation_enabled,
            tap_slop: self.tap_slop.max(0.0),
            drag_lift: self.drag_lift.max(0.0),
        }
    }

    /// Derives the snap distance from the smaller side of a piece.
    pub fn with_distance_ratio(self, piece_width: f32, piece_height: f32, ratio: f32) -> Self {
        let ratio = ratio.clamp(SNAP_DISTANCE_RATIO_MIN, SNAP_DISTANCE_RATIO_MAX);
        Self {
            snap_distance: piece_width.min(piece_height) * ratio,
            ..self
        }
        .sanitized()
    }
}
