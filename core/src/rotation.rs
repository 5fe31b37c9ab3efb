use crate::geometry::{add, sub, Point};

pub const ROTATION_STEP_DEG: f32 = 90.0;

/// Clockwise quarter-turn orientation of a cluster. Screen space is y-down,
/// so a clockwise turn maps `(x, y)` to `(-y, x)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QuarterTurn {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl QuarterTurn {
    pub const ALL: [QuarterTurn; 4] = [
        QuarterTurn::Deg0,
        QuarterTurn::Deg90,
        QuarterTurn::Deg180,
        QuarterTurn::Deg270,
    ];

    pub fn from_index(index: u32) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    pub fn index(self) -> u32 {
        match self {
            QuarterTurn::Deg0 => 0,
            QuarterTurn::Deg90 => 1,
            QuarterTurn::Deg180 => 2,
            QuarterTurn::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> f32 {
        self.index() as f32 * ROTATION_STEP_DEG
    }

    pub fn next_cw(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn inverse(self) -> Self {
        Self::from_index(4 - self.index())
    }

    /// Number of clockwise steps needed to go from `self` to `target`.
    pub fn steps_cw_to(self, target: QuarterTurn) -> u32 {
        (target.index() + 4 - self.index()) % 4
    }

    pub fn rotate(self, point: Point) -> Point {
        let (x, y) = point;
        match self {
            QuarterTurn::Deg0 => (x, y),
            QuarterTurn::Deg90 => (-y, x),
            QuarterTurn::Deg180 => (-x, -y),
            QuarterTurn::Deg270 => (y, -x),
        }
    }
}

/// Where `point` lands if everything is turned by `turn` about `origin`.
/// Pure: nothing live is mutated.
pub fn project_about(origin: Point, point: Point, turn: QuarterTurn) -> Point {
    add(origin, turn.rotate(sub(point, origin)))
}

pub fn normalize_angle(mut angle: f32) -> f32 {
    angle %= 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

pub fn angle_delta(target: f32, current: f32) -> f32 {
    let mut diff = normalize_angle(target - current);
    if diff > 180.0 {
        diff -= 360.0;
    }
    diff
}

/// Continuous rotation, only for display interpolation.
pub fn rotate_vec(x: f32, y: f32, angle_deg: f32) -> Point {
    let theta = angle_deg.to_radians();
    let (sin, cos) = theta.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
