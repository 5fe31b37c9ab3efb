use crate::geometry::{add, sub, Point};
use crate::rotation::{angle_delta, QuarterTurn};

/// Rigid transform of a cluster inside the pieces layer.
///
/// A local point maps to `position + rotation(local - pivot)`, so the pivot
/// always sits at `position` in layer space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterTransform {
    pub position: Point,
    pub pivot: Point,
    pub rotation: QuarterTurn,
}

impl ClusterTransform {
    pub fn apply(&self, local: Point) -> Point {
        add(self.position, self.rotation.rotate(sub(local, self.pivot)))
    }

    pub fn to_local(&self, world: Point) -> Point {
        add(self.pivot, self.rotation.inverse().rotate(sub(world, self.position)))
    }

    pub fn origin_world(&self) -> Point {
        self.apply((0.0, 0.0))
    }

    pub fn pivot_world(&self) -> Point {
        self.apply(self.pivot)
    }

    pub fn display(&self) -> DisplayTransform {
        DisplayTransform {
            origin: self.origin_world(),
            angle_deg: self.rotation.degrees(),
        }
    }
}

/// Presentation-only pose: where local (0,0) is drawn and at which angle.
/// Interpolated angles never feed back into the committed state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayTransform {
    pub origin: Point,
    pub angle_deg: f32,
}

impl DisplayTransform {
    pub fn lerp(&self, to: &DisplayTransform, t: f32) -> DisplayTransform {
        let t = t.clamp(0.0, 1.0);
        let delta = angle_delta(to.angle_deg, self.angle_deg);
        DisplayTransform {
            origin: (
                self.origin.0 + (to.origin.0 - self.origin.0) * t,
                self.origin.1 + (to.origin.1 - self.origin.1) * t,
            ),
            angle_deg: self.angle_deg + delta * t,
        }
    }
}
