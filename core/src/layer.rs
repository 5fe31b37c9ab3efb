use crate::geometry::Point;

/// Coordinate space the clusters live in, supplied by the display side.
pub trait PieceLayer {
    fn to_global(&self, local: Point) -> Point;
    fn to_local(&self, global: Point) -> Point;

    /// Global units per layer unit.
    fn scale(&self) -> f32 {
        let unit = self.vector_to_global((1.0, 0.0));
        (unit.0 * unit.0 + unit.1 * unit.1).sqrt()
    }

    /// Converts a layer-space displacement into global units.
    fn vector_to_global(&self, local: Point) -> Point {
        let origin = self.to_global((0.0, 0.0));
        let end = self.to_global(local);
        (end.0 - origin.0, end.1 - origin.1)
    }

    fn vector_to_local(&self, global: Point) -> Point {
        let origin = self.to_local((0.0, 0.0));
        let end = self.to_local(global);
        (end.0 - origin.0, end.1 - origin.1)
    }
}

/// Uniformly scaled, translated layer. `Default` is the identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerTransform {
    pub offset: Point,
    pub scale: f32,
}

impl LayerTransform {
    pub fn new(offset: Point, scale: f32) -> Self {
        Self {
            offset,
            scale: if scale.is_finite() && scale > 0.0 { scale } else { 1.0 },
        }
    }
}

impl Default for LayerTransform {
    fn default() -> Self {
        Self {
            offset: (0.0, 0.0),
            scale: 1.0,
        }
    }
}

impl PieceLayer for LayerTransform {
    fn scale(&self) -> f32 {
        self.scale
    }

    fn to_global(&self, local: Point) -> Point {
        (
            self.offset.0 + local.0 * self.scale,
            self.offset.1 + local.1 * self.scale,
        )
    }

    fn to_local(&self, global: Point) -> Point {
        (
            (global.0 - self.offset.0) / self.scale,
            (global.1 - self.offset.1) / self.scale,
        )
    }
}
