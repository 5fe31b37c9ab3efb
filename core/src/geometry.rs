pub type Point = (f32, f32);

pub fn add(a: Point, b: Point) -> Point {
    (a.0 + b.0, a.1 + b.1)
}

pub fn sub(a: Point, b: Point) -> Point {
    (a.0 - b.0, a.1 - b.1)
}

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

/// Axis-aligned rectangle, min inclusive, max inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_origin_size(origin: Point, width: f32, height: f32) -> Self {
        Self::new(origin.0, origin.1, origin.0 + width, origin.1 + height)
    }

    pub fn center(&self) -> Point {
        (
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.0 >= self.min_x
            && point.0 <= self.max_x
            && point.1 >= self.min_y
            && point.1 <= self.max_y
    }

    /// Smallest shift that moves `point` inside these bounds.
    pub fn shift_to_contain(&self, point: Point) -> Point {
        let mut shift_x = 0.0;
        let mut shift_y = 0.0;
        if point.0 < self.min_x {
            shift_x = self.min_x - point.0;
        } else if point.0 > self.max_x {
            shift_x = self.max_x - point.0;
        }
        if point.1 < self.min_y {
            shift_y = self.min_y - point.1;
        } else if point.1 > self.max_y {
            shift_y = self.max_y - point.1;
        }
        (shift_x, shift_y)
    }
}
