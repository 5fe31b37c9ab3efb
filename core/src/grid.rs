//! Picks a cols x rows grid for an image so pieces stay close to square and
//! the piece count lands near a requested target.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPlan {
    pub target_count: u32,
    pub cols: u32,
    pub rows: u32,
}

impl GridPlan {
    pub fn piece_count(&self) -> u32 {
        self.cols * self.rows
    }

    pub fn label(&self) -> String {
        let actual = self.piece_count();
        if actual == self.target_count {
            format!("{} pieces ({}x{})", self.target_count, self.cols, self.rows)
        } else {
            format!(
                "{} pieces ({}x{}, actual {})",
                self.target_count, self.cols, self.rows, actual
            )
        }
    }
}

pub const TARGET_PIECE_COUNTS: [u32; 11] = [
    50, 100, 150, 300, 500, 750, 1000, 1500, 2000, 3000, 5000,
];

pub const FALLBACK_GRID: GridPlan = GridPlan {
    target_count: 80,
    cols: 10,
    rows: 8,
};

const COUNT_TOLERANCE: f32 = 0.05;
const PIECE_ASPECT_MAX: f32 = 1.42;
const ROW_MIN: u32 = 2;
const COL_MIN: i32 = 2;
const ROW_WIDEN: f32 = 1.5;
const COL_SPREAD: i32 = 3;
const WEIGHT_COUNT: f32 = 1.0;
const WEIGHT_GRID: f32 = 1.0;
const WEIGHT_PIECE: f32 = 0.5;

/// Lowest-scoring grid whose count is within 5% of `target` and whose pieces
/// stay within the aspect limit, or `None` if nothing qualifies.
pub fn plan_grid(width: u32, height: u32, target: u32) -> Option<GridPlan> {
    if target == 0 || width == 0 || height == 0 {
        return None;
    }
    let image_aspect = width as f32 / height as f32;
    let piece_aspect_min = 1.0 / PIECE_ASPECT_MAX;
    let row_max = (((target as f32).sqrt().ceil()) * ROW_WIDEN).ceil() as u32;
    let mut best: Option<(GridPlan, f32)> = None;
    for rows in ROW_MIN..=row_max.max(ROW_MIN) {
        let center_col = (target as f32 / rows as f32).round() as i32;
        for cols in (center_col - COL_SPREAD)..=(center_col + COL_SPREAD) {
            if cols < COL_MIN {
                continue;
            }
            let count = rows * cols as u32;
            let count_err = (count as f32 - target as f32).abs() / target as f32;
            if count_err > COUNT_TOLERANCE {
                continue;
            }
            let grid_aspect = cols as f32 / rows as f32;
            let piece_aspect = image_aspect / grid_aspect;
            if !(piece_aspect_min..=PIECE_ASPECT_MAX).contains(&piece_aspect) {
                continue;
            }
            let score = WEIGHT_COUNT * count_err.powi(2)
                + WEIGHT_GRID * (grid_aspect / image_aspect).ln().powi(2)
                + WEIGHT_PIECE * piece_aspect.ln().powi(2);
            if best.map(|(_, best_score)| score < best_score).unwrap_or(true) {
                best = Some((
                    GridPlan {
                        target_count: target,
                        cols: cols as u32,
                        rows,
                    },
                    score,
                ));
            }
        }
    }
    best.map(|(plan, _)| plan)
}

pub fn plan_choices(width: u32, height: u32) -> Vec<GridPlan> {
    TARGET_PIECE_COUNTS
        .iter()
        .filter_map(|target| plan_grid(width, height, *target))
        .collect()
}
