use super::*;

#[derive(clap::Args)]
pub(super) struct SolveArgs {
    #[arg(long, default_value_t = 8)]
    cols: u32,
    #[arg(long, default_value_t = 6)]
    rows: u32,
    #[arg(long, default_value_t = 100.0)]
    piece_width: f32,
    #[arg(long, default_value_t = 100.0)]
    piece_height: f32,
    /// Decimal or 0x-prefixed hex; random when omitted.
    #[arg(long)]
    seed: Option<String>,
    /// TOML file with snap rules.
    #[arg(long, env = "KUMIAWASE_RULES")]
    rules: Option<PathBuf>,
    /// Scatter pieces at random quarter turns.
    #[arg(long)]
    rotate: bool,
    /// Writes every dispatched event as length-prefixed rkyv frames.
    #[arg(long)]
    event_log: Option<PathBuf>,
    #[arg(long, default_value_t = 10_000)]
    max_moves: u32,
    /// Largest per-axis error the bot makes when placing a piece.
    #[arg(long, default_value_t = 6.0)]
    jitter_px: f32,
}

struct Table {
    manager: ClusterManager,
    input: InputController,
    rng: StdRng,
    jitter_px: f32,
    moves: u32,
    taps: u32,
    commits: u32,
    tween_ms: f32,
}

/// What a bot run achieved. `Display` gives the one-line summary.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct SolveReport {
    pub completed: bool,
    pub pieces: usize,
    pub clusters_left: usize,
    pub moves: u32,
    pub taps: u32,
    pub connections: usize,
    pub tween_ms: f32,
}

impl std::fmt::Display for SolveReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.completed {
            write!(
                f,
                "solved {} pieces in {} moves ({} taps, {} connections, {:.0} ms of tweens)",
                self.pieces, self.moves, self.taps, self.connections, self.tween_ms
            )
        } else {
            write!(
                f,
                "gave up after {} moves: {} clusters left ({} connections)",
                self.moves, self.clusters_left, self.connections
            )
        }
    }
}

/// A piece of one cluster and the grid neighbour it should join.
#[derive(Clone, Copy, Debug)]
struct Target {
    cluster: ClusterId,
    moving_piece: PieceId,
    static_piece: PieceId,
}

pub(super) fn run(args: SolveArgs) -> Result<SolveReport, Box<dyn std::error::Error>> {
    validate_args(&args)?;
    let mut rules = match args.rules.as_deref() {
        Some(path) => SnapRules::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SnapRules::default(),
    };
    if args.rotate && !rules.rotation_enabled {
        warn!("rotated scatter needs tap rotation, enabling it");
        rules.rotation_enabled = true;
    }
    let seed = match args.seed.as_deref() {
        Some(raw) => parse_seed_arg(raw)?,
        None => rand::rng().random(),
    };

    let layout = PuzzleLayout::new(args.cols, args.rows, args.piece_width, args.piece_height);
    let defs = generate_definitions(&layout, seed)?;
    let (image_width, image_height) = layout.image_size();
    let area = Bounds::from_origin_size((0.0, 0.0), image_width * 2.0, image_height * 2.0);
    let scattered = scatter(&defs, seed, area, args.rotate);
    let mut manager = ClusterManager::with_pieces(rules, scattered.pieces(&defs))?;
    scattered.arrange(&mut manager);
    info!(
        seed = format_args!("{seed:#010x}"),
        cols = args.cols,
        rows = args.rows,
        pieces = manager.total_pieces(),
        rotate = args.rotate,
        "puzzle scattered"
    );

    let mut table = Table {
        manager,
        input: InputController::with_safe_area(area),
        rng: StdRng::seed_from_u64(seed as u64),
        jitter_px: args.jitter_px,
        moves: 0,
        taps: 0,
        commits: 0,
        tween_ms: 0.0,
    };
    let mut events = Vec::new();
    while !table.manager.is_complete() && table.moves < args.max_moves {
        table.moves += 1;
        let Some(target) = table.choose_target() else {
            break;
        };
        table.play(target)?;
        events.extend(table.manager.drain_events());
    }

    if let Some(path) = args.event_log.as_deref() {
        let mut out = Vec::new();
        for event in &events {
            write_event_frame(&mut out, event)?;
        }
        std::fs::write(path, &out)?;
        debug!(path = %path.display(), events = events.len(), bytes = out.len(), "event log written");
    }

    let connections = events
        .iter()
        .filter(|event| event.as_connected().is_some())
        .count();
    Ok(SolveReport {
        completed: table.manager.is_complete(),
        pieces: table.manager.total_pieces(),
        clusters_left: table.manager.cluster_count(),
        moves: table.moves,
        taps: table.taps,
        connections,
        tween_ms: table.tween_ms,
    })
}

fn validate_args(args: &SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.cols == 0 || args.rows == 0 {
        return Err(err_msg("cols and rows must be positive"));
    }
    let pieces = args
        .cols
        .checked_mul(args.rows)
        .ok_or_else(|| err_msg("grid is too large"))?;
    if pieces < 2 {
        return Err(err_msg("a puzzle needs at least two pieces"));
    }
    if !(args.jitter_px.is_finite() && args.jitter_px >= 0.0) {
        return Err(err_msg("jitter_px must be a non-negative number"));
    }
    Ok(())
}

impl Table {
    fn choose_target(&mut self) -> Option<Target> {
        let clusters: Vec<ClusterId> = self.manager.clusters().map(|cluster| cluster.id()).collect();
        if clusters.len() < 2 {
            return None;
        }
        for _ in 0..clusters.len() * 4 {
            let cluster = clusters[self.rng.random_range(0..clusters.len())];
            let Some(entry) = self.manager.cluster(cluster) else {
                continue;
            };
            let mut options = Vec::new();
            for piece in entry.pieces() {
                for coord in piece.coord().neighbors() {
                    let Some(other) = self.manager.piece_at(coord) else {
                        continue;
                    };
                    if self.manager.cluster_of(other) != Some(cluster) {
                        options.push((piece.id(), other));
                    }
                }
            }
            if options.is_empty() {
                continue;
            }
            let (moving_piece, static_piece) = options[self.rng.random_range(0..options.len())];
            return Some(Target {
                cluster,
                moving_piece,
                static_piece,
            });
        }
        None
    }

    fn play(&mut self, target: Target) -> Result<(), Box<dyn std::error::Error>> {
        let Some(static_cluster) = self.manager.cluster_of(target.static_piece) else {
            return Ok(());
        };
        let Some(want) = self.manager.cluster(static_cluster).map(|c| c.rotation()) else {
            return Ok(());
        };
        let mut cluster = target.cluster;
        while let Some(have) = self.manager.cluster(cluster).map(|c| c.rotation()) {
            if have == want {
                break;
            }
            let Some(grab) = self.grab_point(cluster, target.moving_piece) else {
                return Ok(());
            };
            let Some(release) = self.gesture(cluster, grab, &[])? else {
                return Ok(());
            };
            self.taps += 1;
            cluster = release.cluster;
            if self.manager.cluster_of(target.static_piece) == Some(cluster) {
                return Ok(());
            }
        }

        let (Some(current), Some(goal)) = (
            self.manager.core_origin_global(target.moving_piece),
            self.goal_anchor(target),
        ) else {
            return Ok(());
        };
        let Some(grab) = self.grab_point(cluster, target.moving_piece) else {
            return Ok(());
        };
        let jitter = self.jitter_px;
        let goal = (
            goal.0 + self.rng.random_range(-jitter..=jitter),
            goal.1 + self.rng.random_range(-jitter..=jitter),
        );
        let drop = (grab.0 + goal.0 - current.0, grab.1 + goal.1 - current.1);
        // Swing out past the tap slop first so short hops still count as drags.
        let swing = self.manager.rules().tap_slop * 4.0 + 1.0;
        let path = [
            (grab.0 + swing, grab.1 - swing),
            ((grab.0 + drop.0) * 0.5, (grab.1 + drop.1) * 0.5),
            drop,
        ];
        if let Some(release) = self.gesture(cluster, grab, &path)? {
            debug!(
                cluster = release.cluster,
                moving_piece = target.moving_piece,
                static_piece = target.static_piece,
                settle = ?release.settle,
                "drop"
            );
        }
        Ok(())
    }

    /// Picks `cluster` off the pile at `grab`, follows `path` and lets go.
    /// An empty path is a tap.
    fn gesture(
        &mut self,
        cluster: ClusterId,
        grab: Point,
        path: &[Point],
    ) -> Result<Option<Release>, Box<dyn std::error::Error>> {
        self.manager.bring_to_front(cluster);
        if self.input.pointer_down(&mut self.manager, BOT_POINTER, grab) != Some(cluster) {
            self.input.pointer_cancel(&mut self.manager, BOT_POINTER);
            warn!(cluster, "grab missed its cluster");
            return Ok(None);
        }
        let mut last = grab;
        for point in path {
            self.input.pointer_move(&mut self.manager, BOT_POINTER, *point);
            last = *point;
        }
        let commits = &mut self.commits;
        let tween_ms = &mut self.tween_ms;
        let mut animator = |step: &CommitStep| {
            *commits += 1;
            *tween_ms += step.duration_ms;
        };
        let release = self
            .input
            .pointer_up(&mut self.manager, BOT_POINTER, last, &mut animator)?;
        Ok(release)
    }

    fn goal_anchor(&self, target: Target) -> Option<Point> {
        let cluster = self.manager.cluster(self.manager.cluster_of(target.static_piece)?)?;
        let moving = self.manager.cluster(self.manager.cluster_of(target.moving_piece)?)?;
        let def = moving.piece(target.moving_piece)?.def();
        let other = cluster.piece(target.static_piece)?.def();
        let solved = (
            (def.col - other.col) as f32 * def.piece_width,
            (def.row - other.row) as f32 * def.piece_height,
        );
        let offset = self
            .manager
            .layer()
            .vector_to_global(cluster.rotation().rotate(solved));
        let anchor = self.manager.core_origin_global(target.static_piece)?;
        Some((anchor.0 + offset.0, anchor.1 + offset.1))
    }

    fn grab_point(&self, cluster: ClusterId, piece: PieceId) -> Option<Point> {
        let entry = self.manager.cluster(cluster)?;
        let center = entry.transform().apply(entry.piece(piece)?.core_center_local());
        Some(self.manager.layer().to_global(center))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(cols: u32, rows: u32, rotate: bool) -> SolveArgs {
        SolveArgs {
            cols,
            rows,
            piece_width: 100.0,
            piece_height: 80.0,
            seed: Some("0x5eed".to_string()),
            rules: None,
            rotate,
            event_log: None,
            max_moves: 5_000,
            jitter_px: 4.0,
        }
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert!(validate_args(&args(0, 4, false)).is_err());
        assert!(validate_args(&args(1, 1, false)).is_err());
        assert!(validate_args(&args(2, 1, false)).is_ok());
    }

    #[test]
    fn rejects_grids_whose_piece_count_overflows() {
        let err = validate_args(&args(u32::MAX, 2, false)).unwrap_err();
        assert_eq!(err.to_string(), "grid is too large");
        assert!(validate_args(&args(65_536, 65_536, false)).is_err());
    }

    #[test]
    fn bot_solves_small_puzzle() {
        let report = run(args(3, 2, false)).unwrap();
        assert!(report.completed, "{report}");
        assert_eq!(report.pieces, 6);
        assert_eq!(report.clusters_left, 1);
        assert_eq!(report.connections, 5);
        assert!(report.moves >= 1);
        assert!(report.to_string().starts_with("solved 6 pieces"));
    }

    #[test]
    fn bot_solves_rotated_puzzle_and_logs_events() {
        let path = std::env::temp_dir().join(format!("kumiawase-events-{}.bin", std::process::id()));
        let mut args = args(3, 3, true);
        args.event_log = Some(path.clone());
        let report = run(args).unwrap();
        assert!(report.completed, "{report}");
        let bytes = std::fs::read(&path).unwrap();
        let events = kumiawase_core::read_event_frames(&bytes).unwrap();
        let _ = std::fs::remove_file(&path);
        let completed = events
            .iter()
            .filter(|event| event.as_completed().is_some())
            .count();
        assert_eq!(completed, 1);
        assert_eq!(
            events
                .iter()
                .filter(|event| event.as_connected().is_some())
                .count(),
            8
        );
    }
}
