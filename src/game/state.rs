//! The game loop orchestrator.
//!
//! [`Playfield`] owns everything that changes during a game: the grid, the
//! single active projectile, the queued next color and the aim angle. Each
//! fixed tick runs one pass of the state machine:
//!
//! ```text
//! Aiming --fire--> Firing --snap--> Resolving --(same tick)--> Aiming
//!                                             \--> Cleared | GameOver
//! ```
//!
//! Win: clear every bubble. Lose: the grid fills up with no empty cell left.

use bevy::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use super::{
    bubble::BubbleColor,
    cluster::{check_match, clear},
    grid::HexGrid,
    hex::{HexCoord, Lattice},
    projectile::Projectile,
    snap::{SnapOutcome, try_snap},
};
use crate::config::GameConfig;

pub(super) fn plugin(app: &mut App) {
    app.add_message::<ClusterPopped>();
    app.add_message::<RoundEnded>();

    app.add_systems(Startup, setup_playfield);
    app.add_systems(FixedUpdate, advance_playfield);
    app.add_systems(Update, report_results);
}

/// Points awarded per bubble popped in a cluster.
const POINTS_PER_BUBBLE: u32 = 10;

/// Message sent when a cluster is popped.
#[derive(Message, Debug, Clone)]
pub struct ClusterPopped {
    pub coords: Vec<HexCoord>,
    pub color: BubbleColor,
}

/// Message sent when a game reaches a terminal phase.
#[derive(Message, Debug, Clone)]
pub struct RoundEnded {
    pub phase: Phase,
    pub score: GameScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Projectile resting at the launcher, aim follows input.
    #[default]
    Aiming,
    /// Projectile in flight.
    Firing,
    /// Landed bubble being written and matched. Never observed between ticks.
    Resolving,
    /// Every bubble popped.
    Cleared,
    /// No empty cell left to land in.
    GameOver,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Cleared | Phase::GameOver)
    }
}

/// In-memory tally for the current game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameScore {
    pub score: u32,
    pub bubbles_popped: u32,
    pub clusters_popped: u32,
    pub shots_fired: u32,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Nothing in flight.
    Idle,
    InFlight,
    Landed {
        coord: HexCoord,
        color: BubbleColor,
        /// Cells cleared by the resulting match, empty when none.
        popped: Vec<HexCoord>,
    },
    /// The shot was discarded without touching the grid.
    Lost,
    /// No empty cell remained; the game is over.
    GridFull,
}

/// An occupied cell as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    pub coord: HexCoord,
    pub center: Vec2,
    pub color: BubbleColor,
}

/// Read-only view of the field for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSnapshot {
    pub cells: Vec<CellView>,
    pub projectile_position: Vec2,
    pub projectile_color: BubbleColor,
    pub next_color: BubbleColor,
    pub aim: f32,
    pub phase: Phase,
}

#[derive(Resource, Debug)]
pub struct Playfield {
    config: GameConfig,
    lattice: Lattice,
    grid: HexGrid,
    projectile: Projectile,
    next: BubbleColor,
    aim: f32,
    phase: Phase,
    score: GameScore,
    rng: StdRng,
}

impl Playfield {
    /// Start a game with a freshly filled grid.
    pub fn new(config: GameConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let grid = initial_grid(&config, &mut rng);
        Self::with_grid(config, grid, rng)
    }

    /// Start a game on a prepared grid.
    pub fn with_grid(config: GameConfig, grid: HexGrid, mut rng: StdRng) -> Self {
        let origin = config.grid_origin();
        let lattice = Lattice::new(
            Vec2::new(origin.x, origin.y),
            config.bubble_radius,
            config.row_spacing,
        );
        let palette_len = config.palette.len();
        let loaded = BubbleColor::random(&mut rng, palette_len);
        let next = BubbleColor::random(&mut rng, palette_len);
        let projectile = Projectile::new(config.launcher(), config.bubble_radius, loaded);

        Self {
            config,
            lattice,
            grid,
            projectile,
            next,
            aim: 0.0,
            phase: Phase::Aiming,
            score: GameScore::default(),
            rng,
        }
    }

    /// Throw away the current game and start a new one.
    pub fn restart(&mut self) {
        self.grid = initial_grid(&self.config, &mut self.rng);
        self.score = GameScore::default();
        self.aim = 0.0;
        self.phase = Phase::Aiming;
        self.reload();
        info!("New game with {} bubbles", self.grid.len());
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn projectile(&self) -> &Projectile {
        &self.projectile
    }

    pub fn next_color(&self) -> BubbleColor {
        self.next
    }

    pub fn aim_angle(&self) -> f32 {
        self.aim
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> GameScore {
        self.score
    }

    /// Point the launcher. Ignored while a shot is in flight.
    pub fn aim(&mut self, angle: f32) {
        if self.phase == Phase::Aiming {
            self.aim = angle;
        }
    }

    /// Launch the loaded bubble. Returns whether a shot was fired.
    ///
    /// Ignored while a projectile is in flight. After the game has ended this
    /// starts a new one instead.
    pub fn fire(&mut self) -> bool {
        match self.phase {
            Phase::Aiming => {
                self.projectile.fire(self.aim, self.config.projectile_speed);
                self.phase = Phase::Firing;
                self.score.shots_fired += 1;
                info!(
                    "Fired {:?} at {:.3} rad (shot {})",
                    self.projectile.color, self.aim, self.score.shots_fired
                );
                true
            }
            Phase::Cleared | Phase::GameOver => {
                self.restart();
                false
            }
            Phase::Firing | Phase::Resolving => false,
        }
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != Phase::Firing {
            return TickOutcome::Idle;
        }

        self.projectile.step(self.config.field_width);
        self.projectile.bounce_off_ceiling();

        if self.projectile.position.y - self.projectile.radius > self.config.field_height {
            warn!(
                "Projectile left the field at {:?}, discarding shot",
                self.projectile.position
            );
            self.reload();
            self.phase = Phase::Aiming;
            return TickOutcome::Lost;
        }

        match try_snap(
            &mut self.projectile,
            &self.grid,
            &self.lattice,
            self.config.snap_threshold(),
        ) {
            SnapOutcome::InFlight => TickOutcome::InFlight,
            SnapOutcome::GridFull => {
                warn!("No empty cell left to land in, game over");
                self.reload();
                self.phase = Phase::GameOver;
                TickOutcome::GridFull
            }
            SnapOutcome::Snapped(coord) => {
                self.phase = Phase::Resolving;
                self.resolve(coord)
            }
        }
    }

    /// Write the parked projectile into the grid, pop any match and reload.
    fn resolve(&mut self, coord: HexCoord) -> TickOutcome {
        let color = self.projectile.color;
        if let Err(e) = self.grid.insert(coord, color) {
            error!("Failed to place bubble: {e}");
            self.reload();
            self.phase = Phase::Aiming;
            return TickOutcome::Lost;
        }
        info!("Bubble landed at {} with color {:?}", coord, color);

        let popped = check_match(&self.grid, coord, self.config.match_threshold);
        if !popped.is_empty() {
            let removed = clear(&mut self.grid, &popped) as u32;
            self.score.bubbles_popped += removed;
            self.score.clusters_popped += 1;
            self.score.score += removed * POINTS_PER_BUBBLE;
            info!(
                "Popped {} {:?} bubbles (total score: {})",
                removed, color, self.score.score
            );
        }

        self.reload();
        self.phase = if self.grid.is_empty() {
            info!("All bubbles cleared! Final score: {}", self.score.score);
            Phase::Cleared
        } else if self.grid.is_full() {
            info!("Grid is full, game over. Final score: {}", self.score.score);
            Phase::GameOver
        } else {
            Phase::Aiming
        };

        TickOutcome::Landed {
            coord,
            color,
            popped,
        }
    }

    /// Load the queued color into a fresh projectile and queue a new one.
    fn reload(&mut self) {
        self.projectile = Projectile::new(
            self.config.launcher(),
            self.config.bubble_radius,
            self.next,
        );
        self.next = BubbleColor::random(&mut self.rng, self.config.palette.len());
        debug!(
            "Reloaded with {:?}, next is {:?}",
            self.projectile.color, self.next
        );
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            cells: self
                .grid
                .iter()
                .map(|(coord, color)| CellView {
                    coord,
                    center: self.lattice.cell_center(coord),
                    color,
                })
                .collect(),
            projectile_position: self.projectile.position,
            projectile_color: self.projectile.color,
            next_color: self.next,
            aim: self.aim,
            phase: self.phase,
        }
    }
}

fn initial_grid(config: &GameConfig, rng: &mut StdRng) -> HexGrid {
    HexGrid::create_initial(
        config.rows,
        config.cols,
        config.initial_rows,
        config.palette.len(),
        rng,
    )
}

fn setup_playfield(mut commands: Commands, config: Res<GameConfig>) {
    let playfield = Playfield::new(config.clone());
    info!(
        "Created {}x{} grid with {} bubbles",
        config.rows,
        config.cols,
        playfield.grid().len()
    );
    commands.insert_resource(playfield);
}

/// Run one simulation tick and publish what happened.
fn advance_playfield(
    mut playfield: ResMut<Playfield>,
    mut popped: MessageWriter<ClusterPopped>,
    mut ended: MessageWriter<RoundEnded>,
) {
    let before = playfield.phase();
    if let TickOutcome::Landed {
        color,
        popped: coords,
        ..
    } = playfield.tick()
        && !coords.is_empty()
    {
        popped.write(ClusterPopped { coords, color });
    }

    if let Some(round) = round_ended(before, &playfield) {
        ended.write(round);
    }
}

/// The result to publish when the game has just reached a terminal phase.
fn round_ended(before: Phase, playfield: &Playfield) -> Option<RoundEnded> {
    (!before.is_finished() && playfield.phase().is_finished()).then(|| RoundEnded {
        phase: playfield.phase(),
        score: playfield.score(),
    })
}

/// Log the outcome of finished games.
fn report_results(mut ended: MessageReader<RoundEnded>) {
    for event in ended.read() {
        let verdict = match event.phase {
            Phase::Cleared => "WIN! Board cleared",
            _ => "GAME OVER",
        };
        info!(
            "{verdict}: score {}, {} bubbles in {} clusters over {} shots. Fire to play again.",
            event.score.score,
            event.score.bubbles_popped,
            event.score.clusters_popped,
            event.score.shots_fired
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: BubbleColor = BubbleColor(0);
    const BLUE: BubbleColor = BubbleColor(1);

    fn config() -> GameConfig {
        GameConfig {
            seed: Some(9),
            ..default()
        }
    }

    fn playfield_with(cells: &[((i32, i32), BubbleColor)]) -> Playfield {
        let config = config();
        let mut grid = HexGrid::new(config.rows, config.cols);
        for &((row, col), color) in cells {
            grid.insert(HexCoord::new(row, col), color).unwrap();
        }
        Playfield::with_grid(config, grid, StdRng::seed_from_u64(9))
    }

    fn run_until_resolved(playfield: &mut Playfield) -> TickOutcome {
        for _ in 0..10_000 {
            match playfield.tick() {
                TickOutcome::InFlight => continue,
                outcome => return outcome,
            }
        }
        panic!("projectile never resolved");
    }

    /// Load a projectile of `color` just below `coord` so the next shot
    /// straight up snaps into it.
    fn load_below(playfield: &mut Playfield, coord: HexCoord, color: BubbleColor) {
        let center = playfield.lattice().cell_center(coord);
        playfield.projectile.position = center + Vec2::new(0.0, 25.0);
        playfield.projectile.color = color;
        playfield.aim(0.0);
    }

    #[test]
    fn test_new_playfield_starts_aiming_with_filled_rows() {
        let playfield = Playfield::new(config());
        assert_eq!(playfield.phase(), Phase::Aiming);
        assert_eq!(playfield.grid().len(), 15 + 14 + 15);
        assert!(!playfield.projectile().moving);
        assert_eq!(playfield.projectile().position, Vec2::new(400.0, 550.0));
    }

    #[test]
    fn test_same_seed_same_board() {
        let a = Playfield::new(config()).snapshot();
        let b = Playfield::new(config()).snapshot();
        assert_eq!(a, b);
    }

    #[test]
    fn test_tick_while_aiming_is_idle() {
        let mut playfield = playfield_with(&[]);
        assert_eq!(playfield.tick(), TickOutcome::Idle);
        assert!(!playfield.projectile().moving);
    }

    #[test]
    fn test_fire_is_ignored_while_in_flight() {
        let mut playfield = playfield_with(&[((0, 0), RED)]);
        assert!(playfield.fire());
        assert_eq!(playfield.phase(), Phase::Firing);
        let velocity = playfield.projectile().velocity;

        playfield.aim(1.0);
        assert!(!playfield.fire());
        assert_eq!(playfield.projectile().velocity, velocity);
        assert_eq!(playfield.aim_angle(), 0.0);
        assert_eq!(playfield.score().shots_fired, 1);
    }

    #[test]
    fn test_shot_lands_and_reloads_with_queued_color() {
        let mut playfield = playfield_with(&[((0, 5), BLUE)]);
        let queued = playfield.next_color();
        let loaded = playfield.projectile().color;
        playfield.fire();

        // Straight up from x = 400 the first empty cell within reach is the
        // bottom row cell directly above the launcher.
        let TickOutcome::Landed { coord, color, .. } = run_until_resolved(&mut playfield) else {
            panic!("expected the shot to land");
        };
        assert_eq!(coord, HexCoord::new(9, 9));
        assert_eq!(color, loaded);
        assert_eq!(playfield.phase(), Phase::Aiming);
        assert!(playfield.grid().is_occupied(coord));
        assert_eq!(playfield.projectile().color, queued);
        assert!(!playfield.projectile().moving);
        assert_eq!(playfield.projectile().position, playfield.config().launcher());
    }

    #[test]
    fn test_shots_never_double_occupy() {
        let mut playfield = playfield_with(&[((0, 7), BLUE)]);
        let mut landed = Vec::new();
        for _ in 0..12 {
            playfield.fire();
            if let TickOutcome::Landed { coord, popped, .. } = run_until_resolved(&mut playfield) {
                landed.retain(|c| !popped.contains(c));
                if !popped.contains(&coord) {
                    assert!(!landed.contains(&coord), "{coord} was filled twice");
                    landed.push(coord);
                }
            }
            if playfield.phase().is_finished() {
                break;
            }
        }
        let snapshot = playfield.snapshot();
        let mut coords: Vec<_> = snapshot.cells.iter().map(|c| c.coord).collect();
        let total = coords.len();
        coords.dedup();
        assert_eq!(coords.len(), total);
    }

    #[test]
    fn test_end_to_end_cluster_pops() {
        // Three reds at (0,0), (0,1), (1,0) plus a red shot into (1,1), which
        // touches (0,1) from the odd row. A blue anchor keeps the board from
        // being cleared.
        let mut playfield = playfield_with(&[
            ((0, 0), RED),
            ((0, 1), RED),
            ((1, 0), RED),
            ((0, 10), BLUE),
        ]);
        let target = HexCoord::new(1, 1);
        load_below(&mut playfield, target, RED);
        playfield.fire();

        let outcome = run_until_resolved(&mut playfield);
        let TickOutcome::Landed { coord, color, popped } = outcome else {
            panic!("expected a landing, got {outcome:?}");
        };
        assert_eq!(coord, target);
        assert_eq!(color, RED);
        assert_eq!(popped.len(), 4);
        for cell in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert!(!playfield.grid().is_occupied(HexCoord::new(cell.0, cell.1)));
        }
        assert!(playfield.grid().is_occupied(HexCoord::new(0, 10)));
        assert_eq!(playfield.score().bubbles_popped, 4);
        assert_eq!(playfield.score().score, 40);
        assert_eq!(playfield.phase(), Phase::Aiming);
    }

    #[test]
    fn test_clearing_last_bubbles_wins() {
        let mut playfield = playfield_with(&[((0, 0), RED), ((0, 1), RED)]);
        load_below(&mut playfield, HexCoord::new(0, 2), RED);
        playfield.fire();

        let outcome = run_until_resolved(&mut playfield);
        assert!(matches!(outcome, TickOutcome::Landed { ref popped, .. } if popped.len() == 3));
        assert_eq!(playfield.phase(), Phase::Cleared);
        assert!(playfield.grid().is_empty());
    }

    #[test]
    fn test_full_grid_ends_the_game() {
        let config = GameConfig {
            rows: 2,
            cols: 2,
            palette: vec![[1, 0, 0], [0, 1, 0], [0, 0, 1], [1, 1, 0]],
            match_threshold: 4,
            ..config()
        };
        let mut grid = HexGrid::new(2, 2);
        grid.insert(HexCoord::new(0, 0), BubbleColor(0)).unwrap();
        grid.insert(HexCoord::new(0, 1), BubbleColor(1)).unwrap();
        grid.insert(HexCoord::new(1, 0), BubbleColor(2)).unwrap();
        grid.insert(HexCoord::new(1, 1), BubbleColor(3)).unwrap();
        let mut playfield = Playfield::with_grid(config, grid, StdRng::seed_from_u64(1));

        let queued = playfield.next_color();
        playfield.fire();
        assert_eq!(run_until_resolved(&mut playfield), TickOutcome::GridFull);
        assert_eq!(playfield.phase(), Phase::GameOver);
        assert_eq!(playfield.grid().len(), 4);

        // The discarded shot is not left hanging mid-flight.
        assert!(!playfield.projectile().moving);
        assert_eq!(playfield.projectile().position, playfield.config().launcher());
        assert_eq!(playfield.projectile().color, queued);
    }

    #[test]
    fn test_landing_in_last_empty_cell_ends_the_game() {
        let config = GameConfig {
            rows: 2,
            cols: 2,
            palette: vec![[1, 0, 0], [0, 1, 0], [0, 0, 1], [1, 1, 0]],
            match_threshold: 4,
            ..config()
        };
        let mut grid = HexGrid::new(2, 2);
        grid.insert(HexCoord::new(0, 0), BubbleColor(0)).unwrap();
        grid.insert(HexCoord::new(0, 1), BubbleColor(1)).unwrap();
        grid.insert(HexCoord::new(1, 0), BubbleColor(2)).unwrap();
        let mut playfield = Playfield::with_grid(config, grid, StdRng::seed_from_u64(1));

        let last = HexCoord::new(1, 1);
        load_below(&mut playfield, last, BubbleColor(3));
        playfield.fire();
        let before = playfield.phase();

        let outcome = run_until_resolved(&mut playfield);
        assert!(
            matches!(outcome, TickOutcome::Landed { coord, ref popped, .. } if coord == last && popped.is_empty()),
            "unexpected outcome {outcome:?}"
        );
        assert!(playfield.grid().is_full());
        assert_eq!(playfield.phase(), Phase::GameOver);

        let round = round_ended(before, &playfield).expect("game over should be reported");
        assert_eq!(round.phase, Phase::GameOver);
        assert_eq!(round.score.shots_fired, 1);
        assert!(round_ended(playfield.phase(), &playfield).is_none());
    }

    #[test]
    fn test_shot_leaving_the_bottom_is_discarded() {
        let mut playfield = playfield_with(&[((0, 5), BLUE)]);
        let queued = playfield.next_color();
        playfield.fire();
        playfield.projectile.position = Vec2::new(700.0, 590.0);
        playfield.projectile.velocity = Vec2::new(0.0, 10.0);

        assert_eq!(run_until_resolved(&mut playfield), TickOutcome::Lost);
        assert_eq!(playfield.phase(), Phase::Aiming);
        assert!(!playfield.projectile().moving);
        assert_eq!(playfield.projectile().position, playfield.config().launcher());
        assert_eq!(playfield.projectile().color, queued);
        assert_eq!(playfield.grid().len(), 1);
    }

    #[test]
    fn test_bank_shot_off_the_wall_pops_a_cluster() {
        const ANGLE: f32 = 1.25;
        let anchor = ((0, 0), BLUE);

        // Trace the shot once to find where it settles. Occupying other cells
        // only removes snap candidates, so the same shot lands in the same cell.
        let mut trial = playfield_with(&[anchor]);
        trial.aim(ANGLE);
        trial.fire();
        let mut bounced = false;
        let target = loop {
            match trial.tick() {
                TickOutcome::InFlight => bounced |= trial.projectile().velocity.x < 0.0,
                TickOutcome::Landed { coord, .. } => break coord,
                outcome => panic!("trial shot ended with {outcome:?}"),
            }
        };
        assert!(bounced, "shot should come off the right wall");

        let mates: Vec<_> = target
            .neighbors()
            .into_iter()
            .filter(|&n| trial.grid().contains(n) && n != HexCoord::new(0, 0))
            .take(2)
            .collect();
        assert_eq!(mates.len(), 2);

        let mut cells = vec![anchor];
        cells.extend(mates.iter().map(|n| ((n.row, n.col), RED)));
        let mut playfield = playfield_with(&cells);
        playfield.projectile.color = RED;
        playfield.aim(ANGLE);
        assert!(playfield.fire());

        let outcome = run_until_resolved(&mut playfield);
        let TickOutcome::Landed { coord, popped, .. } = outcome else {
            panic!("expected a landing, got {outcome:?}");
        };
        assert_eq!(coord, target);
        assert_eq!(popped.len(), 3);
        assert_eq!(playfield.grid().len(), 1);
        assert_eq!(playfield.score().score, 30);
        assert_eq!(playfield.phase(), Phase::Aiming);
    }

    #[test]
    fn test_fire_after_game_over_restarts() {
        let mut playfield = playfield_with(&[((0, 0), RED)]);
        playfield.phase = Phase::GameOver;
        playfield.score.score = 120;

        assert!(!playfield.fire());
        assert_eq!(playfield.phase(), Phase::Aiming);
        assert_eq!(playfield.score(), GameScore::default());
        assert_eq!(playfield.grid().len(), 15 + 14 + 15);
    }

    #[test]
    fn test_snapshot_reports_cell_centers() {
        let playfield = playfield_with(&[((1, 3), BLUE)]);
        let snapshot = playfield.snapshot();
        assert_eq!(snapshot.cells.len(), 1);
        assert_eq!(snapshot.cells[0].coord, HexCoord::new(1, 3));
        assert_eq!(snapshot.cells[0].center, Vec2::new(20.0 + 120.0 + 20.0, 50.0 + 36.0));
        assert_eq!(snapshot.cells[0].color, BLUE);
        assert_eq!(snapshot.phase, Phase::Aiming);
        assert_eq!(snapshot.next_color, playfield.next_color());
    }
}
