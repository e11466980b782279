use std::f64::consts::FRAC_PI_2;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::fall_timer::FallTimer;
use crate::generator::TetGenerator;
use crate::settings::GameSettings;
use crate::tileset::{Tileset, TilesetEvent};

/// Everything the input layer and the fall timer can ask of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Translate { di: i32, dj: i32 },
    /// Positive turns are counter-clockwise in the (i, j) plane.
    Rotate { quarter_turns: i32 },
    Drop { n: u32 },
    QuickDrop,
    Tick,
    /// Feed wall-clock time to the fall timer; due ticks run in order.
    Advance { dt_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub tileset: Tileset,
    pub generator: TetGenerator,
    pub fall_timer: FallTimer,
}

impl GameState {
    /// Builds the board, enqueues the first piece and makes it active.
    pub fn new(settings: &GameSettings) -> Result<Self> {
        let settings = settings.sanitized();
        let tileset =
            Tileset::with_config(settings.map_width, settings.map_height, settings.tileset)?;
        let generator = TetGenerator::new(
            settings.seed,
            settings.spawn_point(),
            settings.tileset.fall_height as i32,
        );

        let mut state = Self {
            tileset,
            generator,
            fall_timer: FallTimer::new(settings.fall_delay()),
        };
        state.spawn_next();
        Ok(state)
    }

    pub fn tileset(&self) -> &Tileset {
        &self.tileset
    }

    pub fn is_game_over(&self) -> bool {
        self.tileset.is_game_over()
    }

    fn spawn_next(&mut self) {
        let tet = self.generator.next_tetromino();
        debug!(shape = ?tet.shape, "spawning piece");
        self.tileset.add_tet(tet);
        self.tileset.init_mode();
    }

    /// One fall interval. An empty board gets a fresh piece.
    pub fn tick(&mut self) {
        if self.tileset.is_game_over() {
            return;
        }
        if !self.tileset.play() {
            self.spawn_next();
        }
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Translate { di, dj } => {
                self.tileset.translate_active(di, dj);
            }
            Command::Rotate { quarter_turns } => {
                self.tileset.spin_active(quarter_turns as f64 * FRAC_PI_2);
            }
            Command::Drop { n } => {
                self.tileset.drop_active(n);
            }
            Command::QuickDrop => {
                self.tileset.quick_drop();
            }
            Command::Tick => self.tick(),
            Command::Advance { dt_ms } => {
                let due = self.fall_timer.advance(Duration::from_millis(dt_ms));
                for _ in 0..due {
                    if self.tileset.is_game_over() {
                        break;
                    }
                    self.tick();
                }
            }
        }
    }

    /// Applies `command` and hands back whatever the board reported.
    pub fn apply_and_drain(&mut self, command: Command) -> Vec<TilesetEvent> {
        self.apply(command);
        self.tileset.drain_events()
    }
}
