use isotet_engine::{GameLogic, Step};

use crate::error::Result;
use crate::generator::Rng;
use crate::settings::GameSettings;
use crate::state::{Command, GameState};
use crate::tileset::TilesetEvent;

/// A session as a pure step function over [`GameState`].
#[derive(Debug, Clone)]
pub struct IsoTetGame {
    initial: GameState,
}

impl IsoTetGame {
    pub fn new(settings: &GameSettings) -> Result<Self> {
        Ok(Self {
            initial: GameState::new(settings)?,
        })
    }

    pub fn standard(seed: u64) -> Result<Self> {
        Self::new(&GameSettings {
            seed,
            ..GameSettings::default()
        })
    }
}

impl GameLogic for IsoTetGame {
    type State = GameState;
    type Input = Command;
    type Event = TilesetEvent;

    fn initial_state(&self) -> Self::State {
        self.initial.clone()
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Step<Self::State, Self::Event> {
        let mut next = state.clone();
        let events = next.apply_and_drain(input);
        Step {
            state: next,
            events,
        }
    }
}

/// Seeded stream of plausible player input, weighted towards ticks so pieces
/// actually fall.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: Rng,
}

impl RandomAgent {
    pub fn new(seed: u64) -> Self {
        Self { rng: Rng::new(seed) }
    }

    pub fn next_command(&mut self) -> Command {
        match self.rng.next_below(10) {
            0 => Command::Translate { di: -1, dj: 0 },
            1 => Command::Translate { di: 1, dj: 0 },
            2 => Command::Translate { di: 0, dj: -1 },
            3 => Command::Translate { di: 0, dj: 1 },
            4 => Command::Rotate { quarter_turns: 1 },
            5 => Command::QuickDrop,
            6 => Command::Advance { dt_ms: 400 },
            _ => Command::Tick,
        }
    }

    pub fn commands(&mut self, count: usize) -> Vec<Command> {
        (0..count).map(|_| self.next_command()).collect()
    }
}
