pub mod profiling;
pub mod regression;

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Linear history of states with a cursor. Recording while rewound drops the
/// abandoned branch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeMachine<State> {
    states: Vec<State>,
    frame: usize,
}

impl<State> TimeMachine<State> {
    pub fn new(initial_state: State) -> Self {
        Self {
            states: vec![initial_state],
            frame: 0,
        }
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Index of the newest recorded state.
    pub fn last_frame(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// Recorded states past the cursor, lost on the next `record`.
    pub fn frames_ahead(&self) -> usize {
        self.last_frame() - self.frame
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.states[self.frame]
    }

    pub fn state_at(&self, frame: usize) -> Option<&State> {
        self.states.get(frame)
    }

    pub fn history(&self) -> &[State] {
        &self.states
    }

    pub fn can_rewind(&self) -> bool {
        self.frame != 0
    }

    pub fn can_forward(&self) -> bool {
        self.frames_ahead() != 0
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.frame -= frames.min(self.frame);
        self.frame
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.seek(self.frame.saturating_add(frames))
    }

    pub fn seek(&mut self, frame: usize) -> usize {
        self.frame = frame.min(self.last_frame());
        self.frame
    }

    pub fn record(&mut self, state: State) -> usize {
        self.states.truncate(self.frame + 1);
        self.states.push(state);
        self.seek(usize::MAX)
    }

    fn check_cursor(&self) -> Result<(), String> {
        match self.states.len() {
            0 => Err("history is empty".to_string()),
            n if self.frame >= n => Err(format!("frame {} outside {n} states", self.frame)),
            _ => Ok(()),
        }
    }
}

fn invalid_data(path: &Path, what: impl std::fmt::Display) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("timemachine {}: {what}", path.display()),
    )
}

impl<State: Serialize + DeserializeOwned> TimeMachine<State> {
    /// Writes the whole history, creating parent directories as needed.
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir)?,
            _ => {}
        }
        let bytes = serde_json::to_vec(self).map_err(|e| invalid_data(path, e))?;
        fs::write(path, bytes)
    }

    /// Reads a history written by `save_json_file`. A cursor outside the
    /// history is `InvalidData`.
    pub fn load_json_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let tm: Self = serde_json::from_slice(&fs::read(path)?)
            .map_err(|e| invalid_data(path, format!("unreadable json: {e}")))?;
        tm.check_cursor().map_err(|e| invalid_data(path, e))?;
        Ok(tm)
    }
}

/// Result of advancing a game by one input: the successor state plus whatever
/// the step wants the outside world to know about.
#[derive(Debug, Clone, PartialEq)]
pub struct Step<State, Event> {
    pub state: State,
    pub events: Vec<Event>,
}

impl<State, Event> Step<State, Event> {
    pub fn quiet(state: State) -> Self {
        Self {
            state,
            events: Vec::new(),
        }
    }
}

pub trait GameLogic {
    type State;
    type Input;
    type Event;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Step<Self::State, Self::Event>;
}

/// Drives a `GameLogic` without any window or clock. Events produced by steps
/// pile up until the caller drains them.
#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    timemachine: TimeMachine<G::State>,
    pending_events: Vec<G::Event>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let timemachine = TimeMachine::new(game.initial_state());
        Self::from_timemachine(game, timemachine)
    }

    /// Resumes from a saved history; the cursor stays where it was saved.
    pub fn from_timemachine(game: G, timemachine: TimeMachine<G::State>) -> Self {
        Self {
            game,
            timemachine,
            pending_events: Vec::new(),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.timemachine.frame()
    }

    pub fn state(&self) -> &G::State {
        self.timemachine.state()
    }

    pub fn history(&self) -> &[G::State] {
        self.timemachine.history()
    }

    pub fn timemachine(&self) -> &TimeMachine<G::State> {
        &self.timemachine
    }

    pub fn pending_events(&self) -> &[G::Event] {
        &self.pending_events
    }

    pub fn drain_events(&mut self) -> Vec<G::Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Steps from the current frame and records the result, dropping any
    /// frames ahead of the cursor.
    pub fn step(&mut self, input: G::Input) -> usize {
        self.step_profiled(input, &mut ())
    }

    pub fn step_profiled<P: profiling::Profiler>(&mut self, input: G::Input, profiler: &mut P) -> usize {
        use std::time::Instant;

        let started = Instant::now();
        let Step { state, events } = self.game.step(self.timemachine.state(), input);
        let stepped = Instant::now();
        let frame = self.timemachine.record(state);
        let recorded = Instant::now();

        profiler.on_step(
            frame,
            profiling::StepTimings {
                step: stepped - started,
                record: recorded - stepped,
                total: recorded - started,
                events: events.len(),
            },
        );
        self.pending_events.extend(events);
        frame
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let start = self.frame();
        inputs.into_iter().fold(start, |_, input| self.step(input))
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.timemachine.rewind(frames)
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.timemachine.forward(frames)
    }

    pub fn seek(&mut self, frame: usize) -> usize {
        self.timemachine.seek(frame)
    }
}
