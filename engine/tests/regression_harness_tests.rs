use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use isotet_engine::{
    GameLogic, Step,
    regression::{
        StateHashGolden, assert_or_update_golden_json, load_golden_json,
        record_then_replay_and_compare,
    },
};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("isotet_engine_regression_{tag}_{nanos}"))
}

#[derive(Debug, Clone)]
struct ColumnGame {
    columns: usize,
}

#[derive(Debug, Clone, Copy)]
struct Stack {
    column: usize,
}

impl GameLogic for ColumnGame {
    type State = Vec<u32>;
    type Input = Stack;
    type Event = usize;

    fn initial_state(&self) -> Self::State {
        vec![0; self.columns]
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Step<Self::State, Self::Event> {
        let mut next = state.clone();
        match next.get_mut(input.column) {
            Some(height) => {
                *height += 1;
                Step {
                    state: next,
                    events: vec![input.column],
                }
            }
            None => Step::quiet(next),
        }
    }
}

#[test]
fn record_replay_roundtrips_state_hashes() {
    let dir = unique_temp_dir("roundtrip");
    let inputs = [0, 1, 1, 3, 9].map(|column| Stack { column });

    let artifacts =
        record_then_replay_and_compare("columns", &dir, ColumnGame { columns: 4 }, inputs)
            .expect("record and replay");

    assert!(artifacts.state_json.exists());
    assert_eq!(artifacts.hashes.len(), 6);
    // The out-of-range stack leaves the state unchanged.
    assert_eq!(artifacts.hashes[4], artifacts.hashes[5]);

    let _ = fs::remove_dir_all(dir);
}

#[test]
fn golden_is_written_then_enforced() {
    let dir = unique_temp_dir("golden");
    let path = dir.join("goldens").join("columns.json");

    let golden = StateHashGolden::new("columns", vec!["aa".into(), "bb".into()]);
    assert_or_update_golden_json(&path, &golden, false).expect("first run writes golden");
    assert_eq!(load_golden_json(&path).expect("load golden"), golden);

    assert_or_update_golden_json(&path, &golden, false).expect("identical golden passes");

    let drifted = StateHashGolden::new("columns", vec!["aa".into(), "cc".into()]);
    let err = assert_or_update_golden_json(&path, &drifted, false).expect_err("drift detected");
    assert!(err.to_string().contains("frame 1"));

    assert_or_update_golden_json(&path, &drifted, true).expect("update rewrites");
    assert_eq!(load_golden_json(&path).expect("reload golden"), drifted);

    let _ = fs::remove_dir_all(dir);
}
