//! Property tests over random command sequences on small boards.
//!
//! Invariants covered:
//! - Every placed block has its occupancy bit set and sits inside the interior.
//! - Occupancy never has a bit set without a placed block behind it.
//! - The ghost always matches the active piece's footprint at the highest
//!   first-valid height.
//! - Translation and rotation are all-or-nothing.
//! - Score never decreases and the game, once over, stays over.

use std::collections::BTreeSet;
use std::f64::consts::FRAC_PI_2;

use isotet::coordinate::Coordinate;
use isotet::settings::GameSettings;
use isotet::state::{Command, GameState};
use isotet::tileset::Tileset;
use proptest::prelude::*;

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        (-2i32..=2, -2i32..=2).prop_map(|(di, dj)| Command::Translate { di, dj }),
        (-2i32..=2).prop_map(|quarter_turns| Command::Rotate { quarter_turns }),
        (1u32..4).prop_map(|n| Command::Drop { n }),
        Just(Command::QuickDrop),
        Just(Command::Tick),
        (0u64..2500).prop_map(|dt_ms| Command::Advance { dt_ms }),
    ]
}

fn assert_board_consistent(t: &Tileset) {
    let mut from_blocks = BTreeSet::new();
    for block in t.placed_blocks() {
        let pos = block.pos();
        assert!(!t.is_block_out_of_bounds(pos), "placed block at {pos} outside interior");
        assert!(t.is_occupied_at_height(pos, block.height()));
        from_blocks.insert((pos, block.height()));
    }

    let mut from_graph = BTreeSet::new();
    for node in t.graph().nodes() {
        for h in node.occupied_heights() {
            from_graph.insert((node.coord(), h));
        }
    }
    assert_eq!(from_graph, from_blocks);

    match (t.active_tet(), t.ghost()) {
        (Some(active), Some(ghost)) => {
            assert_eq!(ghost.positions(), active.positions());
            assert_eq!(ghost.landing_height(), t.landing_height(active));
            assert!(ghost.blocks().iter().all(|b| b.height() == ghost.landing_height()));
        }
        (None, None) => {}
        (active, ghost) => panic!("active {active:?} and ghost {ghost:?} out of step"),
    }
}

fn anchors(t: &Tileset) -> Option<Vec<(Coordinate, i32)>> {
    t.active_tet()
        .map(|a| a.blocks().iter().map(|b| (b.pos(), b.height())).collect())
}

proptest! {
    #[test]
    fn random_sessions_keep_the_board_consistent(
        seed in any::<u64>(),
        side in 4usize..9,
        commands in prop::collection::vec(command(), 1..120),
    ) {
        let settings = GameSettings {
            map_width: side,
            map_height: side,
            seed,
            ..GameSettings::default()
        };
        let mut state = GameState::new(&settings).expect("state");
        let mut last_score = 0;
        let mut was_over = false;

        for command in commands {
            state.apply(command);
            let t = state.tileset();
            assert_board_consistent(t);

            prop_assert!(t.score() >= last_score);
            last_score = t.score();
            if was_over {
                prop_assert!(t.is_game_over());
            }
            was_over = t.is_game_over();
        }
    }

    #[test]
    fn rejected_moves_do_not_mutate(
        seed in any::<u64>(),
        di in -3i32..=3,
        dj in -3i32..=3,
        quarter_turns in -3i32..=3,
    ) {
        let settings = GameSettings {
            map_width: 5,
            map_height: 5,
            seed,
            ..GameSettings::default()
        };
        let mut state = GameState::new(&settings).expect("state");
        let t = &mut state.tileset;

        let before = t.snapshot();
        let start = anchors(t);
        if t.translate_active(di, dj) {
            let moved = anchors(t).expect("active");
            for ((b, hb), (a, ha)) in start.expect("active").iter().zip(&moved) {
                prop_assert_eq!(*a, b.offset(di, dj));
                prop_assert_eq!(ha, hb);
            }
        } else {
            prop_assert_eq!(t.snapshot(), before);
        }

        let before = t.snapshot();
        if !t.spin_active(quarter_turns as f64 * FRAC_PI_2) {
            prop_assert_eq!(t.snapshot(), before);
        }
    }
}
