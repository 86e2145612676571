#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tune_queue::{QueueEngine, RepeatMode, TrackId};

fuzz_target!(|data: &[u8]| {
    let mut engine = QueueEngine::with_rng(SmallRng::seed_from_u64(0));
    let len = data.len() % 32;
    engine.set_queue((0..len).map(|idx| TrackId((idx % 7) as i64)).collect());

    for byte in data {
        match byte % 9 {
            0 => engine.set_repeat_mode(RepeatMode::None),
            1 => engine.set_repeat_mode(RepeatMode::One),
            2 => engine.set_repeat_mode(RepeatMode::All),
            3 => {
                let _ = engine.move_next();
            }
            4 => {
                let _ = engine.move_previous();
            }
            5 => engine.toggle_shuffle(),
            6 => {
                let _ = engine.jump_to(i64::from(*byte / 9) - 2);
            }
            7 => {
                let snapshot = engine.state();
                engine.restore_state(&snapshot);
            }
            _ => engine.clear(),
        }

        assert_eq!(engine.play_order().len(), engine.original_order().len());
        assert_eq!(engine.current_index().is_none(), engine.is_empty());
        if !engine.is_shuffled() {
            assert_eq!(engine.play_order(), engine.original_order());
        }
    }
});
