//! The active play queue.
//!
//! [`QueueEngine`] owns the track order the player walks through, the
//! current position, and the shuffle and repeat settings. It stores only
//! [`TrackId`]s and does no I/O; persistence goes through [`QueueSnapshot`].

use crate::error::QueueError;
use crate::model::{QueueSnapshot, RepeatMode, TrackId};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Interior,
    Edge,
}

#[derive(Debug, Clone)]
pub struct QueueEngine<R = SmallRng> {
    original_order: Vec<TrackId>,
    play_order: Vec<TrackId>,
    current_index: Option<usize>,
    repeat_mode: RepeatMode,
    is_shuffled: bool,
    rng: R,
}

impl QueueEngine<SmallRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::make_rng())
    }
}

impl Default for QueueEngine<SmallRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> QueueEngine<R> {
    /// Builds an empty queue that shuffles with `rng`.
    pub fn with_rng(rng: R) -> Self {
        Self {
            original_order: Vec::new(),
            play_order: Vec::new(),
            current_index: None,
            repeat_mode: RepeatMode::None,
            is_shuffled: false,
            rng,
        }
    }

    /// Replaces the queue with `track_ids` in the given order and makes the
    /// first one current. Shuffle is switched off; repeat mode is kept.
    pub fn set_queue(&mut self, track_ids: Vec<TrackId>) {
        self.play_order = track_ids.clone();
        self.original_order = track_ids;
        self.is_shuffled = false;
        self.current_index = (!self.play_order.is_empty()).then_some(0);
        debug!(len = self.play_order.len(), "queue replaced");
    }

    pub fn clear(&mut self) {
        self.set_queue(Vec::new());
        self.is_shuffled = false;
    }

    pub fn len(&self) -> usize {
        self.play_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.play_order.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current(&self) -> Option<TrackId> {
        self.current_index
            .and_then(|idx| self.play_order.get(idx).copied())
    }

    pub fn play_order(&self) -> &[TrackId] {
        &self.play_order
    }

    pub fn original_order(&self) -> &[TrackId] {
        &self.original_order
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
    }

    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        self.repeat_mode = self.repeat_mode.next();
        self.repeat_mode
    }

    pub fn is_shuffled(&self) -> bool {
        self.is_shuffled
    }

    /// Advances to the next track and returns it.
    ///
    /// Returns `None` without moving when the queue is empty or when the
    /// last track is current and repeat is off. With [`RepeatMode::One`]
    /// the current track is returned again.
    pub fn move_next(&mut self) -> Option<TrackId> {
        let target = self.next_index()?;
        self.current_index = Some(target);
        self.current()
    }

    /// Mirror of [`move_next`](Self::move_next) towards the start.
    pub fn move_previous(&mut self) -> Option<TrackId> {
        let target = self.previous_index()?;
        self.current_index = Some(target);
        self.current()
    }

    pub fn has_next(&self) -> bool {
        self.next_index().is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_index().is_some()
    }

    /// Makes the track at `index` in the play order current.
    pub fn jump_to(&mut self, index: i64) -> Result<TrackId, QueueError> {
        let len = self.play_order.len();
        let position = usize::try_from(index)
            .ok()
            .filter(|idx| *idx < len)
            .ok_or(QueueError::IndexOutOfRange { index, len })?;

        self.current_index = Some(position);
        Ok(self.play_order[position])
    }

    /// Switches between shuffled and original order, keeping the current
    /// track current. Does nothing on an empty queue.
    pub fn toggle_shuffle(&mut self) {
        let Some(anchor) = self.current() else {
            return;
        };

        self.is_shuffled = !self.is_shuffled;
        if self.is_shuffled {
            let mut order = self.original_order.clone();
            order.shuffle(&mut self.rng);
            self.play_order = order;
        } else {
            self.play_order.clone_from(&self.original_order);
        }

        // A restored snapshot is not checked, so the anchor may be missing.
        self.current_index = self
            .play_order
            .iter()
            .position(|id| *id == anchor)
            .or_else(|| (!self.play_order.is_empty()).then_some(0));

        debug!(
            shuffled = self.is_shuffled,
            anchor = %anchor,
            index = ?self.current_index,
            "shuffle toggled"
        );
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.is_shuffled != enabled {
            self.toggle_shuffle();
        }
    }

    pub fn state(&self) -> QueueSnapshot {
        QueueSnapshot {
            original_order: self.original_order.clone(),
            play_order: self.play_order.clone(),
            current_index: self.current_index.map_or(-1, |idx| idx as i64),
            repeat_mode: self.repeat_mode,
            is_shuffled: self.is_shuffled,
        }
    }

    /// Adopts `snapshot` as the live state.
    ///
    /// The orders are taken as given. An out of range current index is
    /// pulled to the nearest end of the play order.
    pub fn restore_state(&mut self, snapshot: &QueueSnapshot) {
        self.original_order = snapshot.original_order.clone();
        self.play_order = snapshot.play_order.clone();
        self.repeat_mode = snapshot.repeat_mode;
        self.is_shuffled = snapshot.is_shuffled;
        self.current_index = clamp_index(snapshot.current_index, self.play_order.len());

        if let Some(idx) = self.current_index
            && idx as i64 != snapshot.current_index
        {
            debug!(
                requested = snapshot.current_index,
                clamped = ?self.current_index,
                "restored index clamped"
            );
        }
    }

    fn next_index(&self) -> Option<usize> {
        let current = self.current_index?;
        let last = self.play_order.len().checked_sub(1)?;
        let boundary = if current >= last {
            Boundary::Edge
        } else {
            Boundary::Interior
        };

        match (self.repeat_mode, boundary) {
            (RepeatMode::One, _) => Some(current),
            (RepeatMode::None | RepeatMode::All, Boundary::Interior) => Some(current + 1),
            (RepeatMode::All, Boundary::Edge) => Some(0),
            (RepeatMode::None, Boundary::Edge) => None,
        }
    }

    fn previous_index(&self) -> Option<usize> {
        let current = self.current_index?;
        let last = self.play_order.len().checked_sub(1)?;
        let boundary = if current == 0 {
            Boundary::Edge
        } else {
            Boundary::Interior
        };

        match (self.repeat_mode, boundary) {
            (RepeatMode::One, _) => Some(current),
            (RepeatMode::None | RepeatMode::All, Boundary::Interior) => Some(current - 1),
            (RepeatMode::All, Boundary::Edge) => Some(last),
            (RepeatMode::None, Boundary::Edge) => None,
        }
    }
}

fn clamp_index(index: i64, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    Some(usize::try_from(index).unwrap_or(0).min(last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::track_ids;
    use proptest::collection::vec as prop_vec;
    use proptest::{prop_assert, prop_assert_eq, proptest};
    use rand::SeedableRng;

    fn engine(ids: &[i64]) -> QueueEngine {
        let mut engine = QueueEngine::with_rng(SmallRng::seed_from_u64(7));
        engine.set_queue(track_ids(ids));
        engine
    }

    fn sorted(ids: &[TrackId]) -> Vec<TrackId> {
        let mut out = ids.to_vec();
        out.sort();
        out
    }

    #[test]
    fn set_queue_starts_at_first_track() {
        let engine = engine(&[4, 8, 15]);
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.current(), Some(TrackId(4)));
        assert_eq!(engine.play_order(), track_ids(&[4, 8, 15]).as_slice());
        assert!(!engine.is_shuffled());
    }

    #[test]
    fn empty_queue_has_no_current_track() {
        let mut engine = engine(&[]);
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.current_index(), None);
        assert_eq!(engine.current(), None);
        assert_eq!(engine.state().current_index, -1);
        assert_eq!(engine.move_next(), None);
        assert_eq!(engine.move_previous(), None);
        assert!(!engine.has_next());
        assert!(!engine.has_previous());
    }

    #[test]
    fn set_queue_keeps_repeat_mode_and_drops_shuffle() {
        let mut engine = engine(&[1, 2, 3]);
        engine.set_repeat_mode(RepeatMode::All);
        engine.toggle_shuffle();

        engine.set_queue(track_ids(&[9, 8]));
        assert_eq!(engine.repeat_mode(), RepeatMode::All);
        assert!(!engine.is_shuffled());
        assert_eq!(engine.play_order(), track_ids(&[9, 8]).as_slice());
    }

    #[test]
    fn clear_empties_queue() {
        let mut engine = engine(&[1, 2, 3]);
        engine.toggle_shuffle();
        engine.clear();
        assert!(engine.is_empty());
        assert!(!engine.is_shuffled());
        assert_eq!(engine.current(), None);
    }

    #[test]
    fn repeat_all_wraps_to_start() {
        let mut engine = engine(&[10, 20]);
        engine.set_repeat_mode(RepeatMode::All);
        engine.jump_to(1).expect("jump");

        assert_eq!(engine.move_next(), Some(TrackId(10)));
        assert_eq!(engine.current_index(), Some(0));
    }

    #[test]
    fn repeat_all_wraps_to_end_going_back() {
        let mut engine = engine(&[10, 20, 30]);
        engine.set_repeat_mode(RepeatMode::All);

        assert_eq!(engine.move_previous(), Some(TrackId(30)));
        assert_eq!(engine.current_index(), Some(2));
    }

    #[test]
    fn repeat_none_stops_at_end() {
        let mut engine = engine(&[10, 20]);
        engine.jump_to(1).expect("jump");

        assert_eq!(engine.move_next(), None);
        assert_eq!(engine.current_index(), Some(1));
        assert!(!engine.has_next());
    }

    #[test]
    fn repeat_none_stops_at_start() {
        let mut engine = engine(&[10, 20]);
        assert_eq!(engine.move_previous(), None);
        assert_eq!(engine.current_index(), Some(0));
        assert!(engine.has_next());
        assert!(!engine.has_previous());
    }

    #[test]
    fn repeat_one_replays_current_track() {
        let mut engine = engine(&[10, 20, 30]);
        engine.set_repeat_mode(RepeatMode::One);

        for index in 0..3 {
            engine.jump_to(index).expect("jump");
            let current = engine.current();
            assert_eq!(engine.move_next(), current);
            assert_eq!(engine.move_previous(), current);
            assert_eq!(engine.current_index(), Some(index as usize));
        }
    }

    #[test]
    fn interior_moves_step_by_one() {
        let mut engine = engine(&[10, 20, 30]);
        assert_eq!(engine.move_next(), Some(TrackId(20)));
        assert_eq!(engine.move_next(), Some(TrackId(30)));
        assert_eq!(engine.move_previous(), Some(TrackId(20)));
        assert_eq!(engine.current_index(), Some(1));
    }

    #[test]
    fn jump_to_rejects_out_of_range() {
        let mut engine = engine(&[10, 20, 30]);

        assert_eq!(
            engine.jump_to(-1),
            Err(QueueError::IndexOutOfRange { index: -1, len: 3 })
        );
        assert_eq!(
            engine.jump_to(3),
            Err(QueueError::IndexOutOfRange { index: 3, len: 3 })
        );
        assert_eq!(engine.current_index(), Some(0));

        assert_eq!(engine.jump_to(2), Ok(TrackId(30)));
        assert_eq!(engine.current_index(), Some(2));
    }

    #[test]
    fn jump_to_error_names_the_index() {
        let mut engine = engine(&[]);
        let err = engine.jump_to(0).expect_err("empty queue");
        assert!(err.to_string().contains("index 0"));
    }

    #[test]
    fn shuffle_round_trip_restores_original_order() {
        let ids: Vec<i64> = (1..=20).collect();
        let mut engine = engine(&ids);
        engine.jump_to(5).expect("jump");

        engine.toggle_shuffle();
        assert!(engine.is_shuffled());
        assert_eq!(engine.current(), Some(TrackId(6)));
        assert_ne!(engine.play_order(), engine.original_order());
        assert_eq!(sorted(engine.play_order()), sorted(engine.original_order()));

        engine.toggle_shuffle();
        assert!(!engine.is_shuffled());
        assert_eq!(engine.current(), Some(TrackId(6)));
        assert_eq!(engine.current_index(), Some(5));
        assert_eq!(engine.play_order(), track_ids(&ids).as_slice());
    }

    #[test]
    fn shuffle_is_reproducible_with_same_seed() {
        let ids: Vec<i64> = (0..16).collect();
        let mut left = engine(&ids);
        let mut right = engine(&ids);

        left.toggle_shuffle();
        right.toggle_shuffle();
        assert_eq!(left.play_order(), right.play_order());
    }

    #[test]
    fn shuffle_anchors_first_duplicate() {
        let mut engine = engine(&[5, 5, 5]);
        engine.jump_to(2).expect("jump");

        engine.toggle_shuffle();
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.current(), Some(TrackId(5)));
    }

    #[test]
    fn shuffle_on_empty_queue_is_noop() {
        let mut engine = engine(&[]);
        engine.toggle_shuffle();
        assert!(!engine.is_shuffled());
        assert_eq!(engine.current_index(), None);
    }

    #[test]
    fn set_shuffle_is_idempotent() {
        let mut engine = engine(&[1, 2, 3, 4, 5, 6, 7, 8]);
        engine.set_shuffle(true);
        let shuffled = engine.play_order().to_vec();
        engine.set_shuffle(true);
        assert_eq!(engine.play_order(), shuffled.as_slice());
        engine.set_shuffle(false);
        assert_eq!(engine.play_order(), engine.original_order());
    }

    #[test]
    fn state_is_detached_from_engine() {
        let mut engine = engine(&[1, 2, 3]);
        let mut snapshot = engine.state();
        snapshot.play_order.push(TrackId(99));
        snapshot.original_order.clear();
        snapshot.current_index = 2;

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.move_next(), Some(TrackId(2)));
        assert_eq!(engine.move_next(), Some(TrackId(3)));
        assert_eq!(engine.move_next(), None);
    }

    #[test]
    fn restored_engine_is_detached_from_snapshot() {
        let mut engine = engine(&[]);
        let mut snapshot = QueueSnapshot {
            original_order: track_ids(&[1, 2, 3]),
            play_order: track_ids(&[1, 2, 3]),
            current_index: 1,
            repeat_mode: RepeatMode::None,
            is_shuffled: false,
        };
        engine.restore_state(&snapshot);

        snapshot.play_order.push(TrackId(99));
        snapshot.original_order.clear();
        snapshot.current_index = 3;
        snapshot.repeat_mode = RepeatMode::All;

        assert_eq!(engine.len(), 3);
        assert_eq!(engine.original_order(), track_ids(&[1, 2, 3]).as_slice());
        assert_eq!(engine.current_index(), Some(1));
        assert_eq!(engine.repeat_mode(), RepeatMode::None);
        assert_eq!(engine.move_next(), Some(TrackId(3)));
        assert_eq!(engine.move_next(), None);
    }

    #[test]
    fn restore_clamps_index_above_range() {
        let mut engine = engine(&[]);
        engine.restore_state(&QueueSnapshot {
            original_order: track_ids(&[1, 2, 3]),
            play_order: track_ids(&[1, 2, 3]),
            current_index: 99,
            repeat_mode: RepeatMode::None,
            is_shuffled: false,
        });
        assert_eq!(engine.current_index(), Some(2));
        assert_eq!(engine.current(), Some(TrackId(3)));
    }

    #[test]
    fn restore_clamps_index_below_range() {
        let mut engine = engine(&[]);
        engine.restore_state(&QueueSnapshot {
            original_order: track_ids(&[1, 2, 3]),
            play_order: track_ids(&[1, 2, 3]),
            current_index: -7,
            repeat_mode: RepeatMode::One,
            is_shuffled: false,
        });
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.repeat_mode(), RepeatMode::One);
    }

    #[test]
    fn restore_empty_snapshot_ignores_index() {
        let mut engine = engine(&[1, 2, 3]);
        engine.restore_state(&QueueSnapshot {
            current_index: 4,
            ..QueueSnapshot::default()
        });
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.current_index(), None);
        assert_eq!(engine.current(), None);
    }

    #[test]
    fn restore_takes_shuffled_order_verbatim() {
        let mut engine = engine(&[]);
        let snapshot = QueueSnapshot {
            original_order: track_ids(&[1, 2, 3]),
            play_order: track_ids(&[3, 1, 2]),
            current_index: 1,
            repeat_mode: RepeatMode::All,
            is_shuffled: true,
        };
        engine.restore_state(&snapshot);

        assert_eq!(engine.state(), snapshot);
        engine.toggle_shuffle();
        assert_eq!(engine.play_order(), track_ids(&[1, 2, 3]).as_slice());
        assert_eq!(engine.current(), Some(TrackId(1)));
    }

    #[test]
    fn toggle_recovers_when_anchor_missing_from_original() {
        let mut engine = engine(&[]);
        engine.restore_state(&QueueSnapshot {
            original_order: track_ids(&[1, 2]),
            play_order: track_ids(&[7, 8]),
            current_index: 0,
            repeat_mode: RepeatMode::None,
            is_shuffled: true,
        });

        engine.toggle_shuffle();
        assert_eq!(engine.current_index(), Some(0));
        assert_eq!(engine.current(), Some(TrackId(1)));
    }

    fn apply(engine: &mut QueueEngine, op: u8, arg: i64) {
        match op {
            0 => {
                engine.move_next();
            }
            1 => {
                engine.move_previous();
            }
            2 => engine.toggle_shuffle(),
            3 => {
                let _ = engine.jump_to(arg);
            }
            4 => {
                engine.cycle_repeat_mode();
            }
            5 => engine.set_queue(track_ids(&[arg, arg + 1, arg])),
            6 => engine.clear(),
            _ => {
                let snapshot = engine.state();
                engine.restore_state(&snapshot);
            }
        }
    }

    proptest! {
        #[test]
        fn invariants_hold_after_random_ops(
            ids in prop_vec(0i64..6, 0..12),
            ops in prop_vec((0u8..8, -2i64..14), 1..120),
            seed in 0u64..1_000
        ) {
            let mut engine = QueueEngine::with_rng(SmallRng::seed_from_u64(seed));
            engine.set_queue(track_ids(&ids));

            for (op, arg) in ops {
                apply(&mut engine, op, arg);

                prop_assert_eq!(engine.play_order().len(), engine.original_order().len());
                prop_assert_eq!(sorted(engine.play_order()), sorted(engine.original_order()));
                match engine.current_index() {
                    Some(idx) => prop_assert!(idx < engine.len()),
                    None => prop_assert!(engine.is_empty()),
                }
                if !engine.is_shuffled() {
                    prop_assert_eq!(engine.play_order(), engine.original_order());
                }
            }
        }

        #[test]
        fn predicates_agree_with_moves(
            len in 1usize..10,
            position in 0usize..10,
            mode in 0u8..3
        ) {
            let ids: Vec<i64> = (0..len as i64).collect();
            let mut engine = engine(&ids);
            engine.jump_to(position.min(len - 1) as i64).expect("jump");
            engine.set_repeat_mode(match mode {
                0 => RepeatMode::None,
                1 => RepeatMode::One,
                _ => RepeatMode::All,
            });

            let mut forward = engine.clone();
            prop_assert_eq!(engine.has_next(), forward.move_next().is_some());
            let mut backward = engine.clone();
            prop_assert_eq!(engine.has_previous(), backward.move_previous().is_some());
        }

        #[test]
        fn toggling_keeps_current_track(
            ids in prop_vec(0i64..50, 1..30),
            position in 0usize..30,
            seed in 0u64..1_000
        ) {
            let mut engine = QueueEngine::with_rng(SmallRng::seed_from_u64(seed));
            engine.set_queue(track_ids(&ids));
            engine.jump_to(position.min(ids.len() - 1) as i64).expect("jump");
            let before = engine.current();

            engine.toggle_shuffle();
            prop_assert_eq!(engine.current(), before);
            engine.toggle_shuffle();
            prop_assert_eq!(engine.current(), before);
            let expected = track_ids(&ids);
            prop_assert_eq!(engine.play_order(), expected.as_slice());
        }

        #[test]
        fn restore_reproduces_observable_state(
            ids in prop_vec(0i64..6, 0..12),
            ops in prop_vec((0u8..8, -2i64..14), 0..60)
        ) {
            let mut source = engine(&ids);
            for (op, arg) in ops {
                apply(&mut source, op, arg);
            }

            let mut target = QueueEngine::with_rng(SmallRng::seed_from_u64(99));
            target.restore_state(&source.state());

            prop_assert_eq!(target.len(), source.len());
            prop_assert_eq!(target.current_index(), source.current_index());
            prop_assert_eq!(target.current(), source.current());
            prop_assert_eq!(target.repeat_mode(), source.repeat_mode());
            prop_assert_eq!(target.is_shuffled(), source.is_shuffled());
            prop_assert_eq!(target.play_order(), source.play_order());
            prop_assert_eq!(target.state(), source.state());
        }
    }
}
