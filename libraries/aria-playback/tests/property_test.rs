//! Property tests for the playback queue's ordering and selection invariants.

use aria_core::{PlayMode, TrackFlags, TrackRef};
use aria_playback::PlaybackQueue;
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

fn track(id: &str) -> TrackRef {
    TrackRef {
        id: id.to_string(),
        title: format!("Track {id}"),
        artist: "Artist".to_string(),
        album: None,
        cover: None,
        duration_hint: Duration::from_secs(180),
        album_id: None,
        album_audio_id: None,
        flags: TrackFlags::default(),
    }
}

fn tracks(ids: &HashSet<String>) -> Vec<TrackRef> {
    ids.iter().map(|id| track(id)).collect()
}

/// One user-facing queue operation, for invariant checking under arbitrary
/// interleavings.
#[derive(Debug, Clone)]
enum Op {
    Load(Vec<String>),
    Append(Vec<String>),
    Remove(usize),
    SetCurrent(usize),
    StepNext(PlayMode),
    StepPrevious(PlayMode),
    Clear,
}

fn id_vec() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-f]{1,4}", 0..8)
}

fn op() -> impl Strategy<Value = Op> {
    let mode = prop_oneof![
        Just(PlayMode::Sequence),
        Just(PlayMode::RepeatOne),
        Just(PlayMode::Shuffle),
    ];
    prop_oneof![
        id_vec().prop_map(Op::Load),
        id_vec().prop_map(Op::Append),
        (0usize..16).prop_map(Op::Remove),
        (0usize..16).prop_map(Op::SetCurrent),
        mode.clone().prop_map(Op::StepNext),
        mode.prop_map(Op::StepPrevious),
        Just(Op::Clear),
    ]
}

proptest! {
    /// Stepping `next` once per track under Sequence walks the whole queue
    /// and lands back where it started.
    #[test]
    fn sequence_next_cycles_back_to_start(
        ids in prop::collection::hash_set("[a-z]{1,8}", 1..12),
        start in 0usize..12,
    ) {
        let mut queue = PlaybackQueue::new();
        queue.load(tracks(&ids));
        let len = queue.len();
        let start = start % len;
        queue.set_current(start);

        for _ in 0..len {
            let next = queue.next_index(PlayMode::Sequence).unwrap();
            queue.set_current(next);
        }
        prop_assert_eq!(queue.current_index(), Some(start));
    }

    /// Previous is the inverse of next under Sequence.
    #[test]
    fn sequence_previous_undoes_next(
        ids in prop::collection::hash_set("[a-z]{1,8}", 1..12),
        start in 0usize..12,
    ) {
        let mut queue = PlaybackQueue::new();
        queue.load(tracks(&ids));
        let start = start % queue.len();
        queue.set_current(start);

        let next = queue.next_index(PlayMode::Sequence).unwrap();
        queue.set_current(next);
        let back = queue.previous_index(PlayMode::Sequence).unwrap();
        prop_assert_eq!(back, start);
    }

    /// Re-appending any subset of an existing queue never grows it.
    #[test]
    fn append_of_existing_tracks_never_grows(
        ids in prop::collection::hash_set("[a-z]{1,8}", 1..12),
    ) {
        let mut queue = PlaybackQueue::new();
        queue.load(tracks(&ids));
        let len = queue.len();

        let mut again = tracks(&ids);
        again.reverse();
        queue.append(again);
        prop_assert_eq!(queue.len(), len);
    }

    /// Repeat-one never moves the selection, from any position.
    #[test]
    fn repeat_one_is_stationary(
        ids in prop::collection::hash_set("[a-z]{1,8}", 1..12),
        start in 0usize..12,
    ) {
        let mut queue = PlaybackQueue::new();
        queue.load(tracks(&ids));
        let start = start % queue.len();
        queue.set_current(start);

        prop_assert_eq!(queue.next_index(PlayMode::RepeatOne), Some(start));
    }

    /// Removing any other position keeps the current track's identity.
    #[test]
    fn removal_preserves_current_identity(
        ids in prop::collection::hash_set("[a-z]{1,8}", 2..12),
        current in 0usize..12,
        remove in 0usize..12,
    ) {
        let mut queue = PlaybackQueue::new();
        queue.load(tracks(&ids));
        let current = current % queue.len();
        let remove = remove % queue.len();
        prop_assume!(current != remove);

        queue.set_current(current);
        let id_before = queue.current_track().unwrap().id.clone();

        prop_assert!(queue.remove_at(remove));
        prop_assert_eq!(queue.current_track().unwrap().id.clone(), id_before);
    }

    /// Under any operation sequence the selection stays consistent: `None`
    /// exactly when empty, otherwise within bounds.
    #[test]
    fn selection_invariant_holds_under_any_ops(ops in prop::collection::vec(op(), 0..40)) {
        let mut queue = PlaybackQueue::new();
        for op in ops {
            match op {
                Op::Load(ids) => queue.load(ids.iter().map(|id| track(id)).collect()),
                Op::Append(ids) => queue.append(ids.iter().map(|id| track(id)).collect()),
                Op::Remove(index) => {
                    queue.remove_at(index);
                }
                Op::SetCurrent(index) => {
                    queue.set_current(index);
                }
                Op::StepNext(mode) => {
                    if let Some(next) = queue.next_index(mode) {
                        queue.set_current(next);
                    }
                }
                Op::StepPrevious(mode) => {
                    if let Some(prev) = queue.previous_index(mode) {
                        queue.set_current(prev);
                    }
                }
                Op::Clear => queue.clear(),
            }

            prop_assert_eq!(queue.current_index().is_none(), queue.is_empty());
            if let Some(current) = queue.current_index() {
                prop_assert!(current < queue.len());
            }
        }
    }
}
