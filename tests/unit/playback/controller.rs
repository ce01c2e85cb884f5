use std::sync::{Arc, Mutex};

use super::*;
use crate::{
    codec::payload::EncodedImage,
    foundation::time::ManualClock,
    store::{frame::FrameId, storage::MemoryStorage},
};

fn frames(ids: &[&str]) -> Vec<Frame> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| {
            Frame::new(
                FrameId::from(*id),
                EncodedImage::new("image/png", vec![i as u8]),
                i as i64,
            )
        })
        .collect()
}

fn recorder(ctl: &mut PlaybackController) -> Arc<Mutex<Vec<RenderSignal>>> {
    let seen: Arc<Mutex<Vec<RenderSignal>>> = Arc::default();
    let sink = Arc::clone(&seen);
    ctl.on_render(move |s| sink.lock().unwrap().push(s.clone()));
    seen
}

fn indices(seen: &Arc<Mutex<Vec<RenderSignal>>>) -> Vec<usize> {
    seen.lock().unwrap().iter().map(|s| s.index).collect()
}

#[test]
fn initial_state_depends_on_frames() {
    let empty = PlaybackController::enter(Vec::new(), ManualClock::new());
    assert_eq!(empty.state(), PlaybackState::Idle);
    assert!(empty.current_frame().is_none());

    let ctl = PlaybackController::enter(frames(&["a", "b"]), ManualClock::new());
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.current_index(), 0);
    assert_eq!(ctl.fps().get(), 12);
    assert!(ctl.is_looping());
}

#[test]
fn play_is_noop_when_idle() {
    let mut ctl = PlaybackController::enter(Vec::new(), ManualClock::new());
    ctl.play();
    assert_eq!(ctl.state(), PlaybackState::Idle);
    assert_eq!(ctl.next_deadline(), None);
}

#[test]
fn looping_playback_wraps_to_start() {
    let clock = ManualClock::new();
    let mut ctl =
        PlaybackController::enter(frames(&["a", "b", "c"]), clock.clone()).with_settings(10, true);
    let seen = recorder(&mut ctl);

    ctl.play();
    assert_eq!(ctl.next_deadline(), Some(Duration::from_millis(100)));
    for _ in 0..4 {
        clock.advance(Duration::from_millis(100));
        assert_eq!(ctl.pump(), 1);
    }

    // play signal, then ticks 1, 2, 0, 1
    assert_eq!(indices(&seen), vec![0, 1, 2, 0, 1]);
    assert_eq!(ctl.state(), PlaybackState::Playing);
}

#[test]
fn non_looping_playback_stops_on_last_frame() {
    let clock = ManualClock::new();
    let mut ctl =
        PlaybackController::enter(frames(&["a", "b", "c"]), clock.clone()).with_settings(10, false);
    let seen = recorder(&mut ctl);

    ctl.play();
    clock.advance(Duration::from_millis(1000));
    // 0 -> 1, 1 -> 2, then the end-of-sequence tick that stops on 2.
    assert_eq!(ctl.pump(), 3);

    assert_eq!(indices(&seen), vec![0, 1, 2, 2]);
    assert_eq!(
        seen.lock().unwrap().last().unwrap().state,
        PlaybackState::Paused
    );
    assert_eq!(ctl.current_index(), 2);
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.next_deadline(), None);

    clock.advance(Duration::from_millis(1000));
    assert_eq!(ctl.pump(), 0);
    assert_eq!(ctl.current_index(), 2);
}

#[test]
fn pump_fires_late_ticks_in_order() {
    let clock = ManualClock::new();
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c", "d", "e"]), clock.clone())
        .with_settings(10, true);
    let seen = recorder(&mut ctl);

    ctl.play();
    clock.advance(Duration::from_millis(350));
    assert_eq!(ctl.pump(), 3);
    assert_eq!(indices(&seen), vec![0, 1, 2, 3]);
    assert_eq!(ctl.next_deadline(), Some(Duration::from_millis(50)));
}

#[test]
fn pause_is_idempotent_and_cancels_timer() {
    let clock = ManualClock::new();
    let mut ctl = PlaybackController::enter(frames(&["a", "b"]), clock.clone());
    let seen = recorder(&mut ctl);

    ctl.play();
    ctl.pause();
    ctl.pause();
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(seen.lock().unwrap().len(), 2);

    clock.advance(Duration::from_secs(5));
    assert_eq!(ctl.pump(), 0);
    assert_eq!(ctl.current_index(), 0);
}

#[test]
fn seek_pauses_and_clamps() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), ManualClock::new());
    ctl.play();
    ctl.seek(10);
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.current_index(), 2);

    ctl.seek(1);
    assert_eq!(ctl.current_frame().unwrap().id().as_str(), "b");
    assert_eq!(ctl.onion_skin().unwrap().id().as_str(), "a");

    ctl.play();
    ctl.reset();
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.current_index(), 0);
    assert!(ctl.onion_skin().is_none());
}

#[test]
fn set_fps_restarts_timer_immediately() {
    let clock = ManualClock::new();
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), clock.clone())
        .with_settings(1, true);

    ctl.play();
    clock.advance(Duration::from_millis(900));
    ctl.set_fps(10);
    assert_eq!(ctl.next_deadline(), Some(Duration::from_millis(100)));

    clock.advance(Duration::from_millis(100));
    assert_eq!(ctl.pump(), 1);
    assert_eq!(ctl.current_index(), 1);

    ctl.set_fps(500);
    assert_eq!(ctl.fps().get(), 24);
    ctl.set_fps(0);
    assert_eq!(ctl.fps().get(), 1);
}

#[test]
fn set_fps_while_paused_does_not_arm_timer() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b"]), ManualClock::new());
    ctl.set_fps(5);
    assert_eq!(ctl.next_deadline(), None);
    assert_eq!(ctl.fps().get(), 5);
}

#[test]
fn set_looping_applies_at_next_wrap() {
    let clock = ManualClock::new();
    let mut ctl =
        PlaybackController::enter(frames(&["a", "b"]), clock.clone()).with_settings(10, true);
    ctl.play();
    assert!(ctl.tick());
    ctl.set_looping(false);
    assert_eq!(ctl.state(), PlaybackState::Playing);
    assert!(ctl.tick());
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.current_index(), 1);
    assert!(!ctl.tick());
}

#[test]
fn deleting_current_last_frame_clamps_cursor() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), ManualClock::new());
    ctl.seek(2);

    let mut remaining = frames(&["a", "b", "c"]);
    remaining.remove(2);
    ctl.sync_frames(remaining);

    assert_eq!(ctl.current_index(), 1);
    assert_eq!(ctl.current_frame().unwrap().id().as_str(), "b");
}

#[test]
fn deleting_other_frame_keeps_current_identity() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), ManualClock::new());
    ctl.seek(2);

    let mut remaining = frames(&["a", "b", "c"]);
    remaining.remove(0);
    ctl.sync_frames(remaining);

    // Still showing "c", now at position 1.
    assert_eq!(ctl.current_index(), 1);
    assert_eq!(ctl.current_frame().unwrap().id().as_str(), "c");
}

#[test]
fn deleting_current_middle_frame_keeps_position() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), ManualClock::new());
    ctl.seek(1);

    ctl.sync_frames(frames(&["a", "c"]));
    assert_eq!(ctl.current_index(), 1);
    assert_eq!(ctl.current_frame().unwrap().id().as_str(), "c");
}

#[test]
fn reorder_follows_current_frame() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b", "c"]), ManualClock::new());
    ctl.seek(0);
    ctl.sync_frames(frames(&["b", "c", "a"]));
    assert_eq!(ctl.current_index(), 2);
}

#[test]
fn emptied_sequence_goes_idle_and_back() {
    let clock = ManualClock::new();
    let mut ctl = PlaybackController::enter(frames(&["a"]), clock.clone());
    ctl.play();
    ctl.sync_frames(Vec::new());
    assert_eq!(ctl.state(), PlaybackState::Idle);
    assert_eq!(ctl.next_deadline(), None);

    ctl.sync_frames(frames(&["x", "y"]));
    assert_eq!(ctl.state(), PlaybackState::Paused);
    assert_eq!(ctl.current_index(), 0);
}

#[test]
fn delete_current_refuses_last_remaining_frame() {
    let mut store = FrameStore::open(MemoryStorage::new());
    for tag in 0..3u8 {
        store
            .add(EncodedImage::new("image/png", vec![tag]))
            .unwrap();
    }

    let mut ctl = PlaybackController::enter(store.list(), ManualClock::new());
    ctl.seek(2);
    assert!(ctl.delete_current(&mut store).unwrap());
    assert_eq!(store.len(), 2);
    assert_eq!(ctl.current_index(), 1);

    assert!(ctl.delete_current(&mut store).unwrap());
    assert_eq!(store.len(), 1);
    assert_eq!(ctl.current_index(), 0);

    assert!(!ctl.delete_current(&mut store).unwrap());
    assert_eq!(store.len(), 1);
}

#[test]
fn every_state_change_emits_signal_with_frame() {
    let mut ctl = PlaybackController::enter(frames(&["a", "b"]), ManualClock::new());
    let seen = recorder(&mut ctl);

    ctl.refresh();
    ctl.play();
    ctl.tick();
    ctl.pause();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[0].state, PlaybackState::Paused);
    assert_eq!(seen[1].state, PlaybackState::Playing);
    assert_eq!(seen[2].index, 1);
    assert_eq!(seen[2].len, 2);
    assert_eq!(seen[2].frame.as_ref().unwrap().id().as_str(), "b");
    assert_eq!(seen[3].state, PlaybackState::Paused);
}
