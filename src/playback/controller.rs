use std::time::Duration;

use crate::{
    foundation::{core::Fps, error::FlipbookResult, time::Clock},
    store::{frame::Frame, frame_store::FrameStore},
};

/// The player view keeps at least this many frames; deleting the last one is refused.
pub const MIN_PLAYER_FRAMES: usize = 1;

/// Playback state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    /// No frames to show.
    Idle,
    /// Cursor valid, not advancing.
    Paused,
    /// Cursor advances on every timer tick.
    Playing,
}

/// What a renderer needs to draw the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSignal {
    /// 0-based cursor.
    pub index: usize,
    /// Sequence length.
    pub len: usize,
    /// Frame under the cursor (`None` when idle).
    pub frame: Option<Frame>,
    /// State after the change that produced this signal.
    pub state: PlaybackState,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    interval: Duration,
    next_due: Duration,
}

type RenderListener = Box<dyn FnMut(&RenderSignal)>;

/// Timed cursor over a snapshot of the frame store.
///
/// One controller is one player-view session: built on entry from a store snapshot, torn down
/// with [`PlaybackController::leave`]. The recurring timer is a single deadline on the injected
/// [`Clock`]; [`PlaybackController::pump`] fires every due tick in order.
pub struct PlaybackController {
    clock: Box<dyn Clock>,
    frames: Vec<Frame>,
    current: usize,
    fps: Fps,
    looping: bool,
    state: PlaybackState,
    timer: Option<Timer>,
    listeners: Vec<RenderListener>,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("frames", &self.frames.len())
            .field("current", &self.current)
            .field("fps", &self.fps)
            .field("looping", &self.looping)
            .field("state", &self.state)
            .finish()
    }
}

impl PlaybackController {
    /// Enter a playback session: `Paused` at 0 with frames, `Idle` without.
    pub fn enter(frames: Vec<Frame>, clock: impl Clock + 'static) -> Self {
        let state = if frames.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Paused
        };
        tracing::debug!(frames = frames.len(), ?state, "playback session entered");

        Self {
            clock: Box::new(clock),
            frames,
            current: 0,
            fps: Fps::DEFAULT,
            looping: true,
            state,
            timer: None,
            listeners: Vec::new(),
        }
    }

    /// Builder-style initial rate (clamped to the UI range) and loop mode.
    pub fn with_settings(mut self, fps: u32, looping: bool) -> Self {
        self.fps = Fps::clamped_ui(fps);
        self.looping = looping;
        self
    }

    /// Register a render listener.
    pub fn on_render(&mut self, listener: impl FnMut(&RenderSignal) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Cursor position.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Number of frames in the session snapshot.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the session has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Current rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Loop mode.
    pub fn is_looping(&self) -> bool {
        self.looping
    }

    /// Frame under the cursor.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.get(self.current)
    }

    /// Frame before the cursor, drawn translucently behind the current one.
    pub fn onion_skin(&self) -> Option<&Frame> {
        self.current
            .checked_sub(1)
            .and_then(|i| self.frames.get(i))
    }

    /// Signal describing the current cursor.
    pub fn render_signal(&self) -> RenderSignal {
        RenderSignal {
            index: self.current,
            len: self.frames.len(),
            frame: self.current_frame().cloned(),
            state: self.state,
        }
    }

    /// Re-emit the current signal (e.g. for the first draw).
    pub fn refresh(&mut self) {
        self.emit();
    }

    /// `Paused -> Playing` and arm the timer. No-op when playing or idle.
    pub fn play(&mut self) {
        if self.state != PlaybackState::Paused {
            return;
        }
        self.state = PlaybackState::Playing;
        self.arm_timer();
        tracing::debug!(fps = self.fps.get(), "playback started");
        self.emit();
    }

    /// `Playing -> Paused` and cancel the timer. Idempotent.
    pub fn pause(&mut self) {
        self.timer = None;
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            tracing::debug!(index = self.current, "playback paused");
            self.emit();
        }
    }

    /// Pause, then move the cursor to `index` clamped to the valid range.
    pub fn seek(&mut self, index: usize) {
        self.pause();
        if self.frames.is_empty() {
            return;
        }
        self.current = index.min(self.frames.len() - 1);
        self.emit();
    }

    /// Pause and rewind to the first frame.
    pub fn reset(&mut self) {
        self.pause();
        self.seek(0);
    }

    /// Change the rate (clamped to `1..=24`). While playing, the timer restarts at the new rate.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = Fps::clamped_ui(fps);
        if self.state == PlaybackState::Playing {
            self.timer = None;
            self.arm_timer();
        }
    }

    /// Change loop mode; applies at the next wrap evaluation.
    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance the cursor by one step if playing. Returns `true` if a tick happened.
    ///
    /// Past the end the cursor wraps to 0 when looping; otherwise it stays on the last frame and
    /// playback pauses.
    pub fn tick(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }

        let next = self.current + 1;
        if next < self.frames.len() {
            self.current = next;
        } else if self.looping {
            self.current = 0;
        } else {
            self.current = self.frames.len().saturating_sub(1);
            self.state = PlaybackState::Paused;
            self.timer = None;
            tracing::debug!("reached last frame, playback stopped");
        }
        self.emit();
        true
    }

    /// Fire every tick that is due on the clock, in order. Returns the number fired.
    pub fn pump(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        while let Some(timer) = self.timer
            && timer.next_due <= now
        {
            self.tick();
            fired += 1;
            if let Some(t) = self.timer.as_mut() {
                t.next_due = timer.next_due + timer.interval;
            }
        }
        fired
    }

    /// Time left until the next tick, if the timer is armed.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer
            .map(|t| t.next_due.saturating_sub(self.clock.now()))
    }

    /// Replace the snapshot after a store change.
    ///
    /// The cursor follows the current frame's identity while it survives; if the current frame
    /// itself was removed, the position is kept and clamped to the new last index. An empty
    /// sequence moves the session to `Idle`.
    pub fn sync_frames(&mut self, frames: Vec<Frame>) {
        let current_id = self.current_frame().map(|f| f.id().clone());
        self.frames = frames;

        if self.frames.is_empty() {
            self.timer = None;
            self.current = 0;
            self.state = PlaybackState::Idle;
        } else {
            let last = self.frames.len() - 1;
            self.current = current_id
                .and_then(|id| self.frames.iter().position(|f| f.id() == &id))
                .unwrap_or(self.current.min(last));
            if self.state == PlaybackState::Idle {
                self.state = PlaybackState::Paused;
            }
        }
        self.emit();
    }

    /// Delete the frame under the cursor from `store` and resync.
    ///
    /// Refused (returns `false`) when only [`MIN_PLAYER_FRAMES`] frames remain.
    pub fn delete_current(&mut self, store: &mut FrameStore) -> FlipbookResult<bool> {
        if store.len() <= MIN_PLAYER_FRAMES {
            tracing::info!("refusing to delete the last frame from the player");
            return Ok(false);
        }
        let Some(id) = self.current_frame().map(|f| f.id().clone()) else {
            return Ok(false);
        };

        let deleted = store.delete(&id)?;
        if deleted {
            self.sync_frames(store.list());
        }
        Ok(deleted)
    }

    /// Leave the view: cancel the timer and drop listeners.
    pub fn leave(mut self) {
        self.timer = None;
        self.listeners.clear();
        tracing::debug!("playback session left");
    }

    fn arm_timer(&mut self) {
        let interval = self.fps.frame_interval();
        self.timer = Some(Timer {
            interval,
            next_due: self.clock.now() + interval,
        });
    }

    fn emit(&mut self) {
        let signal = self.render_signal();
        for listener in &mut self.listeners {
            listener(&signal);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/controller.rs"]
mod tests;
