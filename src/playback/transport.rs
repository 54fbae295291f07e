//! Play/pause bookkeeping shared between the engine and its timer task.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Whether lines are currently being fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    /// Not firing. Initial state.
    #[default]
    Paused,
    /// Firing lines as they come due.
    Playing,
}

/// Scheduler state guarded by the engine mutex.
#[derive(Debug, Default)]
pub(crate) struct Transport {
    pub state: PlaybackState,
    /// Index of the next line not yet fired.
    pub cursor: usize,
    /// Wall instant paired with the logical position it corresponds to.
    anchor: Option<(Instant, i64)>,
    paused_at: Option<Instant>,
    /// Bumped on every play/stop; a timer task only acts for its own session.
    pub session: u64,
    /// The single outstanding timer task.
    pub pending: Option<JoinHandle<()>>,
    pub lead_ms: i64,
}

impl Transport {
    /// Enter `Playing` with `position_ms` mapped to `now`. Returns the new session.
    pub fn start(&mut self, now: Instant, position_ms: i64, cursor: usize) -> u64 {
        self.cancel_pending();
        self.state = PlaybackState::Playing;
        self.cursor = cursor;
        self.anchor = Some((now, position_ms));
        self.session = self.session.wrapping_add(1);
        self.session
    }

    /// Enter `Paused`. The pause instant is only recorded when leaving `Playing`.
    pub fn pause(&mut self, now: Instant) {
        if self.state == PlaybackState::Playing {
            self.paused_at = Some(now);
        }
        self.state = PlaybackState::Paused;
        self.session = self.session.wrapping_add(1);
        self.cancel_pending();
    }

    pub fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_live(&self, session: u64) -> bool {
        self.state == PlaybackState::Playing && self.session == session
    }

    /// Logical playback position at wall instant `now`.
    pub fn position_at(&self, now: Instant) -> i64 {
        self.anchor.map_or(0, |(at, position)| {
            let elapsed = now.saturating_duration_since(at).as_millis();
            position.saturating_add(i64::try_from(elapsed).unwrap_or(i64::MAX))
        })
    }

    /// Logical position captured by the last pause, if any.
    pub fn paused_position(&self) -> Option<i64> {
        self.paused_at.map(|at| self.position_at(at))
    }

    /// Wall instant at which a line stamped `time_ms` is due, lead included.
    /// Already-due lines map to the anchor instant, which lies in the past.
    pub fn deadline(&self, time_ms: i64) -> Option<Instant> {
        let (at, position) = self.anchor?;
        let ahead = time_ms.saturating_sub(self.lead_ms).saturating_sub(position);
        match u64::try_from(ahead) {
            Ok(ms) => at.checked_add(Duration::from_millis(ms)),
            Err(_) => Some(at),
        }
    }
}
