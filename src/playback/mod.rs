//! Time-synchronized lyric playback.
//!
//! [`LrcEngine`] walks the parsed lines against the tokio clock and invokes a
//! callback as each line comes due. At most one timer task is outstanding;
//! every play/stop cancels it and starts a new session, and the task re-checks
//! its session after each wake so a stopped engine never fires.

mod transport;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::runtime::Handle;
use tokio::time::{self, Instant};

use crate::config::Config;
use crate::error::Result;
use crate::lyrics::{LyricLine, Lyrics, Tags};

pub use transport::PlaybackState;
use transport::Transport;

/// Callback invoked with `(line index, line text)` when a line comes due.
pub type LineCallback = Box<dyn FnMut(usize, &str) + Send + 'static>;

struct Inner {
    lyrics: Lyrics,
    on_line: Mutex<LineCallback>,
    transport: Mutex<Transport>,
    runtime: Option<Handle>,
}

impl Inner {
    fn transport(&self) -> MutexGuard<'_, Transport> {
        self.transport.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runtime timers are scheduled on: the bound one, else the ambient one.
    fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// Clock reading in the timer runtime's time base, so anchors and
    /// deadlines agree even when called from outside that runtime.
    fn now(&self) -> Instant {
        match self.runtime() {
            Some(runtime) => {
                let _context = runtime.enter();
                Instant::now()
            }
            None => Instant::now(),
        }
    }

    /// Fire the cursor line for `session` and advance. Returns `false` once
    /// the session is no longer live. An out-of-range cursor fires nothing.
    ///
    /// The callback lock is taken before the session check, so a stop that
    /// returns while another callback is running always wins over a wake-up
    /// queued behind that callback.
    fn emit(&self, session: u64) -> bool {
        let mut on_line = self.on_line.lock().unwrap_or_else(PoisonError::into_inner);
        let index = {
            let mut transport = self.transport();
            if !transport.is_live(session) {
                return false;
            }
            let index = transport.cursor;
            if index >= self.lyrics.lines.len() {
                return true;
            }
            transport.cursor += 1;
            index
        };
        let Some(line) = self.lyrics.lines.get(index) else {
            return true;
        };
        tracing::debug!("Line {index} due at {}ms: {}", line.time, line.text);
        on_line(index, &line.text);
        true
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.transport
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_pending();
    }
}

/// Parsed lyrics plus a play/pause scheduler.
///
/// Clones share the same lyrics and playback state, so a clone can be moved
/// into the line callback to stop or seek from inside it.
#[derive(Clone)]
pub struct LrcEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LrcEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LrcEngine")
            .field("tags", self.tags())
            .field("lines", &self.lines().len())
            .field("state", &self.state())
            .field("cursor", &self.cursor())
            .finish_non_exhaustive()
    }
}

impl LrcEngine {
    /// Parse `lrc_text` and bind `on_line`.
    ///
    /// Timers run on the tokio runtime current at construction, or at the
    /// first `play` if there was none.
    pub fn new<F>(lrc_text: &str, on_line: F) -> Self
    where
        F: FnMut(usize, &str) + Send + 'static,
    {
        Self::build(Lyrics::parse(lrc_text), Box::new(on_line), Handle::try_current().ok())
    }

    /// Like [`LrcEngine::new`] but with an explicit runtime for timers.
    pub fn with_handle<F>(lrc_text: &str, on_line: F, runtime: Handle) -> Self
    where
        F: FnMut(usize, &str) + Send + 'static,
    {
        Self::build(Lyrics::parse(lrc_text), Box::new(on_line), Some(runtime))
    }

    /// Build from already-parsed lyrics.
    pub fn from_lyrics<F>(lyrics: Lyrics, on_line: F) -> Self
    where
        F: FnMut(usize, &str) + Send + 'static,
    {
        Self::build(lyrics, Box::new(on_line), Handle::try_current().ok())
    }

    /// Load a lyric file resolved through `config`, applying its lead time.
    pub fn from_path<F>(name: impl AsRef<Path>, config: &Config, on_line: F) -> Result<Self>
    where
        F: FnMut(usize, &str) + Send + 'static,
    {
        let lyrics = Lyrics::from_path(config.resolve(name))?;
        let engine = Self::from_lyrics(lyrics, on_line);
        engine.set_lead_ms(config.lead_ms);
        Ok(engine)
    }

    fn build(lyrics: Lyrics, on_line: LineCallback, runtime: Option<Handle>) -> Self {
        Self {
            inner: Arc::new(Inner {
                lyrics,
                on_line: Mutex::new(on_line),
                transport: Mutex::new(Transport::default()),
                runtime,
            }),
        }
    }

    /// Metadata tags.
    pub fn tags(&self) -> &Tags {
        &self.inner.lyrics.tags
    }

    /// Lines in firing order.
    pub fn lines(&self) -> &[LyricLine] {
        &self.inner.lyrics.lines
    }

    /// The parsed document.
    pub fn lyrics(&self) -> &Lyrics {
        &self.inner.lyrics
    }

    /// Current play/pause state.
    pub fn state(&self) -> PlaybackState {
        self.inner.transport().state
    }

    /// Index of the next line to fire.
    pub fn cursor(&self) -> usize {
        self.inner.transport().cursor
    }

    /// Logical playback position in milliseconds. Frozen while paused.
    pub fn position_ms(&self) -> i64 {
        let now = self.inner.now();
        let transport = self.inner.transport();
        match transport.state {
            PlaybackState::Playing => transport.position_at(now),
            PlaybackState::Paused => transport.paused_position().unwrap_or(0),
        }
    }

    /// Fire lines this many milliseconds ahead of their timestamps.
    /// Takes effect from the next scheduled line.
    pub fn set_lead_ms(&self, lead_ms: i64) {
        self.inner.transport().lead_ms = lead_ms;
    }

    /// Start playing from `start_ms`.
    ///
    /// The first line fired is the first one stamped at or after `start_ms`;
    /// seeking past the end re-fires the last line. Does nothing when there are
    /// no lines or no tokio runtime is available.
    pub fn play(&self, start_ms: i64) {
        let lines = self.lines();
        if lines.is_empty() {
            return;
        }
        let Some(runtime) = self.inner.runtime() else {
            tracing::warn!("No tokio runtime available, ignoring play({start_ms})");
            return;
        };

        let cursor = lines
            .iter()
            .position(|line| line.time >= start_ms)
            .unwrap_or(lines.len() - 1);

        let now = {
            let _context = runtime.enter();
            Instant::now()
        };
        let mut transport = self.inner.transport();
        let session = transport.start(now, start_ms, cursor);
        tracing::debug!("Playing from {start_ms}ms at line {cursor}");
        transport.pending = Some(runtime.spawn(drive(Arc::downgrade(&self.inner), session)));
    }

    /// Pause and cancel the pending line. The cursor is kept.
    pub fn stop(&self) {
        let now = self.inner.now();
        self.inner.transport().pause(now);
        tracing::debug!("Stopped");
    }

    /// Pause if playing, otherwise resume from the paused position.
    pub fn toggle(&self) {
        let now = self.inner.now();
        let resume_from = {
            let mut transport = self.inner.transport();
            match transport.state {
                PlaybackState::Playing => {
                    transport.pause(now);
                    tracing::debug!("Paused at {:?}ms", transport.paused_position());
                    return;
                }
                PlaybackState::Paused => transport.paused_position().unwrap_or(0),
            }
        };
        self.play(resume_from);
    }
}

/// Timer loop for one play session: sleep until the cursor line is due, fire
/// it, advance, repeat. Holds only a weak reference so dropping the engine ends it.
async fn drive(engine: Weak<Inner>, session: u64) {
    loop {
        let deadline = {
            let Some(inner) = engine.upgrade() else {
                return;
            };
            let mut transport = inner.transport();
            if !transport.is_live(session) {
                return;
            }
            let due = inner
                .lyrics
                .lines
                .get(transport.cursor)
                .and_then(|line| transport.deadline(line.time));
            match due {
                Some(deadline) => deadline,
                None => {
                    // Ran off the end; nothing left pending
                    transport.pending.take();
                    return;
                }
            }
        };

        time::sleep_until(deadline).await;

        let Some(inner) = engine.upgrade() else {
            return;
        };
        // Backstop for a stop that raced the wake-up
        if !inner.emit(session) {
            return;
        }
    }
}
