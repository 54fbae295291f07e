//! `lrc-sync` - LRC lyric parsing with time-synchronized line playback.
//!
//! [`Lyrics::parse`] extracts metadata tags and timed lines from LRC text;
//! [`LrcEngine`] fires a callback for each line as it comes due, with
//! play/stop/toggle control on top of the tokio clock.

pub mod config;
pub mod constants;
pub mod error;
pub mod lyrics;
pub mod playback;

pub use config::Config;
pub use error::{Error, Result};
pub use lyrics::{LyricLine, Lyrics, Tags};
pub use playback::{LineCallback, LrcEngine, PlaybackState};
