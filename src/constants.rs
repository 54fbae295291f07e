//! Library constants.
//!
//! Centralizes tag keys, time conversions and environment variable names.

/// Recognized LRC metadata tag keys.
pub mod tags {
    /// Song title.
    pub const TITLE: &str = "ti";

    /// Performing artist.
    pub const ARTIST: &str = "ar";

    /// Album the song belongs to.
    pub const ALBUM: &str = "al";

    /// Millisecond adjustment applied to every line.
    pub const OFFSET: &str = "offset";

    /// Creator of the lyric file.
    pub const EDITOR: &str = "by";

    /// All recognized keys, in lookup order.
    pub const ALL: [&str; 5] = [TITLE, ARTIST, ALBUM, OFFSET, EDITOR];
}

/// Time marker conversion factors.
pub mod time {
    /// Milliseconds per minute.
    pub const MS_PER_MINUTE: i64 = 60_000;

    /// Milliseconds per second.
    pub const MS_PER_SECOND: i64 = 1_000;

    /// Multiplier applied to the captured fraction digits.
    pub const FRACTION_SCALE: i64 = 10;
}

/// Environment variable names read by [`crate::config::Config::load`].
pub mod env {
    /// Directory that relative lyric file names resolve against.
    pub const LYRICS_DIR: &str = "LRC_LYRICS_DIR";

    /// Milliseconds to fire each line ahead of its timestamp.
    pub const LEAD_MS: &str = "LRC_LEAD_MS";
}
