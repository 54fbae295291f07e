//! LRC lyric parsing.
//!
//! Turns raw LRC text into [`Tags`] and a time-ordered list of [`LyricLine`]s.
//! Parsing never fails: malformed markers yield fewer lines or default tags.

mod tags;

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::time::{FRACTION_SCALE, MS_PER_MINUTE, MS_PER_SECOND};
use crate::error::{Error, Result};

pub use tags::{parse_tags, Tags};

/// Regex matching `[mm:ss]` and `[mm:ss.xx]` / `[mm:ss.xxx]` time markers.
#[allow(clippy::expect_used)]
static RE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([0-9]{2,}):([0-9]{2})(?:\.([0-9]{2,3}))?\]").expect("valid regex: RE_TIME")
});

/// A single timed lyric line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LyricLine {
    /// Due time in milliseconds, offset tag included. May be negative.
    pub time: i64,
    /// Lyric text with time markers removed. Never empty.
    pub text: String,
}

/// Parsed LRC document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lyrics {
    /// Metadata tags.
    pub tags: Tags,
    /// Lines sorted ascending by time.
    pub lines: Vec<LyricLine>,
}

impl Lyrics {
    /// Parse LRC text.
    pub fn parse(text: &str) -> Self {
        let tags = parse_tags(text);
        let offset = tags.offset_ms();

        let mut lines: Vec<LyricLine> = text
            .split('\n')
            .filter_map(|raw| parse_line(raw, offset))
            .collect();

        // Stable: equal timestamps keep file order
        lines.sort_by_key(|line| line.time);

        tracing::debug!("Parsed {} timed lines", lines.len());
        Self { tags, lines }
    }

    /// Read and parse an LRC file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs_err::read_to_string(path)
            .map_err(|e| Error::io(e, path.to_path_buf()))?;
        let lyrics = Self::parse(&text);
        tracing::info!("Loaded {} lyric lines from {}", lyrics.lines.len(), path.display());
        Ok(lyrics)
    }

    /// Index of the line showing at `position_ms`: the last line whose time
    /// is not after the position. `None` before the first line.
    pub fn line_at(&self, position_ms: i64) -> Option<usize> {
        self.lines
            .partition_point(|line| line.time <= position_ms)
            .checked_sub(1)
    }

    /// Pretty JSON dump of tags and lines.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of timed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no timed lines were found.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Time in milliseconds of the first marker on `line`, offset excluded.
pub fn parse_time_marker(line: &str) -> Option<i64> {
    let caps = RE_TIME.captures(line)?;
    let minutes: i64 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: i64 = caps.get(2)?.as_str().parse().ok()?;
    let fraction: i64 = match caps.get(3) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    minutes
        .checked_mul(MS_PER_MINUTE)?
        .checked_add(seconds * MS_PER_SECOND)?
        .checked_add(fraction * FRACTION_SCALE)
}

/// One physical line to a timed line. Only the first marker sets the time,
/// every marker is stripped from the text.
fn parse_line(raw: &str, offset: i64) -> Option<LyricLine> {
    let time = parse_time_marker(raw)?;
    let text = RE_TIME.replace_all(raw, "");
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(LyricLine {
        time: time.saturating_add(offset),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn line(time: i64, text: &str) -> LyricLine {
        LyricLine { time, text: text.to_string() }
    }

    #[test]
    fn test_parse_basic_example() {
        let lyrics = Lyrics::parse("[ar:Test]\n[00:01.50]Hello\n[00:00.20]World");
        assert_eq!(lyrics.tags.artist, "Test");
        assert_eq!(lyrics.lines, vec![line(200, "World"), line(1500, "Hello")]);
    }

    #[test]
    fn test_time_marker_forms() {
        assert_eq!(parse_time_marker("[01:02]x"), Some(62_000));
        assert_eq!(parse_time_marker("[01:02.34]x"), Some(62_340));
        // Three fraction digits are still scaled by ten
        assert_eq!(parse_time_marker("[00:00.123]x"), Some(1_230));
        assert_eq!(parse_time_marker("[100:00]x"), Some(6_000_000));
    }

    #[test]
    fn test_time_marker_rejects_malformed() {
        assert_eq!(parse_time_marker("[1:02.34]x"), None);
        assert_eq!(parse_time_marker("[01:2.34]x"), None);
        assert_eq!(parse_time_marker("[01:02.3]x"), None);
        assert_eq!(parse_time_marker("[01:02.3456]x"), None);
        assert_eq!(parse_time_marker("01:02.34 x"), None);
    }

    #[test]
    fn test_first_marker_sets_time_all_markers_removed() {
        let lyrics = Lyrics::parse("[00:05.00][00:01.00]Chorus");
        assert_eq!(lyrics.lines, vec![line(5_000, "Chorus")]);
    }

    #[test]
    fn test_lines_without_text_or_marker_are_dropped() {
        let lyrics = Lyrics::parse("[ti:Song]\nplain text\n[00:01.00]   \n[00:02.00]kept\n\n");
        assert_eq!(lyrics.lines, vec![line(2_000, "kept")]);
    }

    #[test]
    fn test_offset_applied_per_line() {
        let base = Lyrics::parse("[00:01.00]a\n[00:03.00]b");
        let shifted = Lyrics::parse("[offset:+1000]\n[00:01.00]a\n[00:03.00]b");
        for (plain, moved) in base.lines.iter().zip(&shifted.lines) {
            assert_eq!(moved.time, plain.time + 1000);
        }
    }

    #[test]
    fn test_negative_offset_can_go_below_zero() {
        let lyrics = Lyrics::parse("[offset:-500]\n[00:00.10]early");
        assert_eq!(lyrics.lines, vec![line(-400, "early")]);
    }

    #[test]
    fn test_sorted_and_stable() {
        let lyrics = Lyrics::parse("[00:03.00]c\n[00:01.00]a\n[00:03.00]d\n[00:02.00]b");
        let texts: Vec<&str> = lyrics.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
        assert!(lyrics.lines.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_crlf_input() {
        let lyrics = Lyrics::parse("[ti:Win]\r\n[00:01.00]one\r\n[00:02.00]two\r\n");
        assert_eq!(lyrics.tags.title, "Win");
        assert_eq!(lyrics.lines, vec![line(1_000, "one"), line(2_000, "two")]);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let text = "[ar:A]\n[offset:20]\n[00:02.00]two\n[00:01.00]one";
        assert_eq!(Lyrics::parse(text), Lyrics::parse(text));
    }

    #[test]
    fn test_no_markers_yields_empty() {
        let lyrics = Lyrics::parse("just some words\nno timing here");
        assert!(lyrics.is_empty());
        assert_eq!(lyrics.len(), 0);
    }

    #[test]
    fn test_line_at() {
        let lyrics = Lyrics::parse("[00:01.00]a\n[00:02.00]b\n[00:04.00]c");
        assert_eq!(lyrics.line_at(0), None);
        assert_eq!(lyrics.line_at(1_000), Some(0));
        assert_eq!(lyrics.line_at(3_999), Some(1));
        assert_eq!(lyrics.line_at(60_000), Some(2));
    }

    #[test]
    fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.lrc");
        std::fs::write(&path, "[ti:File]\n[00:01.00]from disk").unwrap();

        let lyrics = Lyrics::from_path(&path).unwrap();
        assert_eq!(lyrics.tags.title, "File");
        assert_eq!(lyrics.lines, vec![line(1_000, "from disk")]);
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.lrc");
        match Lyrics::from_path(&path) {
            Err(Error::Io { path: Some(p), .. }) => assert_eq!(p, path),
            other => panic!("Expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_to_json_dump() {
        let lyrics = Lyrics::parse("[ar:Json]\n[00:01.00]x");
        let json: serde_json::Value = serde_json::from_str(&lyrics.to_json().unwrap()).unwrap();
        assert_eq!(json["tags"]["artist"], "Json");
        assert_eq!(json["lines"][0]["time"], 1000);
        assert_eq!(json["lines"][0]["text"], "x");
    }
}
