//! LRC metadata tags (`[ti:...]`, `[ar:...]`, ...).

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::constants::tags;

/// One case-insensitive `[key:value]` matcher per recognized key.
#[allow(clippy::expect_used)]
static RE_TAGS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    tags::ALL
        .iter()
        .map(|key| {
            let pattern = format!(r"(?i)\[{}:([^\]]*)\]", regex::escape(key));
            (*key, Regex::new(&pattern).expect("valid regex: RE_TAGS"))
        })
        .collect()
});

/// Metadata tags found in an LRC file.
///
/// Every value defaults to an empty string when its marker is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tags {
    /// `[ti:...]` song title.
    pub title: String,
    /// `[ar:...]` performing artist.
    pub artist: String,
    /// `[al:...]` album.
    pub album: String,
    /// `[offset:...]` raw offset text; see [`Tags::offset_ms`].
    pub offset: String,
    /// `[by:...]` creator of the lyric file.
    pub editor: String,
}

impl Tags {
    /// Look up a tag by its short LRC key (`ti`, `ar`, `al`, `offset`, `by`).
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key.to_ascii_lowercase().as_str() {
            tags::TITLE => &self.title,
            tags::ARTIST => &self.artist,
            tags::ALBUM => &self.album,
            tags::OFFSET => &self.offset,
            tags::EDITOR => &self.editor,
            _ => return None,
        };
        Some(value)
    }

    /// Numeric value of the offset tag in milliseconds.
    ///
    /// Accepts an optional sign (`+1000`, `-250`) as well as decimal and
    /// exponent forms (`1.5`, `1e3`), truncated toward zero. Missing,
    /// non-numeric or non-finite values count as `0`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn offset_ms(&self) -> i64 {
        let raw = self.offset.trim();
        raw.parse::<i64>()
            .ok()
            .or_else(|| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|value| value.is_finite())
                    .map(|value| value.trunc() as i64)
            })
            .unwrap_or(0)
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            tags::TITLE => Some(&mut self.title),
            tags::ARTIST => Some(&mut self.artist),
            tags::ALBUM => Some(&mut self.album),
            tags::OFFSET => Some(&mut self.offset),
            tags::EDITOR => Some(&mut self.editor),
            _ => None,
        }
    }
}

/// Extract the recognized tags from raw LRC text.
///
/// Each key is searched independently over the whole text, so a tag placed
/// after lyric lines is still found. The first match for a key wins.
pub fn parse_tags(text: &str) -> Tags {
    let mut found = Tags::default();

    for (key, re) in RE_TAGS.iter() {
        let Some(value) = re.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };
        if let Some(slot) = found.slot_mut(key) {
            *slot = value.as_str().to_string();
        }
    }

    found
}
