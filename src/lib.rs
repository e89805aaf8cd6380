pub mod captions;
pub mod completion;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod languages;
pub mod output;
pub mod proxy;
pub mod retry;
pub mod session;
pub mod splitter;
pub mod summarize;
pub mod translate;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use error::{Error, ErrorKind, Result};

/// Characters allowed in a video ID
const ID: &str = "[A-Za-z0-9_-]";

/// URL shapes that carry a video ID, tried in order; first match wins.
/// Each pattern requires exactly 11 ID characters not followed by another.
static URL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"youtube\.com/watch\?(?:[^#]*&)?v=",
        r"youtu\.be/",
        r"youtube\.com/embed/",
        r"youtube\.com/v/",
        r"youtube\.com/e/",
        r"youtube\.com/shorts/",
        r"youtube\.com/(?:[^/?#]+/)?live/",
        r"youtube\.com/user/[^/?#]+/",
    ]
    .iter()
    .map(|prefix| Regex::new(&format!(r"{prefix}({ID}{{11}})(?:[^A-Za-z0-9_-]|$)")).expect("valid URL pattern"))
    .collect()
});

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(&format!("^{ID}{{11}}$")).expect("valid ID pattern"));

/// An 11-character YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub(crate) fn new(id: &str) -> Self {
        VideoId(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single captioned segment
#[derive(Debug, Clone, Serialize)]
pub struct Segment {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

/// Complete transcript for a video in one caption language
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: VideoId,
    pub title: String,
    pub language: String,
    pub auto_generated: bool,
    pub segments: Vec<Segment>,
}

impl Transcript {
    /// Flatten the cues into plain text, one cue per line
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extract video ID from various YouTube URL formats
pub fn extract_video_id(input: &str) -> Option<VideoId> {
    let input = input.trim();

    if BARE_ID.is_match(input) {
        return Some(VideoId::new(input));
    }

    URL_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .map(|caps| VideoId::new(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Option<VideoId> {
        Some(VideoId::new(s))
    }

    #[test]
    fn test_bare_video_id() {
        assert_eq!(extract_video_id("dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            id("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_video_id("https://m.youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(extract_video_id("https://youtu.be/abcDEFghiJK"), id("abcDEFghiJK"));
        assert_eq!(extract_video_id("https://youtu.be/abcDEFghiJK?si=xyz"), id("abcDEFghiJK"));
    }

    #[test]
    fn test_embed_v_and_e_urls() {
        assert_eq!(extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
        assert_eq!(extract_video_id("https://www.youtube.com/v/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
        assert_eq!(extract_video_id("https://www.youtube.com/e/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_live_urls() {
        assert_eq!(extract_video_id("https://www.youtube.com/live/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
        assert_eq!(
            extract_video_id("https://www.youtube.com/@channel/live/dQw4w9WgXcQ?feature=shared"),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_user_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/user/someone/dQw4w9WgXcQ"),
            id("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_shorts_url() {
        assert_eq!(extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        assert_eq!(extract_video_id("https://youtu.be/abcDEFghiJ"), None);
        assert_eq!(extract_video_id("https://youtu.be/abcDEFghiJKL"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v=short"), None);
    }

    #[test]
    fn test_invalid_url() {
        assert_eq!(extract_video_id("not-a-valid-id"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=dQw4w9WgXcQ"), None);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_whitespace_trimming() {
        assert_eq!(extract_video_id("  dQw4w9WgXcQ  "), id("dQw4w9WgXcQ"));
    }

    #[test]
    fn test_transcript_text() {
        let t = Transcript {
            video_id: VideoId::new("dQw4w9WgXcQ"),
            title: String::new(),
            language: "en".to_string(),
            auto_generated: false,
            segments: vec![
                Segment {
                    text: "Hello world".to_string(),
                    start: 0.0,
                    duration: 1.5,
                },
                Segment {
                    text: "This is a test".to_string(),
                    start: 1.5,
                    duration: 2.0,
                },
            ],
        };
        assert_eq!(t.text(), "Hello world\nThis is a test");
    }
}
