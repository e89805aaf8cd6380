use async_trait::async_trait;
use serde::Serialize;

use crate::proxy::EgressPoint;
use crate::{Result, Transcript, VideoId};

/// Secondary language tried when the requested one has no captions
pub const FALLBACK_LANGUAGE: &str = "hi";

/// One caption track a video offers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionTrack {
    pub language_code: String,
    pub name: String,
    pub auto_generated: bool,
}

impl std::fmt::Display for CaptionTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.auto_generated {
            "Auto-generated"
        } else {
            "Manually created"
        };
        write!(f, "{} ({}) [{kind}]", self.name, self.language_code)
    }
}

/// Network path a caption request travels over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Direct,
    Proxy(EgressPoint),
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Direct => write!(f, "direct"),
            Route::Proxy(p) => write!(f, "via {p}"),
        }
    }
}

/// Upstream captioning service
#[async_trait]
pub trait CaptionService: Send + Sync {
    /// Video length in seconds, if the service reports one
    async fn video_length(&self, video_id: &VideoId) -> Result<Option<u64>>;

    /// Caption tracks in the order the service reports them
    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>>;

    /// Caption cues for one language
    async fn fetch_track(&self, video_id: &VideoId, language_code: &str, route: &Route) -> Result<Transcript>;
}

/// Why a track was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Selection {
    Requested,
    Fallback,
    FirstAvailable,
}

/// A negotiated track together with the language the caller asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageChoice {
    pub requested: String,
    pub track: CaptionTrack,
    pub selection: Selection,
}

impl LanguageChoice {
    /// True when the caller did not get the language it asked for
    pub fn is_substitution(&self) -> bool {
        self.selection != Selection::Requested
    }
}

/// Order in which tracks should be tried for `requested`: the exact language,
/// then [`FALLBACK_LANGUAGE`], then whatever the catalog lists first.
/// Duplicate tracks are dropped, so the result holds at most three entries.
pub fn negotiate(tracks: &[CaptionTrack], requested: &str) -> Vec<LanguageChoice> {
    let candidates = [
        (tracks.iter().find(|t| t.language_code == requested), Selection::Requested),
        (
            tracks.iter().find(|t| t.language_code == FALLBACK_LANGUAGE),
            Selection::Fallback,
        ),
        (tracks.first(), Selection::FirstAvailable),
    ];

    let mut choices: Vec<LanguageChoice> = Vec::new();
    for (track, selection) in candidates {
        let Some(track) = track else { continue };
        if choices.iter().any(|c| c.track.language_code == track.language_code) {
            continue;
        }
        choices.push(LanguageChoice {
            requested: requested.to_string(),
            track: track.clone(),
            selection,
        });
    }
    choices
}
