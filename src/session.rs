use log::{info, warn};

use crate::captions::{CaptionService, CaptionTrack};
use crate::completion::{CompletionService, GenerationParams};
use crate::fetcher::{FetchedTranscript, TranscriptFetcher};
use crate::languages::Language;
use crate::proxy::ProxyDirectory;
use crate::retry::RetryPolicy;
use crate::splitter::TextSplitter;
use crate::summarize::{Summary, SummaryPipeline};
use crate::translate::{Translation, translate};
use crate::{Error, Result, VideoId, extract_video_id};

/// Longest video accepted, in seconds (inclusive)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 600;
pub const DEFAULT_LANGUAGE: &str = "en";

/// Tunables for one workflow
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub preferred_language: String,
    pub max_duration_secs: u64,
    pub splitter: TextSplitter,
    pub retry: RetryPolicy,
    pub generation: GenerationParams,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_language: DEFAULT_LANGUAGE.to_string(),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
            splitter: TextSplitter::default(),
            retry: RetryPolicy::default(),
            generation: GenerationParams::default(),
        }
    }
}

/// Reject videos longer than `limit` seconds. An unknown length passes.
pub fn check_duration(duration: Option<u64>, limit: u64) -> Result<()> {
    match duration {
        Some(duration) if duration > limit => Err(Error::VideoTooLong { duration, limit }),
        _ => Ok(()),
    }
}

/// Everything produced for the video currently being worked on.
///
/// Submitting a new URL clears every derived artifact first, and storing a
/// new summary drops any translation of the old one.
#[derive(Debug, Default)]
pub struct Session {
    api_key: Option<String>,
    url: Option<String>,
    video_id: Option<VideoId>,
    tracks: Option<Vec<CaptionTrack>>,
    transcript: Option<FetchedTranscript>,
    summary: Option<Summary>,
    translation: Option<Translation>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `key` instead of the environment credential; blank clears it
    pub fn set_api_key(&mut self, key: &str) {
        let key = key.trim();
        self.api_key = (!key.is_empty()).then(|| key.to_string());
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Start over with a new video. Derived state is cleared even when the
    /// URL turns out to be invalid.
    pub fn submit_url(&mut self, url: &str) -> Result<&VideoId> {
        self.reset();
        self.url = Some(url.trim().to_string());
        let id = extract_video_id(url).ok_or_else(|| Error::InvalidUrl(url.trim().to_string()))?;
        info!("Working on video {id}");
        Ok(self.video_id.insert(id))
    }

    /// Clear the video and everything derived from it; the API key is kept
    pub fn reset(&mut self) {
        self.url = None;
        self.video_id = None;
        self.tracks = None;
        self.transcript = None;
        self.summary = None;
        self.translation = None;
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn video_id(&self) -> Option<&VideoId> {
        self.video_id.as_ref()
    }

    pub fn tracks(&self) -> Option<&[CaptionTrack]> {
        self.tracks.as_deref()
    }

    pub fn transcript(&self) -> Option<&FetchedTranscript> {
        self.transcript.as_ref()
    }

    pub fn summary(&self) -> Option<&Summary> {
        self.summary.as_ref()
    }

    pub fn translation(&self) -> Option<&Translation> {
        self.translation.as_ref()
    }

    fn set_transcript(&mut self, transcript: FetchedTranscript) -> &FetchedTranscript {
        self.summary = None;
        self.translation = None;
        self.transcript.insert(transcript)
    }

    fn set_summary(&mut self, summary: Summary) -> &Summary {
        self.translation = None;
        self.summary.insert(summary)
    }

    fn require_video(&self, action: &'static str) -> Result<VideoId> {
        self.video_id.clone().ok_or(Error::MissingState {
            action,
            missing: "a video URL",
        })
    }
}

/// Runs the user-facing steps against a [`Session`], one at a time
pub struct Workflow<'a> {
    captions: &'a dyn CaptionService,
    proxies: Option<&'a dyn ProxyDirectory>,
    completion: &'a dyn CompletionService,
    settings: Settings,
}

impl<'a> Workflow<'a> {
    pub fn new(
        captions: &'a dyn CaptionService,
        proxies: Option<&'a dyn ProxyDirectory>,
        completion: &'a dyn CompletionService,
        settings: Settings,
    ) -> Self {
        Self {
            captions,
            proxies,
            completion,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn fetcher(&self) -> TranscriptFetcher<'a> {
        TranscriptFetcher::new(self.captions, self.proxies, self.settings.retry)
    }

    /// Check the video length, then list its caption tracks
    pub async fn load_captions<'s>(&self, session: &'s mut Session) -> Result<&'s [CaptionTrack]> {
        let video_id = session.require_video("list captions for")?;

        let duration = match self.captions.video_length(&video_id).await {
            Ok(d) => d,
            Err(e) => {
                warn!("Could not determine length of {video_id}: {e}");
                None
            }
        };
        check_duration(duration, self.settings.max_duration_secs)?;

        let tracks = self.fetcher().list_tracks(&video_id).await?;
        Ok(session.tracks.insert(tracks))
    }

    /// Fetch the transcript in the preferred language (or its fallbacks)
    pub async fn fetch_transcript<'s>(&self, session: &'s mut Session) -> Result<&'s FetchedTranscript> {
        let video_id = session.require_video("fetch a transcript for")?;
        if session.tracks.is_none() {
            self.load_captions(session).await?;
        }
        let tracks = session.tracks.as_deref().unwrap_or_default();

        let fetched = self
            .fetcher()
            .fetch(&video_id, tracks, &self.settings.preferred_language)
            .await?;
        if fetched.choice.is_substitution() {
            warn!(
                "Requested language {} not available, using {}",
                fetched.choice.requested, fetched.choice.track
            );
        }

        Ok(session.set_transcript(fetched))
    }

    /// Summarize the session's transcript; any previous translation is dropped
    pub async fn summarize<'s>(&self, session: &'s mut Session) -> Result<&'s Summary> {
        let transcript = session.transcript.as_ref().ok_or(Error::MissingState {
            action: "summarize",
            missing: "a transcript",
        })?;
        let text = transcript.transcript.text();

        let summary = SummaryPipeline::new(self.completion, self.settings.splitter, &self.settings.generation)
            .summarize(&text)
            .await?;

        Ok(session.set_summary(summary))
    }

    /// Translate the current summary into `target`
    pub async fn translate<'s>(&self, session: &'s mut Session, target: &Language) -> Result<&'s Translation> {
        let summary = session.summary.as_ref().ok_or(Error::MissingState {
            action: "translate",
            missing: "a summary",
        })?;

        let translation = translate(self.completion, &self.settings.generation, summary, target).await?;
        Ok(session.translation.insert(translation))
    }
}
