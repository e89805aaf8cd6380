use log::{debug, info, warn};
use serde::Serialize;

use crate::captions::{CaptionService, CaptionTrack, LanguageChoice, Route, negotiate};
use crate::proxy::{ProxyDirectory, select_first_reachable};
use crate::retry::RetryPolicy;
use crate::{Error, Result, Transcript, VideoId};

/// Alternate routes tried before a fetch is given up for good
const MAX_PROXY_ROUTES: usize = 3;

/// A transcript together with how its language was negotiated
#[derive(Debug, Clone, Serialize)]
pub struct FetchedTranscript {
    pub transcript: Transcript,
    pub choice: LanguageChoice,
}

/// Retrieves caption catalogs and transcripts with retries, language
/// negotiation and proxy fallback
pub struct TranscriptFetcher<'a> {
    captions: &'a dyn CaptionService,
    proxies: Option<&'a dyn ProxyDirectory>,
    retry: RetryPolicy,
}

impl<'a> TranscriptFetcher<'a> {
    pub fn new(captions: &'a dyn CaptionService, proxies: Option<&'a dyn ProxyDirectory>, retry: RetryPolicy) -> Self {
        Self {
            captions,
            proxies,
            retry,
        }
    }

    /// Caption tracks for `video_id`, retried on transient failures
    pub async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let captions = self.captions;
        let tracks = self
            .retry
            .run("listing caption tracks", || captions.list_tracks(video_id))
            .await?;
        if tracks.is_empty() {
            return Err(Error::NoCaptions(video_id.clone()));
        }
        Ok(tracks)
    }

    /// Fetch the transcript in the best available language.
    ///
    /// Languages are tried in negotiated order (requested, fallback, first
    /// listed, duplicates dropped). A listed language the service then has no
    /// transcript for falls through to the remaining choices; any other
    /// failure ends the fetch.
    pub async fn fetch(&self, video_id: &VideoId, tracks: &[CaptionTrack], requested: &str) -> Result<FetchedTranscript> {
        let choices = negotiate(tracks, requested);
        let mut last_err = Error::NoCaptions(video_id.clone());

        for choice in choices {
            let lang = choice.track.language_code.as_str();
            if choice.is_substitution() {
                info!("No {requested} captions for {video_id}, trying {lang}");
            }
            match self.fetch_language(video_id, lang).await {
                Ok(transcript) => return Ok(FetchedTranscript { transcript, choice }),
                Err(e @ Error::NoTranscript { .. }) => {
                    debug!("{e}");
                    last_err = e;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err)
    }

    /// Fetch one language directly, then through alternate routes once
    /// direct attempts are exhausted
    pub async fn fetch_language(&self, video_id: &VideoId, lang: &str) -> Result<Transcript> {
        let direct_err = match self.fetch_via(video_id, lang, &Route::Direct).await {
            Ok(t) => return Ok(t),
            Err(e @ Error::RetriesExhausted { .. }) => e,
            Err(e) => return Err(e),
        };

        let Some(directory) = self.proxies else {
            return Err(direct_err);
        };

        warn!("Direct caption fetch for {video_id} exhausted, looking for a proxy: {direct_err}");

        let candidates = match directory.candidates().await {
            Ok(c) => c,
            Err(e) => {
                warn!("Could not list proxies: {e}");
                Vec::new()
            }
        };

        let mut remaining = candidates.as_slice();
        let mut routes = 0;
        let mut last_err = direct_err;

        while routes < MAX_PROXY_ROUTES {
            let Some((index, proxy)) = select_first_reachable(directory, remaining).await else {
                break;
            };
            remaining = &remaining[index + 1..];
            routes += 1;

            match self.fetch_via(video_id, lang, &Route::Proxy(proxy.clone())).await {
                Ok(t) => {
                    info!("Fetched {lang} captions for {video_id} via proxy {proxy}");
                    return Ok(t);
                }
                Err(e @ (Error::NoTranscript { .. } | Error::CaptionsDisabled(_))) => return Err(e),
                Err(e) => {
                    warn!("Proxy {proxy} failed: {e}");
                    last_err = e;
                }
            }
        }

        Err(Error::RoutesExhausted {
            operation: format!("fetching {lang} captions for {video_id}"),
            routes,
            source: Box::new(last_err),
        })
    }

    async fn fetch_via(&self, video_id: &VideoId, lang: &str, route: &Route) -> Result<Transcript> {
        let captions = self.captions;
        self.retry
            .run(&format!("fetching {lang} captions ({route})"), || {
                captions.fetch_track(video_id, lang, route)
            })
            .await
    }
}
