//! Test doubles for the upstream services

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::captions::{CaptionService, CaptionTrack, Route};
use crate::completion::{CompletionRequest, CompletionService};
use crate::proxy::{EgressPoint, ProxyDirectory};
use crate::{Error, Result, Segment, Transcript, VideoId};

pub fn track(code: &str, auto_generated: bool) -> CaptionTrack {
    CaptionTrack {
        language_code: code.to_string(),
        name: code.to_uppercase(),
        auto_generated,
    }
}

#[derive(Default)]
struct CaptionCalls {
    length: usize,
    list: usize,
    routes: Vec<Route>,
}

/// Scripted caption service that records every call
pub struct FakeCaptions {
    length: Option<u64>,
    tracks: Vec<CaptionTrack>,
    transcripts: HashMap<String, String>,
    disabled: bool,
    list_fails: bool,
    direct_failures: u32,
    proxies_fail: bool,
    rejecting: Vec<EgressPoint>,
    calls: Mutex<CaptionCalls>,
}

impl FakeCaptions {
    pub fn new(tracks: Vec<CaptionTrack>) -> Self {
        Self {
            length: None,
            tracks,
            transcripts: HashMap::new(),
            disabled: false,
            list_fails: false,
            direct_failures: 0,
            proxies_fail: false,
            rejecting: Vec::new(),
            calls: Mutex::new(CaptionCalls::default()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_length(mut self, seconds: u64) -> Self {
        self.length = Some(seconds);
        self
    }

    /// Transcript for `lang`; each line becomes one cue
    pub fn with_transcript(mut self, lang: &str, text: &str) -> Self {
        self.transcripts.insert(lang.to_string(), text.to_string());
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.list_fails = true;
        self
    }

    /// Fail the first `n` direct fetches with a transient error
    pub fn failing_direct(mut self, n: u32) -> Self {
        self.direct_failures = n;
        self
    }

    pub fn failing_proxies(mut self) -> Self {
        self.proxies_fail = true;
        self
    }

    /// Answer fetches through `proxy` with an error page
    pub fn rejecting_proxy(mut self, proxy: EgressPoint) -> Self {
        self.rejecting.push(proxy);
        self
    }

    pub fn length_calls(&self) -> usize {
        self.calls.lock().unwrap().length
    }

    pub fn list_calls(&self) -> usize {
        self.calls.lock().unwrap().list
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.lock().unwrap().routes.len()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.calls.lock().unwrap().routes.clone()
    }
}

#[async_trait]
impl CaptionService for FakeCaptions {
    async fn video_length(&self, _video_id: &VideoId) -> Result<Option<u64>> {
        self.calls.lock().unwrap().length += 1;
        Ok(self.length)
    }

    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        self.calls.lock().unwrap().list += 1;
        if self.disabled {
            return Err(Error::CaptionsDisabled(video_id.clone()));
        }
        if self.list_fails {
            return Err(Error::Transient("429 Too Many Requests".to_string()));
        }
        Ok(self.tracks.clone())
    }

    async fn fetch_track(&self, video_id: &VideoId, language_code: &str, route: &Route) -> Result<Transcript> {
        let direct_attempts = {
            let mut calls = self.calls.lock().unwrap();
            calls.routes.push(route.clone());
            calls.routes.iter().filter(|r| **r == Route::Direct).count()
        };

        match route {
            Route::Direct if direct_attempts as u64 <= u64::from(self.direct_failures) => {
                return Err(Error::Transient("connection reset".to_string()));
            }
            Route::Proxy(proxy) if self.rejecting.contains(proxy) => {
                return Err(Error::UnexpectedResponse("YouTube returned 403 Forbidden".to_string()));
            }
            Route::Proxy(_) if self.proxies_fail => {
                return Err(Error::Transient("proxy timed out".to_string()));
            }
            _ => {}
        }

        let text = self.transcripts.get(language_code).ok_or_else(|| Error::NoTranscript {
            video_id: video_id.clone(),
            lang: language_code.to_string(),
        })?;

        Ok(Transcript {
            video_id: video_id.clone(),
            title: "Fake video".to_string(),
            language: language_code.to_string(),
            auto_generated: false,
            segments: text
                .split('\n')
                .enumerate()
                .map(|(i, line)| Segment {
                    text: line.to_string(),
                    start: i as f64,
                    duration: 1.0,
                })
                .collect(),
        })
    }
}

/// Proxy directory with a fixed candidate list and a set of live proxies
pub struct FakeProxies {
    candidates: Vec<EgressPoint>,
    reachable: Vec<EgressPoint>,
    probed: Mutex<Vec<EgressPoint>>,
}

impl FakeProxies {
    /// `reachable` holds indices into `candidates`
    pub fn new(candidates: Vec<EgressPoint>, reachable: &[usize]) -> Self {
        let reachable = reachable.iter().map(|&i| candidates[i].clone()).collect();
        Self {
            candidates,
            reachable,
            probed: Mutex::new(Vec::new()),
        }
    }

    pub fn probed(&self) -> Vec<EgressPoint> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyDirectory for FakeProxies {
    async fn candidates(&self) -> Result<Vec<EgressPoint>> {
        Ok(self.candidates.clone())
    }

    async fn probe(&self, candidate: &EgressPoint) -> bool {
        self.probed.lock().unwrap().push(candidate.clone());
        self.reachable.contains(candidate)
    }
}

/// Completion backend that answers `summary N` for the N-th call (1-based)
/// and records every prompt
#[derive(Default)]
pub struct FakeCompletion {
    prompts: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
    empty: bool,
}

impl FakeCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the `n`-th call (1-based)
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self {
            empty: true,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for FakeCompletion {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let n = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(request.prompt.to_string());
            prompts.len()
        };
        if self.fail_on_call == Some(n) {
            return Err(Error::Backend("model overloaded".to_string()));
        }
        if self.empty {
            return Ok(String::new());
        }
        Ok(format!("summary {n}"))
    }
}
