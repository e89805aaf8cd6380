use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::captions::{CaptionService, CaptionTrack, Route};
use crate::proxy::proxied_client;
use crate::{Error, Result, Segment, Transcript, VideoId};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const PROXY_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct InnerTubePlayerResponse {
    #[serde(rename = "playabilityStatus")]
    playability_status: Option<PlayabilityStatus>,
    captions: Option<CaptionsData>,
    #[serde(rename = "videoDetails")]
    video_details: Option<VideoDetails>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: Option<String>,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    title: Option<String>,
    #[serde(rename = "lengthSeconds")]
    length_seconds: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<RawCaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct RawCaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackName {
    #[serde(rename = "simpleText")]
    simple_text: Option<String>,
    runs: Option<Vec<TextRun>>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl RawCaptionTrack {
    fn to_track(&self) -> CaptionTrack {
        let name = self
            .name
            .as_ref()
            .and_then(|n| {
                n.simple_text.clone().or_else(|| {
                    n.runs
                        .as_ref()
                        .map(|runs| runs.iter().map(|r| r.text.as_str()).collect::<String>())
                })
            })
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.language_code.clone());

        CaptionTrack {
            language_code: self.language_code.clone(),
            name,
            auto_generated: self.kind.as_deref() == Some("asr"),
        }
    }

    /// Caption XML URL; the srv3 format variant is dropped in favour of the
    /// plain `<text start dur>` format the parser understands
    fn xml_url(&self) -> String {
        self.base_url.replace("&fmt=srv3", "")
    }
}

impl InnerTubePlayerResponse {
    fn title(&self) -> String {
        self.video_details
            .as_ref()
            .and_then(|vd| vd.title.clone())
            .unwrap_or_default()
    }

    fn length_seconds(&self) -> Option<u64> {
        self.video_details
            .as_ref()
            .and_then(|vd| vd.length_seconds.as_deref())
            .and_then(|s| s.parse().ok())
    }

    /// Caption tracks, distinguishing "disabled" from "none yet / unplayable"
    fn caption_tracks(&self, video_id: &VideoId) -> Result<&[RawCaptionTrack]> {
        if let Some(status) = &self.playability_status {
            if status.status.as_deref().is_some_and(|s| s != "OK") {
                debug!(
                    "Video {video_id} not playable: {}",
                    status.reason.as_deref().unwrap_or("no reason given")
                );
                return Err(Error::NoCaptions(video_id.clone()));
            }
        }

        let Some(captions) = &self.captions else {
            return Err(Error::CaptionsDisabled(video_id.clone()));
        };

        let tracks = captions
            .player_captions_tracklist_renderer
            .as_ref()
            .and_then(|r| r.caption_tracks.as_deref())
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(Error::NoCaptions(video_id.clone()));
        }
        Ok(tracks)
    }
}

/// Caption service that talks to YouTube's InnerTube API
pub struct YouTubeCaptions {
    client: reqwest::Client,
}

impl YouTubeCaptions {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn client_for(&self, route: &Route) -> Result<reqwest::Client> {
        match route {
            Route::Direct => Ok(self.client.clone()),
            Route::Proxy(proxy) => proxied_client(proxy, PROXY_TIMEOUT),
        }
    }
}

#[async_trait]
impl CaptionService for YouTubeCaptions {
    async fn video_length(&self, video_id: &VideoId) -> Result<Option<u64>> {
        let resp = player_response(&self.client, video_id).await?;
        Ok(resp.length_seconds())
    }

    async fn list_tracks(&self, video_id: &VideoId) -> Result<Vec<CaptionTrack>> {
        let resp = player_response(&self.client, video_id).await?;
        let tracks = resp.caption_tracks(video_id)?;
        Ok(tracks.iter().map(RawCaptionTrack::to_track).collect())
    }

    async fn fetch_track(&self, video_id: &VideoId, language_code: &str, route: &Route) -> Result<Transcript> {
        let client = self.client_for(route)?;
        let resp = player_response(&client, video_id).await?;
        let tracks = resp.caption_tracks(video_id)?;

        let track = tracks
            .iter()
            .find(|t| t.language_code == language_code)
            .ok_or_else(|| Error::NoTranscript {
                video_id: video_id.clone(),
                lang: language_code.to_string(),
            })?;

        debug!("Fetching caption track: lang={language_code} route={route}");

        let caption_xml = checked(client.get(track.xml_url()).header("User-Agent", USER_AGENT).send().await?)?
            .text()
            .await?;

        let segments = parse_caption_xml(&caption_xml)?;

        Ok(Transcript {
            video_id: video_id.clone(),
            title: resp.title(),
            language: track.language_code.clone(),
            auto_generated: track.to_track().auto_generated,
            segments,
        })
    }
}

/// Classify an HTTP status: throttling and server errors are worth retrying
fn checked(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(Error::Transient(format!("YouTube returned {status}")))
    } else {
        Err(Error::UnexpectedResponse(format!("YouTube returned {status} for {}", resp.url())))
    }
}

async fn player_response(client: &reqwest::Client, video_id: &VideoId) -> Result<InnerTubePlayerResponse> {
    // Step 1: Fetch the watch page to get the InnerTube API key
    let watch_url = format!("https://www.youtube.com/watch?v={video_id}");
    debug!("Fetching watch page: {watch_url}");

    let page_html = checked(client.get(&watch_url).header("User-Agent", USER_AGENT).send().await?)?
        .text()
        .await?;

    if page_html.contains("class=\"g-recaptcha\"") {
        return Err(Error::Transient("YouTube is rate-limiting this network (captcha)".to_string()));
    }

    let api_key = extract_api_key(&page_html)?;
    debug!("Extracted InnerTube API key: {api_key}");

    // Step 2: Call InnerTube player endpoint
    let player_url = format!("https://www.youtube.com/youtubei/v1/player?key={api_key}&prettyPrint=false");

    let body = serde_json::json!({
        "context": {
            "client": {
                "hl": "en",
                "gl": "US",
                "clientName": "WEB",
                "clientVersion": "2.20241126.01.00"
            }
        },
        "videoId": video_id.as_str()
    });

    let resp = checked(
        client
            .post(&player_url)
            .header("User-Agent", USER_AGENT)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?,
    )?
    .json()
    .await?;

    Ok(resp)
}

fn extract_api_key(html: &str) -> Result<String> {
    let re = Regex::new(r#""INNERTUBE_API_KEY"\s*:\s*"([^"]+)""#).map_err(|e| Error::UnexpectedResponse(e.to_string()))?;
    if let Some(caps) = re.captures(html) {
        return Ok(caps[1].to_string());
    }

    // Fallback: try the newer pattern
    let re2 = Regex::new(r#"innertubeApiKey\s*[=:]\s*"([^"]+)""#).map_err(|e| Error::UnexpectedResponse(e.to_string()))?;
    if let Some(caps) = re2.captures(html) {
        return Ok(caps[1].to_string());
    }

    Err(Error::UnexpectedResponse(
        "could not extract InnerTube API key from watch page".to_string(),
    ))
}

fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                // Some tracks omit `dur` on the last cue
                current_dur = dur.or(Some(0.0));
            }
            Ok(Event::Empty(_)) => {}
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let text = html_escape::decode_html_entities(&raw_text).trim().to_string();
                    if !text.is_empty() {
                        segments.push(Segment {
                            text,
                            start,
                            duration: dur,
                        });
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::UnexpectedResponse(format!("error parsing caption XML: {e}"))),
            _ => {}
        }
    }

    Ok(segments)
}
