use thiserror::Error;

use crate::VideoId;

/// Coarse classification of every failure, used by callers to decide how to
/// react (fix input, pick another video, retry later, check credentials).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CallerInput,
    CaptionsUnavailable,
    TransientUpstream,
    PermanentFailure,
    Generation,
    CredentialMissing,
}

/// Stage of the completion pipeline a generation failure happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Map { chunk: usize },
    Reduce,
    Translate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Map { chunk } => write!(f, "summarizing chunk {}", chunk + 1),
            Stage::Reduce => write!(f, "combining chunk summaries"),
            Stage::Translate => write!(f, "translating summary"),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("could not extract a video ID from: {0}")]
    InvalidUrl(String),

    #[error("video is {duration}s long, the limit is {limit}s")]
    VideoTooLong { duration: u64, limit: u64 },

    #[error("transcript is empty")]
    EmptyTranscript,

    #[error("unknown target language: {0}")]
    UnknownLanguage(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("nothing to {action}: {missing} has not been produced yet")]
    MissingState { action: &'static str, missing: &'static str },

    #[error("captions are disabled for video {0}")]
    CaptionsDisabled(VideoId),

    #[error("no captions available for video {0}")]
    NoCaptions(VideoId),

    #[error("no {lang} transcript for video {video_id}")]
    NoTranscript { video_id: VideoId, lang: String },

    #[error("upstream request failed: {0}")]
    Transient(String),

    #[error("unexpected upstream response: {0}")]
    UnexpectedResponse(String),

    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        source: Box<Error>,
    },

    #[error("{operation} failed directly and through {routes} alternate route(s): {source}")]
    RoutesExhausted {
        operation: String,
        routes: usize,
        source: Box<Error>,
    },

    #[error("completion backend error: {0}")]
    Backend(String),

    #[error("generation failed while {stage}: {reason}")]
    Generation { stage: Stage, reason: String },

    #[error("missing API key: set {env_var} or pass --api-key")]
    CredentialMissing { env_var: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_)
            | Error::VideoTooLong { .. }
            | Error::EmptyTranscript
            | Error::UnknownLanguage(_)
            | Error::InvalidConfig(_)
            | Error::MissingState { .. } => ErrorKind::CallerInput,
            Error::CaptionsDisabled(_) | Error::NoCaptions(_) | Error::NoTranscript { .. } => {
                ErrorKind::CaptionsUnavailable
            }
            Error::Transient(_) => ErrorKind::TransientUpstream,
            Error::UnexpectedResponse(_) | Error::RetriesExhausted { .. } | Error::RoutesExhausted { .. } => {
                ErrorKind::PermanentFailure
            }
            Error::Backend(_) | Error::Generation { .. } => ErrorKind::Generation,
            Error::CredentialMissing { .. } => ErrorKind::CredentialMissing,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::TransientUpstream
    }

    /// Wrap a completion failure with the pipeline stage it happened in.
    /// Credential problems pass through so they stay distinguishable.
    pub fn in_stage(self, stage: Stage) -> Error {
        match self {
            Error::CredentialMissing { .. } | Error::Generation { .. } => self,
            other => Error::Generation {
                stage,
                reason: other.to_string(),
            },
        }
    }

    /// Actionable guidance shown below the error message
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::InvalidUrl(_) => Some(
                "Supported formats:\n  https://www.youtube.com/watch?v=ID\n  https://youtu.be/ID\n  \
                 https://www.youtube.com/embed/ID\n  https://www.youtube.com/v/ID\n  \
                 https://www.youtube.com/e/ID\n  https://www.youtube.com/shorts/ID\n  \
                 https://www.youtube.com/live/ID\n  https://www.youtube.com/user/NAME/ID\n  \
                 <11-character video ID>",
            ),
            Error::CaptionsDisabled(_) => Some(
                "The creator disabled subtitles for this video. Try a video that has manual \
                 captions or auto-generated captions enabled (check the CC button on YouTube).",
            ),
            Error::NoCaptions(_) => Some(
                "The video may be too new for auto-captions, private, or unavailable. \
                 Try a different video that has captions enabled.",
            ),
            Error::VideoTooLong { .. } => Some("Summaries work best for videos under 10 minutes; try a shorter video."),
            Error::CredentialMissing { .. } => {
                Some("Get a free key at https://console.groq.com and pass it with --api-key.")
            }
            Error::RetriesExhausted { .. } | Error::RoutesExhausted { .. } => {
                Some("YouTube may be rate-limiting this network; wait a while and try again.")
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() || e.is_builder() {
            Error::UnexpectedResponse(e.to_string())
        } else {
            Error::Transient(e.to_string())
        }
    }
}
