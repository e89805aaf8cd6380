use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;

use crate::error::Stage;
use crate::{Error, Result};

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling parameters sent with every completion call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub prompt: &'a str,
    pub params: &'a GenerationParams,
}

/// Hosted text-completion backend
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String>;
}

/// Run one completion for a pipeline stage. Backend failures and empty
/// output both become [`Error::Generation`] for that stage.
pub async fn generate(
    service: &dyn CompletionService,
    params: &GenerationParams,
    prompt: &str,
    stage: Stage,
) -> Result<String> {
    debug!("Completion call ({stage}): {} prompt chars", prompt.chars().count());
    let text = service
        .complete(&CompletionRequest { prompt, params })
        .await
        .map_err(|e| e.in_stage(stage))?;
    if text.trim().is_empty() {
        return Err(Error::Generation {
            stage,
            reason: "backend returned an empty response".to_string(),
        });
    }
    Ok(text)
}

/// Completion API flavour, picked from the model name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Groq,
    OpenAi,
    Anthropic,
}

impl Backend {
    pub fn for_model(model: &str) -> Self {
        if model.starts_with("claude") {
            Backend::Anthropic
        } else if model.starts_with("gpt-") || ["o1", "o3", "o4"].iter().any(|p| model.starts_with(p)) {
            Backend::OpenAi
        } else {
            Backend::Groq
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Backend::Groq => "GROQ_API_KEY",
            Backend::OpenAi => "OPENAI_API_KEY",
            Backend::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn endpoint(&self) -> &'static str {
        match self {
            Backend::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Backend::OpenAi => "https://api.openai.com/v1/chat/completions",
            Backend::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Backend::Groq => "Groq",
            Backend::OpenAi => "OpenAI",
            Backend::Anthropic => "Anthropic",
        }
    }
}

/// Pick the API key: a non-empty user-supplied key wins over the environment
pub fn resolve_api_key(user_key: Option<&str>, env_value: Option<String>, env_var: &str) -> Result<String> {
    user_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .or_else(|| env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
        .ok_or_else(|| Error::CredentialMissing {
            env_var: env_var.to_string(),
        })
}

/// Completion service over HTTP chat/messages APIs
pub struct HttpCompletion {
    client: reqwest::Client,
    backend: Backend,
    api_key: String,
}

impl HttpCompletion {
    /// Resolve the credential for `model` without touching the network
    pub fn new(client: reqwest::Client, model: &str, user_key: Option<&str>) -> Result<Self> {
        let backend = Backend::for_model(model);
        let env_var = backend.env_var();
        let api_key = resolve_api_key(user_key, std::env::var(env_var).ok(), env_var)?;
        Ok(Self {
            client,
            backend,
            api_key,
        })
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    async fn post(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let resp = request
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| Error::Backend(format!("{} request failed: {e}", self.backend.name())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                return Err(Error::Backend(format!(
                    "{} rejected the API key ({status}); check {} or --api-key",
                    self.backend.name(),
                    self.backend.env_var()
                )));
            }
            return Err(Error::Backend(format!("{} API returned {status}: {body}", self.backend.name())));
        }

        resp.json()
            .await
            .map_err(|e| Error::Backend(format!("invalid {} response: {e}", self.backend.name())))
    }
}

#[async_trait]
impl CompletionService for HttpCompletion {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let params = request.params;
        debug!("Completing via {} with model {}", self.backend.name(), params.model);

        match self.backend {
            Backend::Anthropic => {
                let body = serde_json::json!({
                    "model": params.model,
                    "max_tokens": params.max_tokens,
                    "temperature": params.temperature,
                    "messages": [
                        {
                            "role": "user",
                            "content": request.prompt
                        }
                    ]
                });
                let json = self
                    .post(
                        self.client
                            .post(self.backend.endpoint())
                            .header("x-api-key", &self.api_key)
                            .header("anthropic-version", "2023-06-01")
                            .json(&body),
                    )
                    .await?;
                extract_anthropic_text(&json)
            }
            Backend::Groq | Backend::OpenAi => {
                let body = serde_json::json!({
                    "model": params.model,
                    "temperature": params.temperature,
                    "max_tokens": params.max_tokens,
                    "messages": [
                        {
                            "role": "user",
                            "content": request.prompt
                        }
                    ]
                });
                let json = self
                    .post(
                        self.client
                            .post(self.backend.endpoint())
                            .bearer_auth(&self.api_key)
                            .json(&body),
                    )
                    .await?;
                extract_chat_text(&json)
            }
        }
    }
}

fn extract_anthropic_text(json: &serde_json::Value) -> Result<String> {
    if let Some(content) = json.get("content").and_then(|c| c.as_array()) {
        let text: String = content
            .iter()
            .filter_map(|block| {
                if block.get("type")?.as_str()? == "text" {
                    block.get("text")?.as_str().map(|s| s.to_string())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");
        if !text.is_empty() {
            return Ok(text);
        }
    }
    Err(Error::Backend("unexpected Anthropic API response format".to_string()))
}

fn extract_chat_text(json: &serde_json::Value) -> Result<String> {
    if let Some(text) = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
    {
        return Ok(text.to_string());
    }
    Err(Error::Backend("unexpected chat completion response format".to_string()))
}
