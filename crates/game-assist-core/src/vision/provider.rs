//! Provider profiles and their request/response envelopes.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use super::token::generate_signed_token;
use super::wire::{
    ChatCompletion, ChatMessage, ChatRequest, ContentPart, ImageUrl, ZhipuCompletion,
    ZhipuContent,
};
use crate::codec::EncodedImage;
use crate::error::{Error, Result};

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const ZHIPU_ENDPOINT: &str = "https://open.bigmodel.cn/api/paas/v4/chat/completions";
pub const DOUBAO_ENDPOINT: &str = "https://ark.cn-beijing.volces.com/api/v3/chat/completions";

/// Supported vision API providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    ZhipuAi,
    Doubao,
}

/// How the bearer token is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMode {
    /// The API key is sent as-is.
    #[default]
    StaticBearer,
    /// The `id.secret` key signs a short-lived token per request.
    SignedToken,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::ZhipuAi => "Zhipu AI",
            Self::Doubao => "Doubao",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_ENDPOINT,
            Self::ZhipuAi => ZHIPU_ENDPOINT,
            Self::Doubao => DOUBAO_ENDPOINT,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-4o",
            Self::ZhipuAi => "glm-4.6v",
            Self::Doubao => "doubao-seed-2-0-code-preview-260215",
        }
    }

    pub fn default_auth_mode(&self) -> AuthMode {
        match self {
            Self::ZhipuAi => AuthMode::SignedToken,
            Self::OpenAi | Self::Doubao => AuthMode::StaticBearer,
        }
    }

    fn image_detail(&self) -> Option<&'static str> {
        match self {
            Self::ZhipuAi => Some("high"),
            _ => None,
        }
    }

    fn stream_flag(&self) -> Option<bool> {
        match self {
            Self::ZhipuAi => Some(false),
            _ => None,
        }
    }

    fn sends_accept_header(&self) -> bool {
        !matches!(self, Self::OpenAi)
    }

    /// Build the JSON body for one analysis.
    pub fn build_request(
        &self,
        config: &ProviderConfig,
        image: &EncodedImage,
        prompt: &str,
    ) -> ChatRequest {
        let user = ChatMessage::user(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_uri(),
                    detail: self.image_detail(),
                },
            },
        ]);

        let mut messages = Vec::with_capacity(2);
        if !config.system_instruction.trim().is_empty() {
            messages.push(ChatMessage::system(config.system_instruction.clone()));
        }
        messages.push(user);

        ChatRequest {
            model: config.model.clone(),
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stream: self.stream_flag(),
        }
    }

    /// Extract the first choice's text from a 2xx body.
    ///
    /// Returns `Ok(None)` for no choices or blank content.
    pub fn parse_response(&self, body: &str) -> Result<Option<String>> {
        let text = match self {
            Self::ZhipuAi => {
                let parsed: ZhipuCompletion =
                    serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .map(ZhipuContent::into_text)
            }
            Self::OpenAi | Self::Doubao => {
                let parsed: ChatCompletion =
                    serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
            }
        };

        Ok(text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()))
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Snapshot of the active provider used for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub auth_mode: AuthMode,
    pub system_instruction: String,
}

impl ProviderConfig {
    /// Whether a credential is present.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Bearer token for a request issued at `now` (Unix seconds).
    pub fn bearer_token(&self, now: i64) -> Result<String> {
        if !self.is_configured() {
            return Err(Error::Configuration(format!(
                "{} API key is not configured",
                self.kind
            )));
        }
        match self.auth_mode {
            AuthMode::StaticBearer => Ok(self.api_key.trim().to_string()),
            AuthMode::SignedToken => generate_signed_token(self.api_key.trim(), now),
        }
    }

    /// Fresh header set for one request.
    pub fn headers(&self, now: i64) -> Result<HeaderMap> {
        let token = self.bearer_token(now)?;
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| Error::Configuration("API key contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        if self.kind.sends_accept_header() {
            headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        }
        Ok(headers)
    }
}
