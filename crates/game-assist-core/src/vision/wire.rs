//! Request and response bodies for chat-completion style vision APIs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn user(parts: Vec<ContentPart>) -> Self {
        Self {
            role: "user",
            content: MessageContent::Parts(parts),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'static str>,
}

// ==================== OpenAI-compatible responses ====================

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

// ==================== Zhipu responses ====================

/// Zhipu replies may carry content as a string or as a list of typed parts.
#[derive(Debug, Deserialize)]
pub struct ZhipuCompletion {
    #[serde(default)]
    pub choices: Vec<ZhipuChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ZhipuChoice {
    pub message: ZhipuMessage,
}

#[derive(Debug, Deserialize)]
pub struct ZhipuMessage {
    #[serde(default)]
    pub content: Option<ZhipuContent>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ZhipuContent {
    Text(String),
    Parts(Vec<ZhipuPart>),
}

#[derive(Debug, Deserialize)]
pub struct ZhipuPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ZhipuContent {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts
                .into_iter()
                .filter(|p| p.kind.as_deref().map_or(true, |k| k == "text"))
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_parts_tagging() {
        let msg = ChatMessage::user(vec![
            ContentPart::Text {
                text: "hello".into(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AAAA".into(),
                    detail: None,
                },
            },
        ]);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "hello"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
    }

    #[test]
    fn test_zhipu_part_content() {
        let body = r#"{"choices":[{"message":{"content":[{"type":"text","text":"Push "},{"type":"text","text":"mid"}]}}]}"#;
        let parsed: ZhipuCompletion = serde_json::from_str(body).unwrap();
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(ZhipuContent::into_text);
        assert_eq!(text.as_deref(), Some("Push mid"));
    }
}
