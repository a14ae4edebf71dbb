//! Vision API client
//!
//! One request shape per provider:
//! - OpenAI: system + user message with text and image parts, static bearer
//! - Zhipu AI: same shape with high image detail and `stream: false`, signed token
//! - Doubao: OpenAI-compatible, bearer per configured auth mode

mod client;
mod provider;
mod token;
pub mod wire;

pub use client::{VisionAnalyzer, VisionClient};
pub use provider::{
    AuthMode, ProviderConfig, ProviderKind, DOUBAO_ENDPOINT, OPENAI_ENDPOINT, ZHIPU_ENDPOINT,
};
pub use token::{generate_signed_token, split_credential, TOKEN_TTL_SECS};
