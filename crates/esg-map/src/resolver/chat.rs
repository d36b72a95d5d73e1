//! OpenAI-compatible chat-completions client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use super::{
    FieldResolver, ResolveRequest, ResolvedField, ResolverConfig, SYSTEM_PROMPT, build_prompt,
    parse_completion,
};
use crate::error::ResolveError;

const USER_AGENT_VALUE: &str = concat!("esg-field-mapper/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in a [`ResolveError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// [`FieldResolver`] backed by a chat-completions endpoint.
///
/// One request per call, no retries. The timeout from [`ResolverConfig`]
/// applies to the whole request.
#[derive(Debug, Clone)]
pub struct ChatCompletionResolver {
    client: reqwest::Client,
    config: ResolverConfig,
}

impl ChatCompletionResolver {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ResolveError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    async fn complete(&self, prompt: &str) -> Result<String, ResolveError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.1,
        };
        let url = self.config.completions_url();
        tracing::debug!(%url, model = %self.config.model, "requesting completion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(ResolveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        extract_content(&text)
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions reply.
fn extract_content(body: &str) -> Result<String, ResolveError> {
    let reply: ChatResponse = serde_json::from_str(body)?;
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ResolveError::EmptyCompletion)
}

#[async_trait]
impl FieldResolver for ChatCompletionResolver {
    async fn resolve_unmapped(
        &self,
        request: &ResolveRequest<'_>,
    ) -> Result<Vec<ResolvedField>, ResolveError> {
        let prompt = build_prompt(request);
        let content = self.complete(&prompt).await?;
        parse_completion(&content, request)
    }
}
