use std::sync::Arc;

use newsroom_protocol::{ChatTurn, Role};
use tracing::{debug, error};

use crate::config::{RelayConfig, API_KEY_VAR};
use crate::errors::AppError;
use crate::models::{Content, GenerateContentRequest, GenerationConfig};

/// Persona sent as the first turn of every upstream request.
pub const SYSTEM_INSTRUCTION: &str = "Ти си полезен AI асистент на новинарски сайт. \
                                      Отговаряй на въпроси за новини, събития и информация от сайта. \
                                      Бъди любезен и професионален.";

const UPSTREAM_USER: &str = "user";
const UPSTREAM_MODEL: &str = "model";

/// Chat roles and their Gemini names. Gemini calls the assistant `model`.
const ROLE_TABLE: [(Role, &str); 2] = [(Role::User, UPSTREAM_USER), (Role::Assistant, UPSTREAM_MODEL)];

pub fn to_upstream(role: Role) -> &'static str {
    ROLE_TABLE
        .iter()
        .find_map(|&(r, upstream)| (r == role).then_some(upstream))
        .unwrap_or(UPSTREAM_USER)
}

#[allow(dead_code)]
pub fn from_upstream(role: &str) -> Option<Role> {
    ROLE_TABLE
        .iter()
        .find_map(|&(r, upstream)| (upstream == role).then_some(r))
}

/// Builds the upstream `contents`: the system turn followed by the history.
fn to_gemini_contents(turns: &[ChatTurn]) -> Vec<Content> {
    std::iter::once(Content::text(UPSTREAM_USER, SYSTEM_INSTRUCTION))
        .chain(
            turns
                .iter()
                .map(|t| Content::text(to_upstream(t.role), t.content.as_str())),
        )
        .collect()
}

/// Client for Gemini's streaming generate-content endpoint.
///
/// Holds one `reqwest::Client` built at startup; clones share its pool.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: Arc<RelayConfig>,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: Arc<RelayConfig>) -> Self {
        Self { http, config }
    }

    pub fn build_request(&self, turns: &[ChatTurn]) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: to_gemini_contents(turns),
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.config.base_url, self.config.model
        )
    }

    /// Opens the upstream SSE stream for a chat history.
    ///
    /// Resolves once response headers arrive; the body has not been read yet.
    pub async fn stream_generate(&self, turns: &[ChatTurn]) -> Result<reqwest::Response, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(AppError::MissingApiKey { var: API_KEY_VAR })?;

        let body = self.build_request(turns);
        debug!("calling {} with {} contents", self.config.model, body.contents.len());

        let response = self
            .http
            .post(self.stream_url())
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini request failed: {e}");
                AppError::UpstreamUnreachable(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {body}", status.as_u16());
            return Err(AppError::UpstreamStatus { status: status.as_u16() });
        }
        Ok(response)
    }
}
