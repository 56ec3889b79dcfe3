//! Anthropic Messages API adapter for chunk classification.
//!
//! Sends one request per chunk and parses the JSON array out of the reply,
//! tolerating surrounding prose or markdown fences. Every failure maps to
//! `DomainError::Model` so the classifier can degrade that chunk to rules.

use crate::domain::{ChunkEntry, DomainError, ModelVerdict};
use crate::ports::ModelPort;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

/// Model-backed classifier over the Anthropic Messages API.
pub struct AnthropicAdapter {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicAdapter {
    /// # Arguments
    /// * `api_key` - Anthropic API key
    /// * `model` - Model name (e.g., "claude-sonnet-4-20250514")
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    /// System prompt defining the five categories and the required fields.
    fn system_prompt() -> &'static str {
        r#"Je bent een assistent die Slack-berichten analyseert en categoriseert.
Je ontvangt berichten uit Slack-kanalen en moet elk bericht categoriseren.

Categorieën:
- ACTION_ITEM: Een taak, verzoek, opdracht, of iets dat iemand moet doen. Bevat vaak woorden als "graag", "kun je", "moet", "todo", "deadline", of directe verzoeken.
- DECISION: Een beslissing die genomen is of genomen moet worden. Bevat vaak woorden als "besloten", "we gaan", "goedgekeurd", "akkoord".
- ANNOUNCEMENT: Een belangrijke mededeling, nieuws, of update voor het team.
- QUESTION: Een open vraag die nog beantwoord moet worden of follow-up nodig heeft.
- FYI: Informatief bericht dat de moeite waard is om te onthouden, maar geen directe actie vereist.

Voor elk bericht, geef:
- category: een van de bovenstaande categorieën
- summary: een beknopte samenvatting in 1 zin (Nederlands)
- priority: "high", "medium", of "low"
- assignee: als er iemand specifiek wordt aangesproken of een taak krijgt (anders null)
- deadline: als er een deadline wordt genoemd (anders null)

Reageer UITSLUITEND met valide JSON. Geen toelichting, geen markdown."#
    }

    fn user_prompt(chunk: &[ChunkEntry]) -> Result<String, DomainError> {
        let body = serde_json::to_string_pretty(chunk)
            .map_err(|e| DomainError::Model(format!("Failed to encode chunk: {}", e)))?;
        Ok(format!(
            "Categoriseer de volgende {} Slack-berichten.\n\n\
             Berichten:\n{}\n\n\
             Reageer met een JSON array van objecten met deze velden: id, category, summary, priority, assignee, deadline.\n\
             Retourneer ALLEEN de JSON array, geen andere tekst.",
            chunk.len(),
            body
        ))
    }

    /// Locate the JSON array in a reply that may be wrapped in prose or a
    /// markdown fence: first `[` through last `]`.
    fn extract_array(raw: &str) -> Option<&str> {
        let start = raw.find('[')?;
        let end = raw.rfind(']')?;
        if start < end { Some(&raw[start..=end]) } else { None }
    }
}

/// Anthropic Messages API request structure.
#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: String,
    content: String,
}

/// Anthropic Messages API response structure.
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[async_trait::async_trait]
impl ModelPort for AnthropicAdapter {
    async fn classify_chunk(&self, chunk: &[ChunkEntry]) -> Result<Vec<ModelVerdict>, DomainError> {
        info!(
            chunk = chunk.len(),
            model = %self.model,
            "sending chunk to model for classification"
        );

        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: Self::system_prompt().to_string(),
            messages: vec![RequestMessage {
                role: "user".to_string(),
                content: Self::user_prompt(chunk)?,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::Model(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "model API returned error");
            return Err(DomainError::Model(format!(
                "API error {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            )));
        }

        let messages_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Model(format!("Failed to parse API response: {}", e)))?;

        let raw_content = messages_response
            .content
            .first()
            .map(|block| block.text.trim().to_string())
            .ok_or_else(|| DomainError::Model("No content blocks returned".to_string()))?;

        debug!(raw_len = raw_content.len(), "received model response");

        let array = Self::extract_array(&raw_content)
            .ok_or_else(|| DomainError::Model("No JSON array in model response".to_string()))?;

        let verdicts: Vec<ModelVerdict> = serde_json::from_str(array).map_err(|e| {
            warn!(
                error = %e,
                json = %array.chars().take(200).collect::<String>(),
                "verdict parse failed"
            );
            DomainError::Model(format!("Failed to parse model JSON: {}", e))
        })?;

        info!(
            chunk = chunk.len(),
            verdicts = verdicts.len(),
            "chunk classified"
        );
        Ok(verdicts)
    }
}
