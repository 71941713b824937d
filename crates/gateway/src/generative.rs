//! Generative-language API client.
//!
//! Features:
//! - `x-goog-api-key` header authentication
//! - Streaming via SSE (`:streamGenerateContent?alt=sse`) with incremental
//!   text parts forwarded in arrival order
//! - `systemInstruction` as a top-level field, suppressed in retrieval mode
//! - Extended reasoning via `thinkingConfig.thinkingBudget`
//! - Structured classification via `responseMimeType: application/json` +
//!   a response schema, resolving any failure to the fallback metadata

use async_trait::async_trait;
use futures::StreamExt;
use philovoid_config::AppConfig;
use philovoid_core::error::GatewayError;
use philovoid_core::gateway::{FragmentStream, ModelGateway, SendOptions};
use philovoid_core::knowledge::DocumentMetadata;
use philovoid_core::message::{Message, Sender};
use philovoid_core::persona;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const API_VERSION: &str = "v1beta";

/// Client for the hosted generative-language API.
pub struct GenerativeClient {
    name: String,
    base_url: String,
    api_key: Option<String>,
    fast_model: String,
    deep_model: String,
    thinking_budget: u32,
    client: reqwest::Client,
}

impl GenerativeClient {
    /// Create a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300)) // deep synthesis can run long
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "generative-language".into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            fast_model: config.fast_model.clone(),
            deep_model: config.deep_model.clone(),
            thinking_budget: config.thinking_budget,
            client,
        }
    }

    /// Credential gate: every call checks this before touching the network.
    fn require_key(&self) -> Result<&str, GatewayError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GatewayError::MissingCredential)
    }

    fn model_for(&self, options: SendOptions) -> &str {
        if options.extended_reasoning {
            &self.deep_model
        } else {
            &self.fast_model
        }
    }

    fn endpoint(&self, model: &str, method: &str, sse: bool) -> String {
        let suffix = if sse { "?alt=sse" } else { "" };
        format!(
            "{}/{}/models/{}:{}{}",
            self.base_url, API_VERSION, model, method, suffix
        )
    }

    /// Convert log history to API turns. System messages and pending
    /// placeholders never reach the wire.
    fn to_api_contents(history: &[Message]) -> Vec<ApiContent> {
        history
            .iter()
            .filter(|m| m.sender != Sender::System && !m.is_pending())
            .map(|m| ApiContent {
                role: match m.sender {
                    Sender::User => "user".into(),
                    _ => "model".into(),
                },
                parts: vec![ApiPart {
                    text: m.content.clone(),
                }],
            })
            .collect()
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: &GenerateResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    fn map_status(status: u16, body: String) -> GatewayError {
        match status {
            401 | 403 => GatewayError::AuthenticationFailed("Invalid API key".into()),
            429 => GatewayError::RateLimited {
                retry_after_secs: 5,
            },
            _ => GatewayError::Api {
                status_code: status,
                message: body,
            },
        }
    }

    /// Parse a classification response body into metadata.
    /// Returns `None` on any shape mismatch; the caller falls back.
    fn parse_classification(body: &str) -> Option<DocumentMetadata> {
        let response: GenerateResponse = serde_json::from_str(body).ok()?;
        let text = Self::extract_text(&response);
        serde_json::from_str::<DocumentMetadata>(text.trim()).ok()
    }

    /// JSON Schema for the classification response.
    fn classification_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "OBJECT",
            "properties": {
                "folder": { "type": "STRING" },
                "tags": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" }
                }
            },
            "required": ["folder", "tags"]
        })
    }
}

#[async_trait]
impl ModelGateway for GenerativeClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        options: SendOptions,
    ) -> Result<FragmentStream, GatewayError> {
        let key = self.require_key()?.to_string();
        let model = self.model_for(options);
        let url = self.endpoint(model, "streamGenerateContent", true);

        let mut contents = Self::to_api_contents(history);
        contents.push(ApiContent {
            role: "user".into(),
            parts: vec![ApiPart {
                text: prompt.to_string(),
            }],
        });

        // In retrieval mode the assembled prompt is self-contained; the
        // general persona instruction would contradict it.
        let system_instruction = if options.retrieval_mode {
            None
        } else {
            Some(ApiContent {
                role: "user".into(),
                parts: vec![ApiPart {
                    text: persona::persona_prompt(),
                }],
            })
        };

        let generation_config = options.extended_reasoning.then(|| GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: self.thinking_budget,
            }),
            ..GenerationConfig::default()
        });

        let request = GenerateRequest {
            contents,
            system_instruction,
            generation_config,
        };

        debug!(model, turns = request.contents.len(), "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &key)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Streaming request rejected");
            return Err(Self::map_status(status, body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);

        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(GatewayError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }

                    let event: GenerateResponse = match serde_json::from_str(data) {
                        Ok(v) => v,
                        Err(e) => {
                            trace!(error = %e, data = %data, "Ignoring unparseable SSE event");
                            continue;
                        }
                    };

                    let text = Self::extract_text(&event);
                    if text.is_empty() {
                        continue;
                    }
                    if tx.send(Ok(text)).await.is_err() {
                        return; // consumer went away
                    }
                }
            }
            // Stream ended: channel closes when tx drops, signalling completion.
        });

        Ok(rx)
    }

    async fn classify(&self, document_text: &str) -> Result<DocumentMetadata, GatewayError> {
        let key = self.require_key()?.to_string();
        let url = self.endpoint(&self.deep_model, "generateContent", false);

        let truncated: String = document_text
            .chars()
            .take(persona::CLASSIFY_INPUT_LIMIT)
            .collect();
        let prompt = persona::classification_prompt(&truncated);

        let request = GenerateRequest {
            contents: vec![ApiContent {
                role: "user".into(),
                parts: vec![ApiPart { text: prompt }],
            }],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".into()),
                response_schema: Some(Self::classification_schema()),
                ..GenerationConfig::default()
            }),
        };

        let response = match self
            .client
            .post(&url)
            .header("x-goog-api-key", &key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Classification transport failure, using fallback");
                return Ok(DocumentMetadata::fallback());
            }
        };

        if response.status().as_u16() != 200 {
            warn!(status = response.status().as_u16(), "Classification rejected, using fallback");
            return Ok(DocumentMetadata::fallback());
        }

        let body = response.text().await.unwrap_or_default();
        match Self::parse_classification(&body) {
            Some(metadata) => Ok(metadata),
            None => {
                warn!("Malformed classification response, using fallback");
                Ok(DocumentMetadata::fallback())
            }
        }
    }
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<ApiContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    role: String,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ApiPart>,
}
