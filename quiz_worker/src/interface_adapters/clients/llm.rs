use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::entities::{ChatMessage, QuizQuestion};
use crate::domain::errors::GenerationError;
use crate::domain::ports::QuizGenerator;

// Upstream error bodies are cut to this many characters before they reach the webhook.
const MAX_ERROR_BODY_CHARS: usize = 500;

// Client for an OpenAI-compatible chat completions endpoint with structured output.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    pub base_url: String,
    pub model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: Value,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

// Shape the model is constrained to produce.
#[derive(Deserialize)]
struct QuizResponse {
    exercises: Vec<QuizQuestion>,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl QuizGenerator for ChatCompletionsClient {
    async fn generate(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            response_format: exercise_response_format(),
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let completion = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|err| GenerationError::InvalidOutput(err.to_string()))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::InvalidOutput("completion has no content".to_string()))?;

        parse_exercises(&content)
    }
}

fn parse_exercises(content: &str) -> Result<Vec<QuizQuestion>, GenerationError> {
    let parsed: QuizResponse = serde_json::from_str(strip_code_fence(content))
        .map_err(|err| GenerationError::InvalidOutput(err.to_string()))?;
    Ok(parsed.exercises)
}

// Some local models wrap JSON in a markdown fence even in structured mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn exercise_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "quiz_response",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "exercises": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "question": { "type": "string" },
                                "answer": { "type": "string" },
                                "english": { "type": "string" }
                            },
                            "required": ["question", "answer", "english"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["exercises"],
                "additionalProperties": false
            }
        }
    })
}
