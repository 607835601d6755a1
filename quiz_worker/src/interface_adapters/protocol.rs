use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::domain::entities::{
    GenerationRequest, QuizCallback, QuizId, QuizQuestion, TerminalOutcome,
};

// Request payload for quiz generation.
#[derive(Debug, Deserialize)]
pub struct GenerateQuizRequest {
    pub prompt: Value,
    #[serde(alias = "quizId")]
    pub quiz_id: QuizId,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(alias = "webhookUrl")]
    pub webhook: Url,
    #[serde(alias = "userToken")]
    pub user_token: String,
}

impl From<GenerateQuizRequest> for GenerationRequest {
    fn from(body: GenerateQuizRequest) -> Self {
        GenerationRequest {
            quiz_id: body.quiz_id,
            user_id: body.user_id,
            prompt: body.prompt,
            webhook: body.webhook,
            user_token: body.user_token,
        }
    }
}

// Immediate acknowledgment; results arrive later through the webhook.
#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub quiz_id: QuizId,
}

impl GenerateQuizResponse {
    pub fn processing(quiz_id: QuizId) -> Self {
        Self {
            status: "processing",
            message: "Quiz generation started in background.",
            quiz_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// Error envelope for rejected requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

// Body POSTed to the caller's webhook. `questions` is null on failure and
// `error_details` is only present on failure.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub user_id: &'a str,
    pub quiz_id: &'a QuizId,
    pub questions: Option<&'a [QuizQuestion]>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<&'a str>,
}

impl<'a> From<&'a QuizCallback> for WebhookPayload<'a> {
    fn from(callback: &'a QuizCallback) -> Self {
        let (questions, status, error_details) = match &callback.outcome {
            TerminalOutcome::Completed { questions } => {
                (Some(questions.as_slice()), "completed", None)
            }
            TerminalOutcome::Failed { error_detail } => {
                (None, "error", Some(error_detail.as_str()))
            }
        };

        Self {
            user_id: &callback.user_id,
            quiz_id: &callback.quiz_id,
            questions,
            status,
            error_details,
        }
    }
}
