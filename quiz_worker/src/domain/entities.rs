use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use url::Url;

// Caller-supplied correlation id. Echoed back with the same JSON type it arrived with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizId {
    Number(i64),
    Text(String),
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizId::Number(id) => write!(f, "{id}"),
            QuizId::Text(id) => f.write_str(id),
        }
    }
}

// A validated request for one quiz, owned by the generation task once accepted.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub quiz_id: QuizId,
    pub user_id: String,
    // Serialized chat prompt; decoded inside the task (see domain::prompt).
    pub prompt: Value,
    pub webhook: Url,
    // Forwarded as-is in the callback's Authorization header.
    pub user_token: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

// One fill-in-the-blank exercise. `english` is the English gloss of the sentence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub answer: String,
    pub english: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == value,
            Audience::Many(auds) => auds.iter().any(|aud| aud == value),
        }
    }
}

// Claim set of a token whose signature and standard claims were verified.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub iss: String,
    pub sub: String,
    pub aud: Audience,
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

// The single result reported for an accepted request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminalOutcome {
    Completed { questions: Vec<QuizQuestion> },
    Failed { error_detail: String },
}

impl TerminalOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TerminalOutcome::Completed { .. })
    }
}

// Everything the webhook notifier needs to report one outcome.
#[derive(Clone, Debug)]
pub struct QuizCallback {
    pub quiz_id: QuizId,
    pub user_id: String,
    pub webhook: Url,
    pub user_token: String,
    pub outcome: TerminalOutcome,
}
