use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use url::Url;

use crate::domain::entities::{ChatMessage, GenerationRequest, QuizCallback, QuizId, QuizQuestion};
use crate::domain::errors::{DeliveryError, GenerationError};
use crate::domain::ports::{KeySetSource, QuizGenerator, WebhookNotifier};

pub(crate) const SIGNING_KEY_PEM: &str = include_str!("../../tests/fixtures/signing_key.pem");
pub(crate) const FOREIGN_KEY_PEM: &str = include_str!("../../tests/fixtures/foreign_key.pem");
pub(crate) const JWKS_JSON: &str = include_str!("../../tests/fixtures/jwks.json");

pub(crate) const TEST_KID: &str = "test-key";
pub(crate) const TEST_DOMAIN: &str = "a.example.com";
pub(crate) const TEST_ISSUER: &str = "https://a.example.com/auth/v1";
pub(crate) const TEST_AUDIENCE: &str = "authenticated";
pub(crate) const TEST_USER: &str = "6f1c2a4e-user";

pub(crate) fn test_key_set() -> JwkSet {
    serde_json::from_str(JWKS_JSON).expect("fixture jwks should parse")
}

pub(crate) fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// Claims of a token that should pass every check.
pub(crate) fn valid_claims() -> Value {
    json!({
        "iss": TEST_ISSUER,
        "sub": TEST_USER,
        "aud": TEST_AUDIENCE,
        "exp": now_epoch_seconds() + 3600,
        "role": "authenticated",
    })
}

pub(crate) fn sign_with(claims: &Value, kid: Option<&str>, pem: &str) -> String {
    sign_with_algorithm(claims, kid, pem, Algorithm::RS256)
}

pub(crate) fn sign_with_algorithm(
    claims: &Value,
    kid: Option<&str>,
    pem: &str,
    algorithm: Algorithm,
) -> String {
    let mut header = Header::new(algorithm);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key should load");
    jsonwebtoken::encode(&header, claims, &key).expect("token should sign")
}

pub(crate) fn sign(claims: &Value) -> String {
    sign_with(claims, Some(TEST_KID), SIGNING_KEY_PEM)
}

pub(crate) fn sample_prompt() -> Value {
    json!({
        "lc": 1,
        "type": "constructor",
        "id": ["langchain", "prompts", "chat", "ChatPromptValue"],
        "kwargs": {
            "messages": [
                {
                    "lc": 1,
                    "type": "constructor",
                    "id": ["langchain", "schema", "messages", "SystemMessage"],
                    "kwargs": { "content": "You write Dutch cloze exercises." }
                },
                {
                    "lc": 1,
                    "type": "constructor",
                    "id": ["langchain", "schema", "messages", "HumanMessage"],
                    "kwargs": { "content": "Use the words: bezig, ondanks." }
                }
            ]
        }
    })
}

pub(crate) fn sample_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            question: "Ik ben al de hele dag ___ met verhuizen.".to_string(),
            answer: "bezig".to_string(),
            english: "I have been busy moving all day.".to_string(),
        },
        QuizQuestion {
            question: "___ de regen gingen we wandelen.".to_string(),
            answer: "Ondanks".to_string(),
            english: "Despite the rain we went for a walk.".to_string(),
        },
    ]
}

pub(crate) fn sample_request() -> GenerationRequest {
    GenerationRequest {
        quiz_id: QuizId::Number(17),
        user_id: TEST_USER.to_string(),
        prompt: sample_prompt(),
        webhook: Url::parse("https://hooks.example.com/quiz").expect("valid url"),
        user_token: "forwarded-user-token".to_string(),
    }
}

// Key-set source that counts fetches per domain.
#[derive(Clone)]
pub(crate) struct RecordingKeySource {
    keys: Result<JwkSet, String>,
    fetched: Arc<Mutex<Vec<String>>>,
}

impl RecordingKeySource {
    pub(crate) fn new(keys: JwkSet) -> Self {
        Self {
            keys: Ok(keys),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            keys: Err(message.to_string()),
            fetched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetched.lock().expect("fetch log mutex poisoned").len()
    }

    pub(crate) fn fetched_domains(&self) -> Vec<String> {
        self.fetched.lock().expect("fetch log mutex poisoned").clone()
    }
}

#[async_trait]
impl KeySetSource for RecordingKeySource {
    async fn fetch_key_set(&self, domain: &str) -> Result<JwkSet, String> {
        self.fetched
            .lock()
            .expect("fetch log mutex poisoned")
            .push(domain.to_string());
        self.keys.clone()
    }
}

// What the fake model does when invoked.
#[derive(Clone)]
pub(crate) enum Script {
    Questions(Vec<QuizQuestion>),
    Fail(String),
    Stall(Duration),
    Panic,
}

#[derive(Clone)]
pub(crate) struct ScriptedGenerator {
    script: Script,
    calls: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl QuizGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(messages.to_vec());

        match &self.script {
            Script::Questions(questions) => Ok(questions.clone()),
            Script::Fail(message) => Err(GenerationError::Transport(message.clone())),
            Script::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(Vec::new())
            }
            Script::Panic => panic!("model adapter exploded"),
        }
    }
}

// Notifier that keeps every callback it was asked to deliver.
#[derive(Clone, Default)]
pub(crate) struct RecordingNotifier {
    delivered: Arc<Mutex<Vec<QuizCallback>>>,
    reject_with: Option<u16>,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::default()
        }
    }

    pub(crate) fn delivered(&self) -> Vec<QuizCallback> {
        self.delivered
            .lock()
            .expect("delivery log mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl WebhookNotifier for RecordingNotifier {
    async fn deliver(&self, callback: &QuizCallback) -> Result<u16, DeliveryError> {
        self.delivered
            .lock()
            .expect("delivery log mutex poisoned")
            .push(callback.clone());

        match self.reject_with {
            Some(status) => Err(DeliveryError::Rejected(status)),
            None => Ok(200),
        }
    }
}
