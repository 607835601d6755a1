use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;

use crate::domain::entities::{ChatMessage, QuizCallback, QuizQuestion};
use crate::domain::errors::{DeliveryError, GenerationError};

// Port for loading an identity provider's published signing keys.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch_key_set(&self, domain: &str) -> Result<JwkSet, String>;
}

// Port for the text-generation model, constrained to the exercise schema.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage])
    -> Result<Vec<QuizQuestion>, GenerationError>;
}

// Port for reporting a terminal outcome to the caller's webhook.
// Returns the HTTP status of an accepted delivery.
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    async fn deliver(&self, callback: &QuizCallback) -> Result<u16, DeliveryError>;
}
