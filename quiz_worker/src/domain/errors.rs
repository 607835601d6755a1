use std::time::Duration;
use thiserror::Error;

// Token verification failures. All of them reject the request with 401.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("untrusted issuer: {0}")]
    UntrustedIssuer(String),
    #[error("key set fetch failed: {0}")]
    KeyFetchFailure(String),
    #[error("unsupported key format: {0}")]
    UnsupportedKeyFormat(String),
    #[error("invalid signature or claims: {0}")]
    SignatureOrClaimInvalid(String),
}

// Raised at the acceptance boundary after the token itself verified.
#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("user {claimed} does not match token subject {subject}")]
    IdentityMismatch { claimed: String, subject: String },
}

// Problems turning the serialized prompt into chat messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("prompt has no message list")]
    MissingMessages,
    #[error("message {index} has no constructor id")]
    MissingTag { index: usize },
    #[error("message {index} has unrecognized type {tag}")]
    UnknownTag { index: usize, tag: String },
    #[error("message {index} has no text content")]
    InvalidContent { index: usize },
}

// Anything that keeps the task from producing questions. Only the message survives,
// as the webhook's `error_details`.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid prompt: {0}")]
    Prompt(#[from] PromptError),
    #[error("quiz generation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model returned status {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("model output did not match the exercise schema: {0}")]
    InvalidOutput(String),
    #[error("quiz generation panicked: {0}")]
    Panicked(String),
}

// Failures of the callback POST itself. Logged, never retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook transport error: {0}")]
    Transport(String),
    #[error("webhook responded with status {0}")]
    Rejected(u16),
}
