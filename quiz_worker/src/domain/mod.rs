// Domain layer: request/outcome types, error taxonomy and ports.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod prompt;

pub use entities::{
    Audience, ChatMessage, GenerationRequest, QuizCallback, QuizId, QuizQuestion, Role,
    TerminalOutcome, VerifiedIdentity,
};
pub use errors::{AcceptError, DeliveryError, GenerationError, PromptError, VerifyError};
pub use ports::{KeySetSource, QuizGenerator, WebhookNotifier};
