use crate::use_cases::{QuizDispatcher, TokenVerifier};

// Shared application state for the HTTP handlers.
pub struct AppState {
    pub verifier: TokenVerifier,
    pub dispatcher: QuizDispatcher,
}
