// Use cases layer: token verification, acceptance and the background generation task.

pub mod dispatch;
pub mod generate_quiz;
pub mod key_set_cache;
pub mod verify_token;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatch::QuizDispatcher;
pub use generate_quiz::{GenerationTask, TaskPhase, TaskReport};
pub use key_set_cache::KeySetCache;
pub use verify_token::TokenVerifier;
