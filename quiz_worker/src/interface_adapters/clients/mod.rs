// reqwest clients for the services this worker talks to.

pub mod jwks;
pub mod llm;
pub mod webhook;

pub use jwks::JwksClient;
pub use llm::ChatCompletionsClient;
pub use webhook::WebhookClient;
