use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::entities::{GenerationRequest, QuizCallback, QuizQuestion, TerminalOutcome};
use crate::domain::errors::{DeliveryError, GenerationError};
use crate::domain::ports::{QuizGenerator, WebhookNotifier};
use crate::domain::prompt::decode_prompt;

// Lifecycle of one background generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskPhase {
    Pending,
    Generating,
    DeliveringSuccess,
    DeliveringFailure,
    Terminal,
}

// What happened to one task, returned to whoever awaits its handle.
#[derive(Debug)]
pub struct TaskReport {
    pub outcome: TerminalOutcome,
    pub delivery: Result<u16, DeliveryError>,
    pub phases: Vec<TaskPhase>,
}

// Runs the model call and reports exactly one outcome to the caller's webhook.
#[derive(Clone)]
pub struct GenerationTask {
    pub generator: Arc<dyn QuizGenerator>,
    pub notifier: Arc<dyn WebhookNotifier>,
    pub generation_timeout: Duration,
}

impl GenerationTask {
    pub async fn run(&self, request: GenerationRequest) -> TaskReport {
        let mut phases = vec![TaskPhase::Pending];
        info!(quiz_id = %request.quiz_id, user_id = %request.user_id, "task started");

        phases.push(TaskPhase::Generating);
        let outcome = match self.generate(&request).await {
            Ok(questions) => {
                info!(
                    quiz_id = %request.quiz_id,
                    questions = questions.len(),
                    "generation succeeded, sending webhook"
                );
                phases.push(TaskPhase::DeliveringSuccess);
                TerminalOutcome::Completed { questions }
            }
            Err(err) => {
                error!(quiz_id = %request.quiz_id, error = %err, "generation failed");
                phases.push(TaskPhase::DeliveringFailure);
                TerminalOutcome::Failed {
                    error_detail: err.to_string(),
                }
            }
        };

        let callback = QuizCallback {
            quiz_id: request.quiz_id,
            user_id: request.user_id,
            webhook: request.webhook,
            user_token: request.user_token,
            outcome,
        };

        let delivery = self.notifier.deliver(&callback).await;
        match &delivery {
            Ok(status) => info!(
                quiz_id = %callback.quiz_id,
                status,
                completed = callback.outcome.is_completed(),
                "webhook delivered"
            ),
            Err(err) => error!(
                quiz_id = %callback.quiz_id,
                webhook_host = callback.webhook.host_str().unwrap_or_default(),
                error = %err,
                "webhook delivery failed, not retried"
            ),
        }
        phases.push(TaskPhase::Terminal);

        TaskReport {
            outcome: callback.outcome,
            delivery,
            phases,
        }
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<QuizQuestion>, GenerationError> {
        let messages = decode_prompt(&request.prompt)?;

        // Panics inside the model adapter become failures so the webhook still fires.
        let call = AssertUnwindSafe(self.generator.generate(&messages)).catch_unwind();
        match tokio::time::timeout(self.generation_timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(GenerationError::Panicked(panic_message(panic.as_ref()))),
            Err(_) => Err(GenerationError::TimedOut(self.generation_timeout)),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
