use tokio::task::JoinHandle;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::domain::entities::{GenerationRequest, VerifiedIdentity};
use crate::domain::errors::AcceptError;
use crate::use_cases::generate_quiz::{GenerationTask, TaskReport};

// Acceptance boundary: checks the identity claim and launches the background task.
#[derive(Clone)]
pub struct QuizDispatcher {
    pub task: GenerationTask,
}

impl QuizDispatcher {
    // The returned handle is never awaited by the request path.
    pub fn accept(
        &self,
        identity: &VerifiedIdentity,
        request: GenerationRequest,
    ) -> Result<JoinHandle<TaskReport>, AcceptError> {
        if request.user_id != identity.sub {
            warn!(
                subject = %identity.sub,
                claimed = %request.user_id,
                "token subject tried to generate a quiz for another user"
            );
            return Err(AcceptError::IdentityMismatch {
                claimed: request.user_id,
                subject: identity.sub.clone(),
            });
        }

        let task_id = Uuid::new_v4();
        info!(%task_id, quiz_id = %request.quiz_id, user_id = %request.user_id, "request accepted");

        let span = info_span!("generation", %task_id, quiz_id = %request.quiz_id);
        let task = self.task.clone();
        Ok(tokio::spawn(
            async move { task.run(request).await }.instrument(span),
        ))
    }
}
