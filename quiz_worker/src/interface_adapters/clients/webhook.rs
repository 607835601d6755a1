use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::QuizCallback;
use crate::domain::errors::DeliveryError;
use crate::domain::ports::WebhookNotifier;
use crate::interface_adapters::protocol::WebhookPayload;

// Posts terminal outcomes to the caller's webhook with the caller's own token.
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebhookNotifier for WebhookClient {
    async fn deliver(&self, callback: &QuizCallback) -> Result<u16, DeliveryError> {
        let response = self
            .http
            .post(callback.webhook.clone())
            .bearer_auth(&callback.user_token)
            .json(&WebhookPayload::from(callback))
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Rejected(status.as_u16()));
        }
        Ok(status.as_u16())
    }
}
