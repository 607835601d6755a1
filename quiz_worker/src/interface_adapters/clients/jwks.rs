use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use std::time::Duration;

use crate::domain::ports::KeySetSource;

// Thin reqwest client for an identity provider's published key set.
#[derive(Clone)]
pub struct JwksClient {
    http: reqwest::Client,
    // Location of a domain's key set, with `{domain}` as placeholder.
    url_template: String,
}

impl JwksClient {
    pub fn new(url_template: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url_template: url_template.into(),
        })
    }

    pub fn key_set_url(&self, domain: &str) -> String {
        self.url_template.replace("{domain}", domain)
    }
}

#[async_trait]
impl KeySetSource for JwksClient {
    async fn fetch_key_set(&self, domain: &str) -> Result<JwkSet, String> {
        let url = self.key_set_url(domain);
        tracing::debug!(%url, "fetching key set");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| format!("GET {url}: {err}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("GET {url} returned {status}"));
        }

        response
            .json::<JwkSet>()
            .await
            .map_err(|err| format!("GET {url} returned an unreadable key set: {err}"))
    }
}
