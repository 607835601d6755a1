// Shared helpers for driving a real worker over HTTP in integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use quiz_worker::WorkerSettings;
use serde_json::{Value, json};
use wiremock::{MockServer, Request};

pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
pub const FOREIGN_KEY_PEM: &str = include_str!("../fixtures/foreign_key.pem");
pub const JWKS_JSON: &str = include_str!("../fixtures/jwks.json");

pub const TRUSTED_DOMAIN: &str = "a.example.com";
pub const TEST_USER: &str = "0b7d9c52-learner";

// Settings pointing every outbound dependency at the given mock servers.
pub fn settings_for(jwks: &MockServer, llm: &MockServer) -> WorkerSettings {
    WorkerSettings {
        trusted_domains: HashSet::from([TRUSTED_DOMAIN.to_string()]),
        audience: "authenticated".to_string(),
        algorithms: vec![Algorithm::RS256],
        jwks_url_template: format!("{}/{{domain}}/auth/v1/.well-known/jwks.json", jwks.uri()),
        jwks_fetch_timeout: Duration::from_secs(2),
        jwks_min_refresh_interval: Duration::from_secs(60),
        llm_base_url: format!("{}/v1", llm.uri()),
        llm_model: "local-model".to_string(),
        llm_api_key: "lm-studio".to_string(),
        generation_timeout: Duration::from_secs(5),
        webhook_timeout: Duration::from_secs(2),
    }
}

// Start a worker on an ephemeral port and return its base URL.
pub async fn spawn_worker(settings: WorkerSettings) -> String {
    // The socket is bound before returning, so connections queue until serving starts.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");

    tokio::spawn(async move {
        quiz_worker::run(listener, settings)
            .await
            .expect("server failed");
    });

    format!("http://{addr}")
}

pub fn token_for(issuer_domain: &str, sub: &str, pem: &str) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        + 3600;
    let claims = json!({
        "iss": format!("https://{issuer_domain}/auth/v1"),
        "sub": sub,
        "aud": "authenticated",
        "exp": exp,
        "role": "authenticated",
    });

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some("test-key".to_string());
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("fixture key should load");
    jsonwebtoken::encode(&header, &claims, &key).expect("token should sign")
}

pub fn request_body(user_id: &str, webhook: &str) -> Value {
    json!({
        "prompt": {
            "lc": 1,
            "type": "constructor",
            "id": ["langchain", "prompts", "chat", "ChatPromptValue"],
            "kwargs": {
                "messages": [
                    {
                        "lc": 1,
                        "type": "constructor",
                        "id": ["langchain", "schema", "messages", "SystemMessage"],
                        "kwargs": { "content": "You write Dutch cloze exercises." }
                    },
                    {
                        "lc": 1,
                        "type": "constructor",
                        "id": ["langchain", "schema", "messages", "HumanMessage"],
                        "kwargs": { "content": "Use the word: gezellig." }
                    }
                ]
            }
        },
        "quiz_id": 42,
        "user_id": user_id,
        "webhook": webhook,
        "user_token": "forwarded-user-token",
    })
}

pub fn completion_with(content: &str) -> Value {
    json!({
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

// Poll a mock until it has seen `count` requests or the deadline passes.
pub async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<Request> {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    server.received_requests().await.unwrap_or_default()
}
