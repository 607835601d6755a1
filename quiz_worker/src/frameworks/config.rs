use jsonwebtoken::Algorithm;
use std::collections::HashSet;
use std::str::FromStr;
use std::{env, time::Duration};

// Runtime settings, read from the environment (and `.env` when present).

pub const DEFAULT_JWKS_URL_TEMPLATE: &str = "https://{domain}/auth/v1/.well-known/jwks.json";

pub fn http_port() -> u16 {
    env::var("QUIZ_WORKER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8000)
}

pub fn trusted_issuer_domains() -> HashSet<String> {
    parse_domain_list(&env::var("TRUSTED_ISSUER_DOMAINS").unwrap_or_default())
}

pub fn jwt_audience() -> String {
    env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string())
}

pub fn jwt_algorithms() -> Result<Vec<Algorithm>, String> {
    parse_algorithms(&env::var("JWT_ALGORITHMS").unwrap_or_else(|_| "RS256".to_string()))
}

pub fn jwks_url_template() -> String {
    env::var("JWKS_URL_TEMPLATE").unwrap_or_else(|_| DEFAULT_JWKS_URL_TEMPLATE.to_string())
}

pub fn jwks_fetch_timeout() -> Duration {
    let millis = env::var("JWKS_FETCH_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(5000);
    Duration::from_millis(millis)
}

pub fn jwks_min_refresh_interval() -> Duration {
    secs_from_env("JWKS_MIN_REFRESH_SECS", 60)
}

pub fn llm_base_url() -> String {
    env::var("LLM_BASE_URL").unwrap_or_else(|_| "http://localhost:1234/v1".to_string())
}

pub fn llm_model() -> String {
    env::var("LLM_MODEL").unwrap_or_else(|_| "local-model".to_string())
}

pub fn llm_api_key() -> String {
    env::var("LLM_API_KEY").unwrap_or_else(|_| "lm-studio".to_string())
}

pub fn generation_timeout() -> Duration {
    secs_from_env("GENERATION_TIMEOUT_SECS", 300)
}

pub fn webhook_timeout() -> Duration {
    secs_from_env("WEBHOOK_TIMEOUT_SECS", 30)
}

fn secs_from_env(name: &str, default: u64) -> Duration {
    let secs = env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

// Comma separated; whitespace and empty entries are ignored. Hosts compare
// lowercase, matching how issuer URLs are normalized.
pub fn parse_domain_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}

pub fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, String> {
    let algorithms = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            Algorithm::from_str(name).map_err(|_| format!("unknown JWT algorithm: {name}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if algorithms.is_empty() {
        return Err("JWT_ALGORITHMS must name at least one algorithm".to_string());
    }
    Ok(algorithms)
}

// Everything the worker needs to start, resolved once at boot.
#[derive(Clone, Debug)]
pub struct WorkerSettings {
    pub trusted_domains: HashSet<String>,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    pub jwks_url_template: String,
    pub jwks_fetch_timeout: Duration,
    pub jwks_min_refresh_interval: Duration,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: String,
    pub generation_timeout: Duration,
    pub webhook_timeout: Duration,
}

impl WorkerSettings {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            trusted_domains: trusted_issuer_domains(),
            audience: jwt_audience(),
            algorithms: jwt_algorithms()?,
            jwks_url_template: jwks_url_template(),
            jwks_fetch_timeout: jwks_fetch_timeout(),
            jwks_min_refresh_interval: jwks_min_refresh_interval(),
            llm_base_url: llm_base_url(),
            llm_model: llm_model(),
            llm_api_key: llm_api_key(),
            generation_timeout: generation_timeout(),
            webhook_timeout: webhook_timeout(),
        })
    }
}
