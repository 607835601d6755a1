use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::jwk::{Jwk, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::domain::entities::VerifiedIdentity;
use crate::domain::errors::VerifyError;
use crate::domain::ports::KeySetSource;
use crate::use_cases::key_set_cache::KeySetCache;

// Verifies caller tokens against the published keys of trusted issuers.
pub struct TokenVerifier {
    pub trusted_domains: HashSet<String>,
    pub audience: String,
    pub algorithms: Vec<Algorithm>,
    pub cache: Arc<KeySetCache>,
    pub source: Arc<dyn KeySetSource>,
}

// Only the issuer is read before the signature is checked.
#[derive(Deserialize)]
struct UnverifiedClaims {
    iss: Option<String>,
}

impl TokenVerifier {
    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        // Untrusted data: used only to pick which key set to load.
        let issuer = unverified_issuer(token)?;

        let domain = issuer_domain(&issuer)
            .ok_or_else(|| VerifyError::UntrustedIssuer(issuer.clone()))?;
        if !self.trusted_domains.contains(&domain) {
            return Err(VerifyError::UntrustedIssuer(domain));
        }

        let header = jsonwebtoken::decode_header(token)
            .map_err(|err| VerifyError::SignatureOrClaimInvalid(err.to_string()))?;
        let kid = header.kid.as_deref().ok_or_else(|| {
            VerifyError::SignatureOrClaimInvalid("token header has no kid".to_string())
        })?;

        let jwk = self.signing_key(&domain, kid).await?;
        let algorithm = self.resolve_algorithm(&jwk, header.alg)?;
        let key = DecodingKey::from_jwk(&jwk)
            .map_err(|err| VerifyError::UnsupportedKeyFormat(err.to_string()))?;

        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss", "sub"]);

        let data = jsonwebtoken::decode::<VerifiedIdentity>(token, &key, &validation)
            .map_err(|err| VerifyError::SignatureOrClaimInvalid(err.to_string()))?;

        Ok(data.claims)
    }

    async fn signing_key(&self, domain: &str, kid: &str) -> Result<Jwk, VerifyError> {
        let was_cached = self.cache.contains(domain).await;
        let keys = self
            .cache
            .get_or_fetch(domain, self.source.as_ref())
            .await
            .map_err(VerifyError::KeyFetchFailure)?;
        if let Some(jwk) = keys.find(kid) {
            return Ok(jwk.clone());
        }

        // A cached set may predate a key rotation; look once more at the live set,
        // at most once per refresh interval per domain.
        if was_cached {
            let refreshed = self
                .cache
                .refresh_if_stale(domain, self.source.as_ref())
                .await
                .map_err(VerifyError::KeyFetchFailure)?;
            match refreshed {
                Some(keys) => {
                    tracing::info!(%domain, %kid, "signing key not in cached set, refreshed");
                    if let Some(jwk) = keys.find(kid) {
                        return Ok(jwk.clone());
                    }
                }
                None => tracing::debug!(%domain, %kid, "unknown kid, key set refreshed recently"),
            }
        }

        Err(VerifyError::KeyFetchFailure(format!(
            "no signing key matches kid {kid}"
        )))
    }

    fn resolve_algorithm(&self, jwk: &Jwk, token_alg: Algorithm) -> Result<Algorithm, VerifyError> {
        let algorithm = match jwk.common.key_algorithm {
            Some(declared) => signing_algorithm(declared).ok_or_else(|| {
                VerifyError::UnsupportedKeyFormat(format!("{declared:?} is not a signing algorithm"))
            })?,
            None => token_alg,
        };

        if !self.algorithms.contains(&algorithm) {
            return Err(VerifyError::UnsupportedKeyFormat(format!(
                "{algorithm:?} is not an accepted signing algorithm"
            )));
        }
        if token_alg != algorithm {
            return Err(VerifyError::UnsupportedKeyFormat(format!(
                "token algorithm {token_alg:?} does not match key algorithm {algorithm:?}"
            )));
        }

        Ok(algorithm)
    }
}

fn unverified_issuer(token: &str) -> Result<String, VerifyError> {
    let malformed = |reason: &str| VerifyError::SignatureOrClaimInvalid(reason.to_string());

    let segments: Vec<&str> = token.split('.').collect();
    let [_, payload, _] = segments.as_slice() else {
        return Err(malformed("token is not a three-part JWT"));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| malformed("token payload is not base64url"))?;
    let claims: UnverifiedClaims =
        serde_json::from_slice(&bytes).map_err(|_| malformed("token payload is not a claim set"))?;

    claims.iss.ok_or_else(|| malformed("token has no issuer"))
}

// `https://xyz.example.co/auth/v1` -> `xyz.example.co`. Non-https issuers have no domain.
pub fn issuer_domain(issuer: &str) -> Option<String> {
    let url = Url::parse(issuer).ok()?;
    if url.scheme() != "https" {
        return None;
    }
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn signing_algorithm(declared: KeyAlgorithm) -> Option<Algorithm> {
    match declared {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        // Encryption algorithms (RSA1_5, RSA-OAEP, ...) never sign tokens.
        _ => None,
    }
}
