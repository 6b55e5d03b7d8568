//! Tenant tokens: compact HMAC-signed JWTs carrying search rules, an API key prefix,
//! an issued-at timestamp and an optional expiry.
//!
//! Building is a single pass: verify claims, check expiry, assemble the payload, sign.
//! Any failing step ends the pipeline and no token is produced.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};

use crate::claims::{ApiKeyClaim, SearchRules, TenantClaims};
use crate::error::{Result, SearchError};

/// Produces a compact signed token from a claim set
pub trait TokenSigner {
    fn sign(&self, claims: &TenantClaims) -> Result<String>;
}

/// HMAC signer borrowing the caller's secret for the duration of one build
pub struct HmacSigner<'a> {
    secret: &'a [u8],
    algorithm: Algorithm,
}

impl<'a> HmacSigner<'a> {
    /// HS256 signer
    pub fn new(secret: &'a [u8]) -> Self {
        HmacSigner {
            secret,
            algorithm: Algorithm::HS256,
        }
    }

    /// Select another HMAC algorithm. Non-HMAC algorithms are rejected.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self> {
        ensure_hmac(algorithm)?;
        self.algorithm = algorithm;
        Ok(self)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl TokenSigner for HmacSigner<'_> {
    fn sign(&self, claims: &TenantClaims) -> Result<String> {
        if self.secret.is_empty() {
            return Err(SearchError::Signing("signing secret is empty".to_string()));
        }
        encode(
            &Header::new(self.algorithm),
            claims,
            &EncodingKey::from_secret(self.secret),
        )
        .map_err(|e| SearchError::Signing(e.to_string()))
    }
}

// Keep the secret out of logs
impl std::fmt::Debug for HmacSigner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

fn ensure_hmac(algorithm: Algorithm) -> Result<()> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
        other => Err(SearchError::Signing(format!(
            "{:?} is not an HMAC algorithm",
            other
        ))),
    }
}

/// Build a tenant token signed with HS256.
///
/// # Arguments
/// * `search_rules` - Per-index policy the token grants
/// * `api_key` - Key the token is derived from; must be at least 8 characters
/// * `signing_secret` - HMAC secret, usually the full API key
/// * `expires_at` - Expiry, at least one whole second after issuance; `None` for a non-expiring token
pub fn build_tenant_token(
    search_rules: &SearchRules,
    api_key: &ApiKeyClaim,
    signing_secret: &str,
    expires_at: Option<DateTime<Utc>>,
) -> Result<String> {
    let signer = HmacSigner::new(signing_secret.as_bytes());
    build_tenant_token_with(&signer, search_rules, api_key, expires_at, Utc::now())
}

/// Build a tenant token with an explicit signer and issuance time
pub fn build_tenant_token_with<S: TokenSigner + ?Sized>(
    signer: &S,
    search_rules: &SearchRules,
    api_key: &ApiKeyClaim,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<String> {
    api_key.verify()?;
    search_rules.verify()?;

    // exp and iat are whole seconds in the payload
    if let Some(expires_at) = expires_at {
        if expires_at.timestamp() <= now.timestamp() {
            return Err(SearchError::ExpiredToken { expires_at });
        }
    }

    let claims = TenantClaims {
        search_rules: search_rules.clone(),
        api_key_prefix: api_key.prefix().to_string(),
        iat: now.timestamp(),
        exp: expires_at.map(|at| at.timestamp()),
    };

    signer.sign(&claims)
}

/// Check a token's signature against `signing_secret` and its expiry against the
/// current time, returning its claims
pub fn verify_tenant_token(token: &str, signing_secret: &str) -> Result<TenantClaims> {
    if signing_secret.is_empty() {
        return Err(SearchError::Signing("signing secret is empty".to_string()));
    }

    let header = jsonwebtoken::decode_header(token)
        .map_err(|e| SearchError::Signing(format!("cannot decode header: {}", e)))?;
    ensure_hmac(header.alg)?;

    // Expiry is optional for tenant tokens and checked below without leeway
    let mut validation = Validation::new(header.alg);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    validation.validate_aud = false;

    let data: TokenData<TenantClaims> = decode(
        token,
        &DecodingKey::from_secret(signing_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| SearchError::Signing(e.to_string()))?;

    if let Some(exp) = data.claims.exp {
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| SearchError::Parse(format!("exp {} is out of range", exp)))?;
        if expires_at <= Utc::now() {
            return Err(SearchError::ExpiredToken { expires_at });
        }
    }

    Ok(data.claims)
}

/// Decode a token's payload without checking its signature
pub fn peek_claims(token: &str) -> Result<TenantClaims> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => {
            return Err(SearchError::Parse(
                "token must have three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| SearchError::Parse(format!("payload is not base64url: {}", e)))?;
    serde_json::from_slice(&bytes).map_err(|e| SearchError::Parse(format!("payload: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::IndexRules;
    use chrono::{Duration, TimeZone};
    use std::cell::Cell;

    const KEY: &str = "73f9a4b2c1d0e8f7a6b5c4d3e2f1a0b9";

    struct CountingSigner {
        calls: Cell<usize>,
    }

    impl TokenSigner for CountingSigner {
        fn sign(&self, _claims: &TenantClaims) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            Ok("header.payload.signature".to_string())
        }
    }

    fn rules() -> SearchRules {
        SearchRules::new().index("movies", Some(IndexRules::new().with_filter("user = 1")))
    }

    #[test]
    fn test_expired_never_signs() {
        let signer = CountingSigner { calls: Cell::new(0) };
        let now = Utc::now();

        let err = build_tenant_token_with(
            &signer,
            &rules(),
            &ApiKeyClaim::new(KEY),
            Some(now - Duration::seconds(1)),
            now,
        )
        .unwrap_err();

        assert!(err.is_expired_token());
        assert_eq!(signer.calls.get(), 0);
    }

    #[test]
    fn test_expiry_equal_to_now_is_expired() {
        let signer = CountingSigner { calls: Cell::new(0) };
        let now = Utc::now();
        let result =
            build_tenant_token_with(&signer, &rules(), &ApiKeyClaim::new(KEY), Some(now), now);
        assert!(result.unwrap_err().is_expired_token());
    }

    #[test]
    fn test_expiry_within_same_second_is_expired() {
        let signer = CountingSigner { calls: Cell::new(0) };
        let now = Utc.timestamp_opt(1_900_000_000, 200_000_000).unwrap();

        let result = build_tenant_token_with(
            &signer,
            &rules(),
            &ApiKeyClaim::new(KEY),
            Some(now + Duration::milliseconds(500)),
            now,
        );
        assert!(result.unwrap_err().is_expired_token());
        assert_eq!(signer.calls.get(), 0);

        let token = build_tenant_token(
            &rules(),
            &ApiKeyClaim::new(KEY),
            KEY,
            Some(Utc::now() + Duration::seconds(2)),
        )
        .unwrap();
        let claims = peek_claims(&token).unwrap();
        assert!(claims.exp.unwrap() > claims.iat);
    }

    #[test]
    fn test_invalid_key_never_signs() {
        let signer = CountingSigner { calls: Cell::new(0) };
        let result =
            build_tenant_token_with(&signer, &rules(), &ApiKeyClaim::new("short"), None, Utc::now());
        assert!(result.unwrap_err().is_claim_failure());
        assert_eq!(signer.calls.get(), 0);
    }

    #[test]
    fn test_signer_receives_claims() {
        let signer = CountingSigner { calls: Cell::new(0) };
        let token =
            build_tenant_token_with(&signer, &rules(), &ApiKeyClaim::new(KEY), None, Utc::now())
                .unwrap();
        assert_eq!(token, "header.payload.signature");
        assert_eq!(signer.calls.get(), 1);
    }

    #[test]
    fn test_empty_secret() {
        let result = build_tenant_token(&rules(), &ApiKeyClaim::new(KEY), "", None);
        assert!(matches!(result, Err(SearchError::Signing(_))));
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        let result = HmacSigner::new(KEY.as_bytes()).with_algorithm(Algorithm::RS256);
        assert!(matches!(result, Err(SearchError::Signing(_))));

        let signer = HmacSigner::new(KEY.as_bytes())
            .with_algorithm(Algorithm::HS512)
            .unwrap();
        assert_eq!(signer.algorithm(), Algorithm::HS512);
    }

    #[test]
    fn test_token_round_trip() {
        let now = Utc::now();
        let expires_at = now + Duration::hours(1);
        let token = build_tenant_token(&rules(), &ApiKeyClaim::new(KEY), KEY, Some(expires_at)).unwrap();

        assert_eq!(token.split('.').count(), 3);

        let claims = verify_tenant_token(&token, KEY).unwrap();
        assert_eq!(claims.search_rules, rules());
        assert_eq!(claims.api_key_prefix, "73f9a4b2");
        assert_eq!(claims.exp, Some(expires_at.timestamp()));
        assert!(claims.iat >= now.timestamp());

        assert!(matches!(
            verify_tenant_token(&token, "another-secret-value"),
            Err(SearchError::Signing(_))
        ));
    }

    #[test]
    fn test_peek_claims() {
        let token = build_tenant_token(&rules(), &ApiKeyClaim::new(KEY), KEY, None).unwrap();
        let claims = peek_claims(&token).unwrap();
        assert_eq!(claims.exp, None);
        assert_eq!(claims.api_key_prefix, "73f9a4b2");

        assert!(matches!(peek_claims("a.b"), Err(SearchError::Parse(_))));
        assert!(matches!(peek_claims("a.!!.c"), Err(SearchError::Parse(_))));
    }
}
