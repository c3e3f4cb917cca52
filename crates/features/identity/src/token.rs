use crate::claims::{Claims, Role};
use crate::error::{IdentityError, IdentityErrorExt};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::fmt;
use wayfare_domain::config::JwtConfig;

const DEV_SECRET: &str = "dev-only-change-me";

/// Verifies bearer tokens and issues session tokens (HS256).
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: Option<String>,
    ttl: TimeDelta,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenService {
    /// # Errors
    /// Returns [`IdentityError::Config`] for an empty secret or issuer, or a zero TTL.
    pub fn new(config: &JwtConfig) -> Result<Self, IdentityError> {
        if config.secret.trim().is_empty() {
            return Err(IdentityError::Config {
                message: "JWT secret must not be empty".into(),
                context: Some("security.identity.jwt.secret".into()),
            });
        }
        if config.issuer.trim().is_empty() {
            return Err(IdentityError::Config {
                message: "JWT issuer must not be empty".into(),
                context: Some("security.identity.jwt.issuer".into()),
            });
        }
        let ttl = i64::try_from(config.ttl_seconds)
            .ok()
            .filter(|seconds| *seconds > 0)
            .and_then(TimeDelta::try_seconds)
            .ok_or(IdentityError::Config {
                message: "Session TTL must be a positive number of seconds".into(),
                context: Some("security.identity.jwt.ttl_seconds".into()),
            })?;

        if config.secret == DEV_SECRET {
            tracing::warn!("Using the development JWT secret; set WAYFARE__SECURITY__IDENTITY__JWT__SECRET");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.clock_skew_seconds;
        validation.set_issuer(&[&config.issuer]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl,
        })
    }

    /// Checks signature, expiry (with clock skew), issuer and audience.
    ///
    /// # Errors
    /// Returns [`IdentityError::Token`] when any check fails.
    pub fn verify(&self, token: &str) -> Result<Claims, IdentityError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .context("Verifying bearer token")
    }

    /// Signs arbitrary claims with the configured key.
    ///
    /// # Errors
    /// Returns [`IdentityError::Token`] if encoding fails.
    pub fn sign(&self, claims: &Claims) -> Result<String, IdentityError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).context("Signing token")
    }

    /// Issues a session token for a verified caller, carrying `role` as a custom claim.
    ///
    /// # Errors
    /// Returns [`IdentityError::Token`] if encoding fails.
    pub fn issue_session(
        &self,
        verified: &Claims,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, IdentityError> {
        let issued_at = u64::try_from(now.timestamp()).unwrap_or_default();
        let expires_at = now + self.ttl;

        let mut claims = verified.clone();
        claims.iss.clone_from(&self.issuer);
        claims.aud.clone_from(&self.audience);
        claims.iat = issued_at;
        claims.exp = u64::try_from(expires_at.timestamp()).unwrap_or_default();
        claims.role = Some(role);

        Ok(IssuedToken { token: self.sign(&claims)?, expires_at })
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig { secret: "unit-test-secret".to_owned(), ..JwtConfig::default() }
    }

    fn now_secs() -> u64 {
        u64::try_from(Utc::now().timestamp()).unwrap()
    }

    #[test]
    fn round_trips_provider_claims() {
        let tokens = TokenService::new(&config()).unwrap();
        let claims = Claims::new("uid-1", "wayfare", now_secs(), 600).with_email("ada@example.com");

        let verified = tokens.verify(&tokens.sign(&claims).unwrap()).unwrap();
        assert_eq!(verified, claims);
    }

    #[test]
    fn rejects_foreign_signature_issuer_and_expiry() {
        let tokens = TokenService::new(&config()).unwrap();
        let other = TokenService::new(&JwtConfig { secret: "another".to_owned(), ..config() }).unwrap();

        let good = Claims::new("uid-1", "wayfare", now_secs(), 600);
        assert!(tokens.verify(&other.sign(&good).unwrap()).is_err());

        let wrong_issuer = Claims::new("uid-1", "someone-else", now_secs(), 600);
        assert!(tokens.verify(&tokens.sign(&wrong_issuer).unwrap()).is_err());

        let expired = Claims::new("uid-1", "wayfare", now_secs() - 7_200, 600);
        assert!(tokens.verify(&tokens.sign(&expired).unwrap()).is_err());

        assert!(tokens.verify("not-a-jwt").is_err());
    }

    #[test]
    fn audience_is_enforced_when_configured() {
        let tokens = TokenService::new(&JwtConfig {
            audience: Some("wayfare-web".to_owned()),
            ..config()
        })
        .unwrap();

        let mut claims = Claims::new("uid-1", "wayfare", now_secs(), 600);
        assert!(tokens.verify(&tokens.sign(&claims).unwrap()).is_err());

        claims.aud = Some("wayfare-web".to_owned());
        assert!(tokens.verify(&tokens.sign(&claims).unwrap()).is_ok());
    }

    #[test]
    fn session_token_carries_role() {
        let tokens = TokenService::new(&config()).unwrap();
        let provider = Claims::new("uid-1", "wayfare", now_secs(), 60).with_name("Ada");

        let issued = tokens.issue_session(&provider, Role::Admin, Utc::now()).unwrap();
        let session = tokens.verify(&issued.token).unwrap();

        assert_eq!(session.role, Some(Role::Admin));
        assert_eq!(session.name.as_deref(), Some("Ada"));
        assert!(session.exp > provider.exp);
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(TokenService::new(&JwtConfig { secret: " ".to_owned(), ..config() }).is_err());
        assert!(TokenService::new(&JwtConfig { ttl_seconds: 0, ..config() }).is_err());
    }
}
