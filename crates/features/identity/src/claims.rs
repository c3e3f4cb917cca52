use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Access level of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

/// JWT claims shared by provider-issued tokens and re-issued session tokens.
///
/// Provider tokens carry no `role`; session tokens add it as a custom claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Provider user ID.
    pub sub: String,
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
    #[serde(default)]
    pub iat: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Claims {
    /// Claims for `sub` valid for `ttl_seconds` from `now` (seconds since the epoch).
    #[must_use]
    pub fn new(sub: impl Into<String>, issuer: impl Into<String>, now: u64, ttl_seconds: u64) -> Self {
        Self {
            sub: sub.into(),
            iss: issuer.into(),
            aud: None,
            exp: now.saturating_add(ttl_seconds),
            iat: now,
            email: None,
            name: None,
            phone_number: None,
            role: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_claims_without_role_deserialize() {
        let claims: Claims = serde_json::from_str(
            r#"{"sub":"uid-1","iss":"wayfare","exp":10,"email":"ada@example.com","picture":"x"}"#,
        )
        .unwrap();
        assert_eq!(claims.role, None);
        assert_eq!(claims.iat, 0);
        assert_eq!(claims.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn role_serializes_lowercase() {
        let claims = Claims::new("uid-1", "wayfare", 100, 60).with_role(Role::Admin);
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["role"], "admin");
        assert_eq!(json["exp"], 160);
        assert!(json.get("email").is_none());
    }
}
