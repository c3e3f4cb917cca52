use crate::claims::{Claims, Role};
use crate::error::IdentityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use wayfare_database::{Database, DatabaseErrorExt};
use wayfare_domain::constants::USER;
use wayfare_kernel::security::resource::ResourceGuard;
use wayfare_kernel::validation;

/// A `user` document, keyed by the provider user ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_login_at: DateTime<Utc>,
}

impl UserRecord {
    /// Merges a sign-in into the stored document.
    ///
    /// Provider fields overwrite stored ones only when present; `created_at` survives; the role
    /// is `admin` for configured admin e-mails, otherwise the stored role. A provider phone
    /// number is stored in `+234` form, or dropped if it is not a Nigerian mobile number.
    #[must_use]
    pub fn sign_in(
        existing: Option<Self>,
        claims: &Claims,
        admin_emails: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        let email = claims.email.as_deref().map(|email| email.trim().to_lowercase());
        let phone = claims.phone_number.as_deref().and_then(|raw| {
            validation::nigerian_phone("phone", raw)
                .inspect_err(|_| tracing::debug!(uid = %claims.sub, "Ignoring provider phone number"))
                .ok()
        });
        let is_admin = email
            .as_deref()
            .is_some_and(|email| admin_emails.iter().any(|admin| admin.eq_ignore_ascii_case(email)));

        match existing {
            Some(mut user) => {
                if email.is_some() {
                    user.email = email;
                }
                if user.display_name.is_none() {
                    user.display_name.clone_from(&claims.name);
                }
                if user.phone.is_none() {
                    user.phone = phone;
                }
                if is_admin {
                    user.role = Role::Admin;
                }
                user.updated_at = now;
                user.last_login_at = now;
                user
            },
            None => Self {
                uid: claims.sub.clone(),
                email,
                display_name: claims.name.clone(),
                phone,
                role: if is_admin { Role::Admin } else { Role::Customer },
                created_at: now,
                updated_at: now,
                last_login_at: now,
            },
        }
    }
}

/// Changes a user may make to their own profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

/// `user` table access.
#[derive(Debug, Clone)]
pub struct UserStore {
    db: Database,
}

impl UserStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, uid: &str) -> Result<Option<UserRecord>, IdentityError> {
        let key = ResourceGuard::key(uid, USER).map_err(|e| IdentityError::Auth {
            message: e.to_string().into(),
            context: Some("Token subject".into()),
        })?;
        let user: Option<UserRecord> =
            self.db.select((USER, key.as_str())).await.context("Selecting user")?;
        Ok(user)
    }

    /// Records a sign-in: creates the document on first login and refreshes it afterwards.
    #[instrument(skip(self, claims, admin_emails), fields(uid = %claims.sub))]
    pub async fn upsert_sign_in(
        &self,
        claims: &Claims,
        admin_emails: &[String],
        now: DateTime<Utc>,
    ) -> Result<UserRecord, IdentityError> {
        let existing = self.get(&claims.sub).await?;
        let first_login = existing.is_none();
        let record = UserRecord::sign_in(existing, claims, admin_emails, now);

        let saved = self.save(record).await?;
        tracing::info!(role = saved.role.as_str(), first_login, "User signed in");
        Ok(saved)
    }

    /// Applies profile changes.
    ///
    /// # Errors
    /// Returns [`IdentityError::NotFound`] if the user never opened a session.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        uid: &str,
        changes: ProfileChanges,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, IdentityError> {
        let mut user = self.get(uid).await?.ok_or_else(|| IdentityError::NotFound {
            message: "No profile yet; open a session first".into(),
            context: None,
        })?;

        if let Some(display_name) = changes.display_name {
            user.display_name = Some(display_name);
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        user.updated_at = now;

        self.save(user).await
    }

    async fn save(&self, record: UserRecord) -> Result<UserRecord, IdentityError> {
        let uid = record.uid.clone();
        let saved: Option<UserRecord> =
            self.db.upsert((USER, uid.as_str())).content(record).await.context("Upserting user")?;

        saved.ok_or_else(|| IdentityError::Internal {
            message: "Upsert returned no document".into(),
            context: Some(uid.into()),
        })
    }
}
