use crate::error::ContactError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use wayfare_database::{Database, DatabaseErrorExt};
use wayfare_domain::constants::INQUIRY;
use wayfare_kernel::safe_nanoid;
use wayfare_kernel::validation::{self, ValidationError};

const MAX_NAME_CHARS: usize = 120;
const MAX_SUBJECT_CHARS: usize = 150;
const MAX_MESSAGE_CHARS: usize = 2_000;

/// Raw form fields, before validation.
#[derive(Debug, Clone, Default)]
pub struct InquiryForm<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub message: &'a str,
}

/// An `inquiry` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryRecord {
    pub inquiry_id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl InquiryRecord {
    /// Validates and normalizes a submitted form.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn from_form(
        id: String,
        form: &InquiryForm<'_>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            inquiry_id: id,
            name: validation::required_text("name", form.name, MAX_NAME_CHARS)?,
            email: validation::email("email", form.email)?,
            phone: validation::optional_nigerian_phone("phone", form.phone)?,
            subject: validation::optional_text("subject", form.subject, MAX_SUBJECT_CHARS)?,
            message: validation::required_text("message", form.message, MAX_MESSAGE_CHARS)?,
            created_at: now,
        })
    }
}

/// `inquiry` table access.
#[derive(Debug, Clone)]
pub struct InquiryStore {
    db: Database,
}

impl InquiryStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        form: &InquiryForm<'_>,
        now: DateTime<Utc>,
    ) -> Result<InquiryRecord, ContactError> {
        let record = InquiryRecord::from_form(safe_nanoid!(), form, now)?;
        let id = record.inquiry_id.clone();

        let created: Option<InquiryRecord> =
            self.db.create((INQUIRY, id.as_str())).content(record).await.context("Creating inquiry")?;
        let created = created.ok_or_else(|| ContactError::Internal {
            message: "Create returned no document".into(),
            context: Some(id.into()),
        })?;

        tracing::info!(inquiry = %created.inquiry_id, subject = ?created.subject, "Inquiry received");
        Ok(created)
    }

    /// All inquiries, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<InquiryRecord>, ContactError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {INQUIRY} ORDER BY created_at DESC"))
            .await
            .context("Listing inquiries")?;

        Ok(response.take(0).context("Reading inquiries")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form<'a>() -> InquiryForm<'a> {
        InquiryForm {
            name: "  Amaka Eze ",
            email: "Amaka@Example.NG",
            phone: Some("0803 123 4567"),
            subject: Some(" "),
            message: "Do you do airport pickups at night?",
        }
    }

    #[test]
    fn forms_are_normalized() {
        let record = InquiryRecord::from_form("id-1".to_owned(), &form(), Utc::now()).unwrap();

        assert_eq!(record.name, "Amaka Eze");
        assert_eq!(record.email, "amaka@example.ng");
        assert_eq!(record.phone.as_deref(), Some("+2348031234567"));
        assert_eq!(record.subject, None);
    }

    #[test]
    fn invalid_fields_are_named() {
        let long_subject = "s".repeat(151);
        let long_message = "m".repeat(2_001);
        let cases = [
            (InquiryForm { name: "", ..form() }, "name"),
            (InquiryForm { email: "not-an-email", ..form() }, "email"),
            (InquiryForm { phone: Some("+1 202 555 0100"), ..form() }, "phone"),
            (InquiryForm { subject: Some(&long_subject), ..form() }, "subject"),
            (InquiryForm { message: &long_message, ..form() }, "message"),
        ];

        for (form, field) in &cases {
            let err = InquiryRecord::from_form("id".to_owned(), form, Utc::now()).unwrap_err();
            assert_eq!(err.field(), *field);
        }
    }
}
