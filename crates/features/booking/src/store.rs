use crate::error::BookingError;
use crate::model::{BookingRecord, BookingStatus, Customer};
use crate::wizard::ConfirmedDraft;
use chrono::{DateTime, Utc};
use tracing::instrument;
use wayfare_database::{Database, DatabaseErrorExt};
use wayfare_domain::constants::{BOOKING, BOOKING_REFERENCE_PREFIX};
use wayfare_kernel::safe_nanoid;
use wayfare_kernel::security::resource::ResourceGuard;

const REFERENCE_CHARS: usize = 8;

/// `booking` table access.
#[derive(Debug, Clone)]
pub struct BookingStore {
    db: Database,
}

impl BookingStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Stores a confirmed wizard under a fresh `WF-` reference.
    #[instrument(skip_all, fields(owner = %draft.owner))]
    pub async fn create(
        &self,
        draft: ConfirmedDraft,
        customer: Customer,
        now: DateTime<Utc>,
    ) -> Result<BookingRecord, BookingError> {
        let reference = format!("{BOOKING_REFERENCE_PREFIX}{}", safe_nanoid!(REFERENCE_CHARS));
        let record = BookingRecord::from_draft(reference.clone(), draft, customer, now);

        let created: Option<BookingRecord> = self
            .db
            .create((BOOKING, reference.as_str()))
            .content(record)
            .await
            .context("Creating booking")?;

        let created = created.ok_or_else(|| BookingError::Internal {
            message: "Create returned no document".into(),
            context: Some(reference.into()),
        })?;
        tracing::info!(
            reference = %created.reference,
            status = created.status.as_str(),
            total_kobo = created.amount_kobo(),
            "Booking created"
        );
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, reference: &str) -> Result<Option<BookingRecord>, BookingError> {
        let key = ResourceGuard::key(reference, BOOKING)
            .map_err(|e| BookingError::invalid("reference", e.to_string()))?;
        let booking: Option<BookingRecord> =
            self.db.select((BOOKING, key.as_str())).await.context("Selecting booking")?;
        Ok(booking)
    }

    /// Loads a booking the caller may see: their own, or any for admins.
    ///
    /// # Errors
    /// Returns [`BookingError::NotFound`] for missing and foreign bookings alike.
    pub async fn get_visible(
        &self,
        reference: &str,
        uid: &str,
        is_admin: bool,
    ) -> Result<BookingRecord, BookingError> {
        self.get(reference)
            .await?
            .filter(|booking| is_admin || booking.owner_uid == uid)
            .ok_or_else(|| BookingError::not_found(format!("Booking '{reference}' not found")))
    }

    /// Writes back a modified booking, bumping its revision.
    ///
    /// The write only applies if the stored revision is still the one `record` was read at.
    ///
    /// # Errors
    /// * [`BookingError::Conflict`] when another request saved the booking in between.
    /// * [`BookingError::NotFound`] when the booking no longer exists.
    #[instrument(skip_all, fields(reference = %record.reference, revision = record.revision))]
    pub async fn save(&self, mut record: BookingRecord) -> Result<BookingRecord, BookingError> {
        let reference = record.reference.clone();
        let expected = record.revision;
        record.revision += 1;

        let mut response = self
            .db
            .query(format!(
                "UPDATE type::thing('{BOOKING}', $key) CONTENT $record WHERE revision = $expected RETURN AFTER"
            ))
            .bind(("key", reference.clone()))
            .bind(("record", record))
            .bind(("expected", expected))
            .await
            .context("Updating booking")?;
        let saved: Vec<BookingRecord> = response.take(0).context("Reading updated booking")?;

        if let Some(saved) = saved.into_iter().next() {
            return Ok(saved);
        }
        match self.get(&reference).await? {
            Some(current) => {
                tracing::warn!(expected, current = current.revision, "Stale booking write rejected");
                Err(BookingError::conflict(format!(
                    "Booking '{reference}' was changed by another request; reload and retry"
                )))
            },
            None => Err(BookingError::not_found(format!("Booking '{reference}' not found"))),
        }
    }

    /// The caller's bookings, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_owner(&self, uid: &str) -> Result<Vec<BookingRecord>, BookingError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {BOOKING} WHERE owner_uid = $owner ORDER BY created_at DESC"))
            .bind(("owner", uid.to_owned()))
            .await
            .context("Listing bookings")?;

        Ok(response.take(0).context("Reading bookings")?)
    }

    /// All bookings, newest first, optionally with one status.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        status: Option<BookingStatus>,
    ) -> Result<Vec<BookingRecord>, BookingError> {
        let query = match status {
            Some(status) => self
                .db
                .query(format!("SELECT * FROM {BOOKING} WHERE status = $status ORDER BY created_at DESC"))
                .bind(("status", status.as_str())),
            None => self.db.query(format!("SELECT * FROM {BOOKING} ORDER BY created_at DESC")),
        };
        let mut response = query.await.context("Listing all bookings")?;

        Ok(response.take(0).context("Reading bookings")?)
    }

    /// Finds the booking that a gateway transaction was started for, by any of its attempts.
    #[instrument(skip(self))]
    pub async fn find_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<BookingRecord>, BookingError> {
        let mut response = self
            .db
            .query(format!("SELECT * FROM {BOOKING} WHERE payment_attempts CONTAINS $reference OR payment_reference = $reference LIMIT 1"))
            .bind(("reference", payment_reference.to_owned()))
            .await
            .context("Finding booking by payment reference")?;

        let rows: Vec<BookingRecord> = response.take(0).context("Reading booking")?;
        Ok(rows.into_iter().next())
    }
}
