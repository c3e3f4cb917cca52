use crate::error::BookingError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use std::time::Duration;
use wayfare_domain::config::BookingPolicyConfig;

/// Scheduling rules in the company's time zone.
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    offset: FixedOffset,
    min_lead: TimeDelta,
    max_advance: TimeDelta,
    cancellation_cutoff: TimeDelta,
    draft_ttl: Duration,
    draft_capacity: u64,
}

impl BookingPolicy {
    /// # Errors
    /// Returns [`BookingError::Config`] for an offset beyond ±24 h, a zero booking window, or a
    /// zero draft TTL or capacity.
    pub fn new(config: &BookingPolicyConfig) -> Result<Self, BookingError> {
        let invalid = |message: &'static str| BookingError::Config {
            message: message.into(),
            context: Some("booking".into()),
        };

        let offset = config
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| invalid("utc_offset_minutes is out of range"))?;
        if config.max_advance_days == 0 {
            return Err(invalid("max_advance_days must be greater than zero"));
        }
        if config.draft_ttl_seconds == 0 || config.draft_capacity == 0 {
            return Err(invalid("draft_ttl_seconds and draft_capacity must be greater than zero"));
        }

        Ok(Self {
            offset,
            min_lead: TimeDelta::minutes(i64::from(config.min_lead_minutes)),
            max_advance: TimeDelta::days(i64::from(config.max_advance_days)),
            cancellation_cutoff: TimeDelta::minutes(i64::from(config.cancellation_cutoff_minutes)),
            draft_ttl: Duration::from_secs(config.draft_ttl_seconds),
            draft_capacity: config.draft_capacity,
        })
    }

    #[must_use]
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    #[must_use]
    pub const fn draft_ttl(&self) -> Duration {
        self.draft_ttl
    }

    #[must_use]
    pub const fn draft_capacity(&self) -> u64 {
        self.draft_capacity
    }

    #[must_use]
    pub const fn cancellation_cutoff(&self) -> TimeDelta {
        self.cancellation_cutoff
    }

    /// Interprets a wall-clock date and time in the company's zone.
    #[must_use]
    pub fn to_utc(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        // A fixed offset has exactly one mapping for every local time.
        self.offset
            .from_local_datetime(&NaiveDateTime::new(date, time))
            .single()
            .map_or_else(|| NaiveDateTime::new(date, time).and_utc(), |local| local.with_timezone(&Utc))
    }

    #[must_use]
    pub fn to_local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset)
    }

    /// Checks that a pickup is far enough ahead and not too far out.
    ///
    /// # Errors
    /// Returns a validation error naming `pickupTime` or `pickupDate`.
    pub fn check_pickup_time(
        &self,
        pickup_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        if pickup_at < now + self.min_lead {
            return Err(BookingError::invalid(
                "pickupTime",
                format!("must be at least {} minutes from now", self.min_lead.num_minutes()),
            ));
        }
        if pickup_at > now + self.max_advance {
            return Err(BookingError::invalid(
                "pickupDate",
                format!("must be within {} days from now", self.max_advance.num_days()),
            ));
        }
        Ok(())
    }

    /// Whether a customer may still cancel a trip picking up at `pickup_at`.
    #[must_use]
    pub fn customer_can_cancel(&self, pickup_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now + self.cancellation_cutoff <= pickup_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BookingPolicy {
        BookingPolicy::new(&BookingPolicyConfig::default()).unwrap()
    }

    #[test]
    fn local_times_are_lagos_by_default() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let time = NaiveTime::from_hms_opt(8, 30, 0).unwrap();

        let utc = policy().to_utc(date, time);
        assert_eq!(utc.to_rfc3339(), "2026-03-14T07:30:00+00:00");
        assert_eq!(policy().to_local(utc).format("%H:%M").to_string(), "08:30");
    }

    #[test]
    fn pickup_window_is_enforced() {
        let now = Utc::now();
        let policy = policy();

        assert!(policy.check_pickup_time(now + TimeDelta::minutes(59), now).is_err());
        assert!(policy.check_pickup_time(now + TimeDelta::minutes(60), now).is_ok());
        assert!(policy.check_pickup_time(now + TimeDelta::days(90), now).is_ok());
        assert!(policy.check_pickup_time(now + TimeDelta::days(91), now).is_err());
    }

    #[test]
    fn cancellation_closes_two_hours_before_pickup() {
        let now = Utc::now();
        let policy = policy();

        assert!(policy.customer_can_cancel(now + TimeDelta::minutes(120), now));
        assert!(!policy.customer_can_cancel(now + TimeDelta::minutes(119), now));
    }

    #[test]
    fn invalid_policies_are_rejected() {
        let config =
            BookingPolicyConfig { utc_offset_minutes: 25 * 60, ..BookingPolicyConfig::default() };
        assert!(BookingPolicy::new(&config).is_err());

        let config = BookingPolicyConfig { draft_capacity: 0, ..BookingPolicyConfig::default() };
        assert!(BookingPolicy::new(&config).is_err());
    }
}
