use crate::model::{BookingRecord, BookingStatus, BookingView, PaymentStatus};
use chrono::{DateTime, Utc};
use wayfare_derive::api_model;

const RECENT_LIMIT: usize = 5;

#[api_model]
/// Booking counts per status
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StatusTotals {
    pub pending_payment: u32,
    pub confirmed: u32,
    pub cancelled: u32,
    pub completed: u32,
}

#[api_model]
/// The signed-in customer's overview
pub struct DashboardView {
    pub total_bookings: u32,
    pub by_status: StatusTotals,
    /// Open bookings whose pickup is still ahead
    pub upcoming_trips: u32,
    pub next_trip: Option<BookingView>,
    /// Sum of paid fares
    pub total_paid_kobo: u64,
    pub currency: String,
    /// Newest first
    pub recent: Vec<BookingView>,
}

/// Summarizes a customer's bookings, which must be ordered newest first.
#[must_use]
pub fn summarize(bookings: &[BookingRecord], currency: &str, now: DateTime<Utc>) -> DashboardView {
    let mut by_status = StatusTotals::default();
    for booking in bookings {
        let counter = match booking.status {
            BookingStatus::PendingPayment => &mut by_status.pending_payment,
            BookingStatus::Confirmed => &mut by_status.confirmed,
            BookingStatus::Cancelled => &mut by_status.cancelled,
            BookingStatus::Completed => &mut by_status.completed,
        };
        *counter += 1;
    }

    let upcoming: Vec<&BookingRecord> = bookings
        .iter()
        .filter(|booking| !booking.status.is_terminal() && booking.pickup_at > now)
        .collect();
    let next_trip = upcoming.iter().min_by_key(|booking| booking.pickup_at).map(|b| (*b).clone());

    let total_paid_kobo = bookings
        .iter()
        .filter(|booking| booking.payment_status == PaymentStatus::Paid)
        .map(BookingRecord::amount_kobo)
        .sum();

    DashboardView {
        total_bookings: count(bookings.len()),
        by_status,
        upcoming_trips: count(upcoming.len()),
        next_trip: next_trip.map(BookingView::from),
        total_paid_kobo,
        currency: currency.to_owned(),
        recent: bookings.iter().take(RECENT_LIMIT).cloned().map(BookingView::from).collect(),
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;
    use crate::model::tests::record;
    use chrono::TimeDelta;

    fn booking(reference: &str, pickup_in: TimeDelta, status: BookingStatus) -> BookingRecord {
        let mut booking = record(PaymentMethod::Card, pickup_in);
        booking.reference = reference.to_owned();
        booking.status = status;
        booking
    }

    #[test]
    fn empty_dashboard() {
        let view = summarize(&[], "NGN", Utc::now());
        assert_eq!(view.total_bookings, 0);
        assert_eq!(view.by_status, StatusTotals::default());
        assert!(view.next_trip.is_none());
        assert!(view.recent.is_empty());
    }

    #[test]
    fn counts_upcoming_and_paid_trips() {
        let now = Utc::now();
        let mut paid = booking("WF-PAID0001", TimeDelta::days(3), BookingStatus::Confirmed);
        paid.payment_status = PaymentStatus::Paid;
        let soonest = booking("WF-SOON0001", TimeDelta::hours(5), BookingStatus::PendingPayment);
        let cancelled = booking("WF-CANC0001", TimeDelta::hours(2), BookingStatus::Cancelled);
        let past = booking("WF-PAST0001", TimeDelta::hours(-4), BookingStatus::Confirmed);

        let bookings = [paid.clone(), soonest, cancelled, past];
        let view = summarize(&bookings, "NGN", now);

        assert_eq!(view.total_bookings, 4);
        assert_eq!(
            view.by_status,
            StatusTotals { pending_payment: 1, confirmed: 2, cancelled: 1, completed: 0 }
        );
        assert_eq!(view.upcoming_trips, 2);
        assert_eq!(view.next_trip.unwrap().reference, "WF-SOON0001");
        assert_eq!(view.total_paid_kobo, paid.amount_kobo());
        assert_eq!(view.recent.len(), 4);
    }

    #[test]
    fn recent_keeps_the_newest_five() {
        let bookings: Vec<BookingRecord> = (0..7)
            .map(|i| booking(&format!("WF-REC0000{i}"), TimeDelta::days(1), BookingStatus::Confirmed))
            .collect();

        let view = summarize(&bookings, "NGN", Utc::now());
        assert_eq!(view.recent.len(), 5);
        assert_eq!(view.recent[0].reference, "WF-REC00000");
        assert_eq!(view.upcoming_trips, 7);
    }
}
