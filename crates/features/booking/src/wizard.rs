//! The three-step booking wizard: route, schedule, then confirm & pay.
//!
//! A [`BookingDraft`] is a plain state machine. Every transition validates its input against the
//! current time passed in by the caller, so the rules are testable without a clock.

use crate::error::BookingError;
use crate::fare::{FareCalculator, FareQuote};
use crate::model::PaymentMethod;
use crate::policy::BookingPolicy;
use crate::vehicle::VehicleClass;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wayfare_derive::api_model;
use wayfare_kernel::validation;

const MAX_PLACE_CHARS: usize = 200;
const MAX_NOTES_CHARS: usize = 500;
const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Route,
    Schedule,
    Confirm,
}

#[api_model]
/// Where the trip starts and ends, and in which vehicle
#[derive(Clone, PartialEq)]
pub struct Route {
    pub pickup: String,
    pub dropoff: String,
    /// Driving distance as measured by the map widget
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
}

#[api_model]
/// Pickup time in the company's local time zone
pub struct ScheduleInput {
    pub pickup_date: NaiveDate,
    /// `HH:MM`
    pub pickup_time: NaiveTime,
    pub passengers: u8,
    pub notes: Option<String>,
}

#[api_model]
/// A validated schedule
#[derive(Clone, PartialEq, Eq)]
pub struct Schedule {
    pub pickup_at: DateTime<Utc>,
    /// `YYYY-MM-DD HH:MM` in the company's time zone
    pub pickup_local: String,
    pub passengers: u8,
    pub notes: Option<String>,
}

#[api_model]
/// A booking in progress
#[derive(Clone, PartialEq)]
pub struct BookingDraft {
    pub id: String,
    #[serde(skip)]
    pub owner: String,
    pub step: WizardStep,
    pub route: Option<Route>,
    pub quote: Option<FareQuote>,
    pub schedule: Option<Schedule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the booking store needs from a completed wizard.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedDraft {
    pub owner: String,
    pub route: Route,
    pub quote: FareQuote,
    pub schedule: Schedule,
    pub payment_method: PaymentMethod,
}

impl BookingDraft {
    #[must_use]
    pub fn new(id: impl Into<String>, owner: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            owner: owner.into(),
            step: WizardStep::Route,
            route: None,
            quote: None,
            schedule: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates the route, prices it and moves to the schedule step.
    ///
    /// Allowed from any step. An existing schedule is kept only while its passengers still fit
    /// the chosen vehicle.
    ///
    /// # Errors
    /// Returns a validation error for blank, oversized or identical places, or an unpriceable
    /// distance.
    pub fn submit_route(
        &mut self,
        route: Route,
        fares: &FareCalculator,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let pickup = validation::required_text("pickup", &route.pickup, MAX_PLACE_CHARS)?;
        let dropoff = validation::required_text("dropoff", &route.dropoff, MAX_PLACE_CHARS)?;
        if normalize_place(&pickup) == normalize_place(&dropoff) {
            return Err(BookingError::invalid("dropoff", "must differ from the pickup"));
        }

        let quote = fares.quote(route.distance_km, route.vehicle_class)?;
        let capacity = route.vehicle_class.capacity();

        self.route = Some(Route { pickup, dropoff, ..route });
        self.quote = Some(quote);
        if self.schedule.as_ref().is_some_and(|schedule| schedule.passengers > capacity) {
            self.schedule = None;
        }
        self.step = WizardStep::Schedule;
        self.updated_at = now;
        Ok(())
    }

    /// Validates the schedule and moves to the confirm step.
    ///
    /// # Errors
    /// * [`BookingError::Conflict`] when no route was submitted yet.
    /// * A validation error for passengers outside `1..=capacity`, a pickup outside the booking
    ///   window, or oversized notes.
    pub fn submit_schedule(
        &mut self,
        input: ScheduleInput,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let Some(route) = &self.route else {
            return Err(BookingError::conflict("Choose a route before scheduling the trip"));
        };

        let capacity = route.vehicle_class.capacity();
        if input.passengers == 0 || input.passengers > capacity {
            return Err(BookingError::invalid(
                "passengers",
                format!("must be between 1 and {capacity} for a {}", route.vehicle_class.display_name()),
            ));
        }

        let pickup_at = policy.to_utc(input.pickup_date, input.pickup_time);
        policy.check_pickup_time(pickup_at, now)?;
        let notes = validation::optional_text("notes", input.notes.as_deref(), MAX_NOTES_CHARS)?;

        self.schedule = Some(Schedule {
            pickup_at,
            pickup_local: policy.to_local(pickup_at).format(LOCAL_FORMAT).to_string(),
            passengers: input.passengers,
            notes,
        });
        self.step = WizardStep::Confirm;
        self.updated_at = now;
        Ok(())
    }

    /// Steps back: confirm to schedule, schedule to route. Entered data is kept.
    ///
    /// # Errors
    /// Returns [`BookingError::Conflict`] on the route step.
    pub fn back(&mut self, now: DateTime<Utc>) -> Result<(), BookingError> {
        self.step = match self.step {
            WizardStep::Confirm => WizardStep::Schedule,
            WizardStep::Schedule => WizardStep::Route,
            WizardStep::Route => {
                return Err(BookingError::conflict("Already at the first step"));
            },
        };
        self.updated_at = now;
        Ok(())
    }

    /// Completes the wizard. The pickup time is checked again since the draft may have waited.
    ///
    /// # Errors
    /// * [`BookingError::Conflict`] unless the draft is on the confirm step.
    /// * A validation error if the pickup time left the booking window.
    pub fn confirm(
        &self,
        payment_method: PaymentMethod,
        policy: &BookingPolicy,
        now: DateTime<Utc>,
    ) -> Result<ConfirmedDraft, BookingError> {
        let (WizardStep::Confirm, Some(route), Some(quote), Some(schedule)) =
            (self.step, &self.route, &self.quote, &self.schedule)
        else {
            return Err(BookingError::conflict("Complete the route and schedule steps first"));
        };

        policy.check_pickup_time(schedule.pickup_at, now)?;

        Ok(ConfirmedDraft {
            owner: self.owner.clone(),
            route: route.clone(),
            quote: quote.clone(),
            schedule: schedule.clone(),
            payment_method,
        })
    }
}

fn normalize_place(place: &str) -> String {
    place.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
