//! Distance based fares.
//!
//! All amounts are integer kobo. Distance is priced per metre against marginal tiers, each tier's
//! charge rounded up, then the subtotal is scaled by the vehicle class and rounded up to the
//! configured step.

use crate::error::BookingError;
use crate::vehicle::VehicleClass;
use wayfare_derive::api_model;
use wayfare_domain::config::PricingConfig;

const METRES_PER_KM: u64 = 1_000;

#[api_model]
/// Price breakdown for one trip
#[derive(Clone, PartialEq)]
pub struct FareQuote {
    pub distance_km: f64,
    pub vehicle_class: VehicleClass,
    pub base_fare_kobo: u64,
    pub distance_charge_kobo: u64,
    /// Vehicle multiplier in percent
    pub multiplier_percent: u32,
    /// Base plus distance charge, scaled by the vehicle multiplier
    pub subtotal_kobo: u64,
    /// Whether the minimum fare replaced the subtotal
    pub minimum_applied: bool,
    /// Amount charged
    pub total_kobo: u64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tier {
    /// Upper bound in metres; `None` for the open-ended last tier.
    up_to_m: Option<u64>,
    rate_per_km: u64,
}

/// Validated fare table.
#[derive(Debug, Clone)]
pub struct FareCalculator {
    currency: String,
    base: u64,
    minimum: u64,
    rounding: u64,
    max_distance_km: u32,
    tiers: Vec<Tier>,
}

impl FareCalculator {
    /// # Errors
    /// Returns [`BookingError::Config`] for an empty tier table, bounds that do not strictly
    /// ascend, a bounded last tier, a zero rate, zero rounding or zero maximum distance.
    pub fn new(config: &PricingConfig) -> Result<Self, BookingError> {
        let invalid = |message: &'static str| BookingError::Config {
            message: message.into(),
            context: Some("pricing".into()),
        };

        if config.currency.trim().is_empty() {
            return Err(invalid("currency must not be empty"));
        }
        if config.rounding_kobo == 0 {
            return Err(invalid("rounding_kobo must be greater than zero"));
        }
        if config.max_distance_km == 0 {
            return Err(invalid("max_distance_km must be greater than zero"));
        }
        let Some((last, bounded)) = config.tiers.split_last() else {
            return Err(invalid("at least one fare tier is required"));
        };
        if last.up_to_km.is_some() {
            return Err(invalid("the last fare tier must be open-ended"));
        }

        let mut tiers = Vec::with_capacity(config.tiers.len());
        let mut previous = 0;
        for tier in bounded {
            let Some(up_to_km) = tier.up_to_km.filter(|km| *km > previous) else {
                return Err(invalid("fare tier bounds must be strictly ascending"));
            };
            previous = up_to_km;
            tiers.push(Tier {
                up_to_m: Some(u64::from(up_to_km) * METRES_PER_KM),
                rate_per_km: tier.rate_per_km_kobo,
            });
        }
        tiers.push(Tier { up_to_m: None, rate_per_km: last.rate_per_km_kobo });

        if tiers.iter().any(|tier| tier.rate_per_km == 0) {
            return Err(invalid("fare tier rates must be greater than zero"));
        }

        Ok(Self {
            currency: config.currency.trim().to_uppercase(),
            base: config.base_fare_kobo,
            minimum: config.minimum_fare_kobo,
            rounding: config.rounding_kobo,
            max_distance_km: config.max_distance_km,
            tiers,
        })
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    #[must_use]
    pub const fn max_distance_km(&self) -> u32 {
        self.max_distance_km
    }

    /// Prices a trip of `distance_km` in `class`.
    ///
    /// # Errors
    /// Returns a validation error unless `0 < distance_km <= max_distance_km`.
    pub fn quote(&self, distance_km: f64, class: VehicleClass) -> Result<FareQuote, BookingError> {
        let metres = self.metres(distance_km)?;
        let distance_charge = self.distance_charge(metres)?;

        let unscaled = u128::from(self.base) + distance_charge;
        let subtotal = div_ceil(unscaled * u128::from(class.multiplier_percent()), 100);
        let minimum_applied = subtotal < u128::from(self.minimum);
        let floored = subtotal.max(u128::from(self.minimum));
        let total = div_ceil(floored, u128::from(self.rounding)) * u128::from(self.rounding);

        Ok(FareQuote {
            distance_km,
            vehicle_class: class,
            base_fare_kobo: self.base,
            distance_charge_kobo: to_kobo(distance_charge)?,
            multiplier_percent: class.multiplier_percent(),
            subtotal_kobo: to_kobo(subtotal)?,
            minimum_applied,
            total_kobo: to_kobo(total)?,
            currency: self.currency.clone(),
        })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn metres(&self, distance_km: f64) -> Result<u64, BookingError> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(BookingError::invalid("distanceKm", "must be a positive number"));
        }
        if distance_km > f64::from(self.max_distance_km) {
            return Err(BookingError::invalid(
                "distanceKm",
                format!("must be at most {} km", self.max_distance_km),
            ));
        }
        // Bounded by max_distance_km above.
        let metres = (distance_km * 1_000.0).round() as u64;
        if metres == 0 {
            return Err(BookingError::invalid("distanceKm", "must be at least one metre"));
        }
        Ok(metres)
    }

    fn distance_charge(&self, metres: u64) -> Result<u128, BookingError> {
        let mut charge = 0_u128;
        let mut lower = 0_u64;

        for tier in &self.tiers {
            let upper = tier.up_to_m.map_or(metres, |bound| bound.min(metres));
            let in_tier = upper.saturating_sub(lower);
            charge += div_ceil(
                u128::from(in_tier) * u128::from(tier.rate_per_km),
                u128::from(METRES_PER_KM),
            );
            if upper >= metres {
                return Ok(charge);
            }
            lower = upper;
        }

        Err(BookingError::Internal {
            message: "fare tiers do not cover the distance".into(),
            context: Some(format!("{metres} m").into()),
        })
    }
}

const fn div_ceil(value: u128, divisor: u128) -> u128 {
    value.div_ceil(divisor)
}

fn to_kobo(value: u128) -> Result<u64, BookingError> {
    u64::try_from(value).map_err(|_| BookingError::Internal {
        message: "fare exceeds the representable amount".into(),
        context: None,
    })
}
