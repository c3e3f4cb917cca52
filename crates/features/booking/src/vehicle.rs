use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wayfare_derive::api_model;

/// Vehicle classes the company operates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    Sedan,
    Suv,
    Minivan,
    Bus,
}

impl VehicleClass {
    pub const ALL: [Self; 4] = [Self::Sedan, Self::Suv, Self::Minivan, Self::Bus];

    /// Passenger seats, driver excluded.
    #[must_use]
    pub const fn capacity(self) -> u8 {
        match self {
            Self::Sedan => 4,
            Self::Suv => 6,
            Self::Minivan => 7,
            Self::Bus => 14,
        }
    }

    /// Fare multiplier in percent.
    #[must_use]
    pub const fn multiplier_percent(self) -> u32 {
        match self {
            Self::Sedan => 100,
            Self::Suv => 150,
            Self::Minivan => 180,
            Self::Bus => 300,
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sedan => "Sedan",
            Self::Suv => "SUV",
            Self::Minivan => "Minivan",
            Self::Bus => "Bus",
        }
    }
}

#[api_model]
/// A vehicle class as shown in the catalogue and the route step
pub struct VehicleView {
    pub class: VehicleClass,
    pub name: String,
    pub capacity: u8,
    /// Fare multiplier in percent (`150` = ×1.5)
    pub multiplier_percent: u32,
}

impl From<VehicleClass> for VehicleView {
    fn from(class: VehicleClass) -> Self {
        Self {
            class,
            name: class.display_name().to_owned(),
            capacity: class.capacity(),
            multiplier_percent: class.multiplier_percent(),
        }
    }
}
