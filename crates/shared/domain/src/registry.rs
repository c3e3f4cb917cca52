//! Registry of initialized feature slices.
//! The API state stores slices type-erased and hands them back by concrete type.

use std::any::{Any, TypeId, type_name};
use std::fmt::Debug;

/// Feature state that can live in the shared API state.
pub trait FeatureSlice: Any + Debug + Send + Sync {
    /// Downcasting hook for the registry.
    fn as_any(&self) -> &dyn Any;
}

/// A feature slice ready to be registered, keyed by its concrete type.
#[derive(Debug)]
pub struct InitializedSlice {
    pub id: TypeId,
    /// Type name, for logs and registry errors.
    pub name: &'static str,
    pub state: Box<dyn FeatureSlice>,
}

impl InitializedSlice {
    pub fn new<T: FeatureSlice>(state: T) -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>(), state: Box::new(state) }
    }

    /// Returns the slice state if it is of type `T`.
    #[must_use]
    pub fn downcast_ref<T: FeatureSlice>(&self) -> Option<&T> {
        self.state.as_any().downcast_ref::<T>()
    }

    /// Short name of the slice type (`Booking` for `wayfare_booking::Booking`).
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Fares;

    impl FeatureSlice for Fares {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn slices_round_trip_through_the_registry_entry() {
        let slice = InitializedSlice::new(Fares);
        assert_eq!(slice.id, TypeId::of::<Fares>());
        assert_eq!(slice.short_name(), "Fares");
        assert!(slice.downcast_ref::<Fares>().is_some());
    }
}
