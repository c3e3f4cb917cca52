pub mod error;
mod health;
pub mod router;
pub mod state;

pub use error::{ApiError, ErrorBody};
pub use health::HealthResponse;
pub use state::{ApiState, ApiStateBuilder, ApiStateError};
