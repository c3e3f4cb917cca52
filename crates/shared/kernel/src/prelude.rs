//! Items almost every slice handler needs.

pub use crate::safe_nanoid;
pub use crate::security::resource::ResourceGuard;
pub use crate::server::error::ApiError;
pub use crate::server::state::ApiState;
pub use crate::validation::ValidationError;
pub use wayfare_domain::config::ApiConfig;
pub use wayfare_domain::constants::*;
