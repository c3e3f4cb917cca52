use fxhash::FxHashMap;
use std::any::TypeId;
use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;
use wayfare_database::Database;
use wayfare_domain::config::ApiConfig;
use wayfare_domain::registry::{FeatureSlice, InitializedSlice};

#[wayfare_derive::wayfare_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
    #[error("State missing feature slice{}: {message}", format_context(.context))]
    MissingSlice { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: ApiConfig,
    pub database: Database,
    slices: FxHashMap<TypeId, InitializedSlice>,
}

/// Shared state of the HTTP server: configuration, database and the initialized feature slices.
///
/// Cloning is cheap; handlers receive it through `State<ApiState>` and look slices up by type.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    #[must_use]
    pub fn get_slice<T: FeatureSlice>(&self) -> Option<&T> {
        self.inner.slices.get(&TypeId::of::<T>()).and_then(InitializedSlice::downcast_ref::<T>)
    }

    /// Looks a slice up for a handler.
    ///
    /// # Errors
    /// [`ApiStateError::MissingSlice`] when the deployment was built without `T`; handlers turn
    /// it into a 500.
    pub fn try_get_slice<T: FeatureSlice>(&self) -> Result<&T, ApiStateError> {
        self.get_slice::<T>().ok_or_else(|| ApiStateError::MissingSlice {
            message: std::any::type_name::<T>().into(),
            context: None,
        })
    }

    /// Short names of the registered slices, sorted.
    #[must_use]
    pub fn slice_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> =
            self.inner.slices.values().map(InitializedSlice::short_name).collect();
        names.sort_unstable();
        names
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    database: Option<Database>,
    slices: FxHashMap<TypeId, InitializedSlice>,
    duplicates: Vec<&'static str>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn db(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    /// Adds a slice. Registering the same slice type twice fails at [`build`](Self::build).
    #[must_use]
    pub fn register_slice(mut self, slice: InitializedSlice) -> Self {
        tracing::debug!(slice = slice.short_name(), "Registering feature slice");
        if let Some(previous) = self.slices.insert(slice.id, slice) {
            self.duplicates.push(previous.name);
        }
        self
    }

    pub fn build(self) -> Result<ApiState, ApiStateError> {
        if !self.duplicates.is_empty() {
            return Err(ApiStateError::Validation {
                message: format!("Slices registered twice: {}", self.duplicates.join(", ")).into(),
                context: None,
            });
        }
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let database = self.database.ok_or_else(|| ApiStateError::Validation {
            message: "Database not provided".into(),
            context: None,
        })?;

        Ok(ApiState { inner: Arc::new(ApiStateInner { config, database, slices: self.slices }) })
    }
}
