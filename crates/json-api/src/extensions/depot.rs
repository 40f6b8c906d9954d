//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::Depot;
use trusioo_app::auth::Authenticated;

use crate::errors::{ApiError, INTERNAL_ERROR_MESSAGE};

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError>;

    fn insert_principal(&mut self, principal: Authenticated);

    /// The principal resolved by the bearer middleware.
    fn principal_or_401(&self) -> Result<Authenticated, ApiError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, ApiError> {
        self.obtain::<T>().map_err(|_ignored| {
            ApiError::new(
                salvo::http::StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR_MESSAGE,
            )
        })
    }

    fn insert_principal(&mut self, principal: Authenticated) {
        self.inject(principal);
    }

    fn principal_or_401(&self) -> Result<Authenticated, ApiError> {
        self.obtain::<Authenticated>()
            .cloned()
            .map_err(|_ignored| ApiError::unauthorized("Authorization header required"))
    }
}
