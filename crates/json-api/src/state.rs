//! State

use std::sync::Arc;

use trusioo_app::{
    auth::{AuthService, PrincipalKind},
    context::AppContext,
};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext) -> Self {
        Self { app }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext) -> Arc<Self> {
        Arc::new(Self::new(app))
    }

    /// Authentication service of the given principal kind.
    pub(crate) fn auth(&self, kind: PrincipalKind) -> &Arc<dyn AuthService> {
        match kind {
            PrincipalKind::User => &self.app.user_auth,
            PrincipalKind::Admin => &self.app.admin_auth,
        }
    }
}
