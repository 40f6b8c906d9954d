//! Test helpers.

use std::sync::Arc;

use salvo::{affix_state::inject, prelude::*};
use trusioo_app::{
    auth::{Authenticated, MockAuthService, PrincipalKind},
    context::AppContext,
    detections::MockDetectionsService,
    users::MockUsersService,
    verification::MockVerificationService,
};

use crate::{extensions::*, state::State};

pub(crate) const TEST_USER_ID: i64 = 7;
pub(crate) const TEST_ADMIN_ID: i64 = 3;

/// Service mocks wired into [`State`]. Mocks without expectations reject every call.
#[derive(Default)]
pub(crate) struct Mocks {
    pub user_auth: MockAuthService,
    pub admin_auth: MockAuthService,
    pub verification: MockVerificationService,
    pub detections: MockDetectionsService,
    pub users: MockUsersService,
}

impl Mocks {
    pub(crate) fn into_state(self) -> Arc<State> {
        State::from_app_context(AppContext {
            user_auth: Arc::new(self.user_auth),
            admin_auth: Arc::new(self.admin_auth),
            verification: Arc::new(self.verification),
            detections: Arc::new(self.detections),
            users: Arc::new(self.users),
        })
    }
}

pub(crate) fn authenticated(kind: PrincipalKind) -> Authenticated {
    match kind {
        PrincipalKind::User => Authenticated {
            id: TEST_USER_ID,
            email: "user@example.com".to_string(),
            role: "user".to_string(),
            kind,
        },
        PrincipalKind::Admin => Authenticated {
            id: TEST_ADMIN_ID,
            email: "admin@example.com".to_string(),
            role: "admin".to_string(),
            kind,
        },
    }
}

#[salvo::handler]
pub(crate) async fn inject_user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(authenticated(PrincipalKind::User));
    ctrl.call_next(req, depot, res).await;
}

#[salvo::handler]
pub(crate) async fn inject_admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    depot.insert_principal(authenticated(PrincipalKind::Admin));
    ctrl.call_next(req, depot, res).await;
}

/// Anonymous routes.
pub(crate) fn public_service(mocks: Mocks, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(mocks.into_state())).push(route))
}

/// Routes behind the user bearer middleware, already authenticated.
pub(crate) fn user_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_user)
            .push(route),
    )
}

/// Routes behind the admin bearer middleware, already authenticated.
pub(crate) fn admin_service(mocks: Mocks, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(mocks.into_state()))
            .hoop(inject_admin)
            .push(route),
    )
}
