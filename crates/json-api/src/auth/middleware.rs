//! Bearer token middleware.
//!
//! `user` and `admin` guard their route groups; each only accepts access tokens of its own
//! principal kind and stores the resolved [`Authenticated`] in the depot.

use std::sync::Arc;

use salvo::{http::header::AUTHORIZATION, prelude::*};
use trusioo_app::auth::{AuthServiceError, Authenticated, PrincipalKind};

use crate::{errors::ApiError, extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn user(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    guard(PrincipalKind::User, req, depot, res, ctrl).await;
}

#[salvo::handler]
pub(crate) async fn admin(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    guard(PrincipalKind::Admin, req, depot, res, ctrl).await;
}

async fn guard(
    kind: PrincipalKind,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    match authenticate(kind, req, depot).await {
        Ok(principal) => {
            depot.insert_principal(principal);

            ctrl.call_next(req, depot, res).await;
        }
        Err(error) => {
            error.write(req, depot, res).await;
            ctrl.skip_rest();
        }
    }
}

async fn authenticate(
    kind: PrincipalKind,
    req: &Request,
    depot: &Depot,
) -> Result<Authenticated, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Authorization header required"))?;

    let token = header
        .to_str()
        .ok()
        .and_then(extract_bearer_token)
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization header format"))?;

    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .auth(kind)
        .authenticate(token)
        .await
        .map_err(|error| match error {
            AuthServiceError::Forbidden => ApiError::forbidden(match kind {
                PrincipalKind::User => "Access denied",
                PrincipalKind::Admin => "Admin access required",
            }),
            AuthServiceError::TokenInvalid
            | AuthServiceError::TokenExpired
            | AuthServiceError::Unauthorized => ApiError::unauthorized("Invalid or expired token"),
            other => other.into(),
        })
}

fn extract_bearer_token(value: &str) -> Option<&str> {
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
