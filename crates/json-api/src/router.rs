//! API Router

use salvo::{Handler, Router};

use crate::{auth, card_detection, users, verification};

/// Routes under `/api/v1`.
///
/// `credential_limit` guards the routes that accept passwords or codes.
pub(crate) fn api_router(credential_limit: impl Handler) -> Router {
    Router::with_path("api/v1")
        .push(
            Router::new()
                .hoop(credential_limit)
                .push(
                    Router::with_path("auth")
                        .push(Router::with_path("register").post(auth::handlers::register::handler))
                        .push(
                            Router::with_path("login")
                                .post(auth::handlers::login::user)
                                .push(
                                    Router::with_path("verify")
                                        .post(auth::handlers::login_verify::user),
                                ),
                        )
                        .push(Router::with_path("refresh").post(auth::handlers::refresh::user))
                        .push(
                            Router::with_path("forgot-password")
                                .post(auth::handlers::forgot_password::user),
                        )
                        .push(
                            Router::with_path("reset-password")
                                .post(auth::handlers::reset_password::user),
                        ),
                )
                .push(
                    Router::with_path("admin/auth")
                        .push(
                            Router::with_path("login")
                                .post(auth::handlers::login::admin)
                                .push(
                                    Router::with_path("verify")
                                        .post(auth::handlers::login_verify::admin),
                                ),
                        )
                        .push(Router::with_path("refresh").post(auth::handlers::refresh::admin))
                        .push(
                            Router::with_path("forgot-password")
                                .post(auth::handlers::forgot_password::admin),
                        )
                        .push(
                            Router::with_path("reset-password")
                                .post(auth::handlers::reset_password::admin),
                        ),
                )
                .push(
                    Router::with_path("verification")
                        .push(Router::with_path("send").post(verification::handlers::send::handler))
                        .push(
                            Router::with_path("verify")
                                .post(verification::handlers::verify::handler),
                        ),
                ),
        )
        .push(
            Router::with_path("auth/profile")
                .hoop(auth::middleware::user)
                .get(auth::handlers::profile::user),
        )
        .push(
            Router::with_path("admin")
                .hoop(auth::middleware::admin)
                .push(Router::with_path("profile").get(auth::handlers::profile::admin))
                .push(
                    Router::with_path("users")
                        .get(users::handlers::index::handler)
                        .push(Router::with_path("stats").get(users::handlers::stats::handler))
                        .push(Router::with_path("{id}").get(users::handlers::get::handler)),
                ),
        )
        .push(
            Router::with_path("card-detection")
                .hoop(auth::middleware::user)
                .push(Router::with_path("check").post(card_detection::handlers::check::handler))
                .push(Router::with_path("result").post(card_detection::handlers::result::handler))
                .push(Router::with_path("history").get(card_detection::handlers::history::handler))
                .push(
                    Router::with_path("records/{id}")
                        .get(card_detection::handlers::record::handler),
                )
                .push(Router::with_path("stats").get(card_detection::handlers::stats::handler))
                .push(Router::with_path("summary").get(card_detection::handlers::summary::handler))
                .push(
                    Router::with_path("cd_products")
                        .get(card_detection::handlers::products::handler),
                )
                .push(
                    Router::with_path("cd_regions").get(card_detection::handlers::regions::handler),
                )
                .push(Router::with_path("status").get(card_detection::handlers::status::handler)),
        )
}
