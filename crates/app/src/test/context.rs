//! Test context for service-level integration tests.

use std::{sync::Arc, time::Duration};

use zeroize::Zeroizing;

use crate::{
    auth::{PgAuthService, PrincipalKind, TokenCodec, TokenSettings},
    card_detection::CardDetectionApi,
    database::Db,
    detections::PgDetectionsService,
    users::PgUsersService,
    verification::{PgVerificationService, VerificationSettings},
};

use super::db::TestDb;

pub struct TestContext {
    pub db: TestDb,
}

impl TestContext {
    pub async fn new() -> Self {
        Self {
            db: TestDb::new().await,
        }
    }

    pub fn shared(&self) -> Db {
        Db::new(self.db.pool().clone())
    }

    /// Token settings shared by every authentication test.
    pub fn token_settings() -> TokenSettings {
        TokenSettings {
            access_secret: Zeroizing::new("access-secret".to_string()),
            refresh_secret: Zeroizing::new("refresh-secret".to_string()),
            access_ttl: Duration::from_secs(7200),
            refresh_ttl: Duration::from_secs(604_800),
        }
    }

    pub fn verification_with(&self, settings: VerificationSettings) -> PgVerificationService {
        PgVerificationService::new(self.shared(), settings)
    }

    /// Authentication for `kind` with the issuance cool-down disabled.
    pub fn auth(&self, kind: PrincipalKind) -> PgAuthService {
        let verification = self.verification_with(VerificationSettings {
            send_cooldown: Duration::ZERO,
            ..VerificationSettings::default()
        });

        let tokens = TokenCodec::new(&Self::token_settings()).expect("Invalid token settings");

        PgAuthService::new(self.shared(), kind, verification, tokens)
    }

    pub fn detections(&self, client: Option<Arc<dyn CardDetectionApi>>) -> PgDetectionsService {
        PgDetectionsService::new(self.shared(), client)
    }

    pub fn users(&self) -> PgUsersService {
        PgUsersService::new(self.shared())
    }
}
