//! App Context

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::{
    auth::{
        AuthService, IpInfoClient, IpInfoConfig, IpLookup, IpLookupError, PgAuthService,
        PrincipalKind, TokenCodec, TokenError, TokenSettings,
    },
    card_detection::{CardDetectionApi, CardDetectionClient, CardDetectionConfig, CardDetectionError},
    database::{self, Db, PoolSettings},
    detections::{DetectionsService, PgDetectionsService},
    users::{PgUsersService, UsersService},
    verification::{PgVerificationService, VerificationService, VerificationSettings},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),

    #[error("invalid token settings")]
    Tokens(#[source] TokenError),

    #[error("failed to build card detection client")]
    CardDetection(#[source] CardDetectionError),

    #[error("failed to build ip lookup client")]
    IpLookup(#[source] IpLookupError),
}

/// Everything the services need, resolved once at start-up.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub pool: PoolSettings,
    pub tokens: TokenSettings,
    pub verification: VerificationSettings,
    /// `None` disables the card detection endpoints.
    pub card_detection: Option<CardDetectionConfig>,
    /// `None` leaves login sessions without location details.
    pub ipinfo: Option<IpInfoConfig>,
}

#[derive(Clone)]
pub struct AppContext {
    pub user_auth: Arc<dyn AuthService>,
    pub admin_auth: Arc<dyn AuthService>,
    pub verification: Arc<dyn VerificationService>,
    pub detections: Arc<dyn DetectionsService>,
    pub users: Arc<dyn UsersService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails or a collaborator
    /// cannot be configured.
    pub async fn from_database_url(url: &str, settings: AppSettings) -> Result<Self, AppInitError> {
        let pool = database::connect_with(url, settings.pool)
            .await
            .map_err(AppInitError::Database)?;

        Self::from_pool(pool, settings)
    }

    /// Build application context over an existing pool.
    ///
    /// # Errors
    ///
    /// Returns an error when the token settings are invalid or an HTTP client cannot be built.
    pub fn from_pool(pool: PgPool, settings: AppSettings) -> Result<Self, AppInitError> {
        let db = Db::new(pool);

        let tokens = TokenCodec::new(&settings.tokens).map_err(AppInitError::Tokens)?;
        let verification = PgVerificationService::new(db.clone(), settings.verification);

        let ip_lookup = settings
            .ipinfo
            .map(IpInfoClient::new)
            .transpose()
            .map_err(AppInitError::IpLookup)?
            .map(|client| Arc::new(client) as Arc<dyn IpLookup>);

        let auth = |kind| {
            let service =
                PgAuthService::new(db.clone(), kind, verification.clone(), tokens.clone());

            match &ip_lookup {
                Some(lookup) => service.with_ip_lookup(Arc::clone(lookup)),
                None => service,
            }
        };

        let card_detection = settings
            .card_detection
            .map(CardDetectionClient::new)
            .transpose()
            .map_err(AppInitError::CardDetection)?
            .map(|client| Arc::new(client) as Arc<dyn CardDetectionApi>);

        Ok(Self {
            user_auth: Arc::new(auth(PrincipalKind::User)),
            admin_auth: Arc::new(auth(PrincipalKind::Admin)),
            verification: Arc::new(verification.clone()),
            detections: Arc::new(PgDetectionsService::new(db.clone(), card_detection)),
            users: Arc::new(PgUsersService::new(db)),
        })
    }
}
