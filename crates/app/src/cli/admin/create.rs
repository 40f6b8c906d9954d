use std::time::Duration;

use clap::Args;
use trusioo_app::{
    auth::{PgAuthService, PrincipalKind, TokenCodec, TokenSettings},
    database::{self, Db},
    verification::{PgVerificationService, VerificationSettings},
};
use zeroize::Zeroizing;

#[derive(Debug, Args)]
pub(crate) struct CreateAdminArgs {
    /// Login email
    #[arg(long)]
    email: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Initial password, at least 6 characters
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: String,

    #[arg(long, default_value = "admin")]
    role: String,

    /// Grant super admin rights
    #[arg(long = "super")]
    is_super: bool,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    #[arg(long, env = "JWT_REFRESH_SECRET", hide_env_values = true)]
    jwt_refresh_secret: String,
}

pub(crate) async fn run(args: CreateAdminArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let db = Db::new(pool);

    let tokens = TokenCodec::new(&TokenSettings {
        access_secret: Zeroizing::new(args.jwt_secret),
        refresh_secret: Zeroizing::new(args.jwt_refresh_secret),
        access_ttl: Duration::from_secs(7200),
        refresh_ttl: Duration::from_secs(604_800),
    })
    .map_err(|error| format!("invalid JWT settings: {error}"))?;

    let service = PgAuthService::new(
        db.clone(),
        PrincipalKind::Admin,
        PgVerificationService::new(db, VerificationSettings::default()),
        tokens,
    );

    let admin = service
        .provision(&args.name, &args.email, &args.password, &args.role, args.is_super)
        .await
        .map_err(|error| format!("failed to create admin: {error}"))?;

    println!("admin_id: {}", admin.id);
    println!("admin_email: {}", admin.email);
    println!("admin_role: {}", admin.role);
    println!("super: {}", admin.is_super);

    Ok(())
}
