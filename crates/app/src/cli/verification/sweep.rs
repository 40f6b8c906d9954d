use clap::Args;
use trusioo_app::{
    database::{self, Db},
    verification::{PgVerificationService, VerificationService, VerificationSettings},
};

#[derive(Debug, Args)]
pub(crate) struct SweepArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: SweepArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let deleted = PgVerificationService::new(Db::new(pool), VerificationSettings::default())
        .sweep()
        .await
        .map_err(|error| format!("failed to sweep verification codes: {error}"))?;

    println!("deleted: {deleted}");

    Ok(())
}
