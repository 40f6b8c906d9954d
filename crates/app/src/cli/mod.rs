use clap::{Parser, Subcommand};

mod admin;
mod verification;

#[derive(Debug, Parser)]
#[command(name = "trusioo-app", about = "Trusioo provisioning CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Admin(admin::AdminCommand),
    Verification(verification::VerificationCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Admin(command) => admin::run(command).await,
            Commands::Verification(command) => verification::run(command).await,
        }
    }
}
