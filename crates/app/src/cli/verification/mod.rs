use clap::{Args, Subcommand};

mod sweep;

#[derive(Debug, Args)]
pub(crate) struct VerificationCommand {
    #[command(subcommand)]
    command: VerificationSubcommand,
}

#[derive(Debug, Subcommand)]
enum VerificationSubcommand {
    /// Delete expired verification codes
    Sweep(sweep::SweepArgs),
}

pub(crate) async fn run(command: VerificationCommand) -> Result<(), String> {
    match command.command {
        VerificationSubcommand::Sweep(args) => sweep::run(args).await,
    }
}
