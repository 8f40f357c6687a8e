use clap::{Parser, Subcommand};

mod cart;
mod commit;
mod preview;
mod tenants;

#[derive(Debug, Parser)]
#[command(name = "checkout-app", about = "Checkout CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Price a cart and print the preview as JSON
    Preview(preview::PreviewArgs),

    /// Commit a cart against an in-memory store and print the receipt
    Commit(commit::CommitArgs),

    /// List the tenants defined in a fixture file
    Tenants(tenants::TenantsArgs),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Preview(args) => preview::run(args).await,
            Commands::Commit(args) => commit::run(args).await,
            Commands::Tenants(args) => tenants::run(&args),
        }
    }
}
