//! CLI routing and command dispatch.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod info;
pub mod registry;

#[derive(Parser, Debug)]
#[command(
    name = "hostlink",
    version,
    about = "Host registration client for hostlink-subscribed systems"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Products(args) => info::run_products(args),
            Commands::Services(args) => info::run_services(args),
            Commands::Repos(args) => info::run_repos(args),
            Commands::BaseProduct(args) => info::run_base_product(args),
            Commands::Architecture => info::run_architecture(),
            Commands::Registry { command } => registry::run(command),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List installed products
    Products(info::FormatArgs),
    /// List repository services
    Services(info::FormatArgs),
    /// List configured repositories
    Repos(info::FormatArgs),
    /// Show the product the system is based on
    BaseProduct(info::FormatArgs),
    /// Show the detected hardware architecture
    Architecture,
    /// Manage container registry credentials
    Registry {
        #[command(subcommand)]
        command: registry::RegistryCommand,
    },
}
