//! Container registry credential commands.

use crate::core::registry_auth;
use crate::util::system::RealSystem;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dialoguer::Password;
use std::io::Read;
use zeroize::Zeroizing;

#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// Install the issued registry credential into the container engine stores
    Setup(CredentialArgs),
    /// Retract a previously issued registry credential from the stores
    Remove(CredentialArgs),
}

#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Subscription login the credential was issued for
    pub login: String,

    /// Credential password (prompted when not provided)
    #[arg(long, env = "HOSTLINK_REGISTRY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub from_stdin: bool,
}

pub fn run(command: RegistryCommand) -> Result<()> {
    match command {
        RegistryCommand::Setup(args) => {
            let password = read_password(&args)?;
            registry_auth::setup_registry_authentication(&RealSystem, &args.login, &password);
            println!("Registry authentication set up for {}", args.login);
        }
        RegistryCommand::Remove(args) => {
            let password = read_password(&args)?;
            registry_auth::remove_registry_authentication(&RealSystem, &args.login, &password);
            println!("Registry authentication removed for {}", args.login);
        }
    }
    Ok(())
}

fn read_password(args: &CredentialArgs) -> Result<Zeroizing<String>> {
    if let Some(password) = &args.password {
        return Ok(Zeroizing::new(password.clone()));
    }
    if args.from_stdin {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read password from stdin")?;
        return Ok(Zeroizing::new(buf.trim_end_matches(['\r', '\n']).to_string()));
    }
    Ok(Zeroizing::new(
        Password::new()
            .with_prompt(format!("Registry password for {}", args.login))
            .allow_empty_password(false)
            .interact()
            .context("read password from prompt")?,
    ))
}
