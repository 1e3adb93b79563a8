//! Read-only listings of package-manager and host metadata.

use crate::core::{architecture, zypper};
use crate::util::exec::SystemCommandRunner;
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl FormatArgs {
    fn want_json(&self) -> Result<bool> {
        match self.format.as_str() {
            "json" => Ok(true),
            "table" => Ok(false),
            other => bail!("invalid format: {} (use table|json)", other),
        }
    }
}

pub fn run_products(args: FormatArgs) -> Result<()> {
    let products = zypper::installed_products(&SystemCommandRunner)?;

    if args.want_json()? {
        let json = serde_json::to_string_pretty(&products).context("serialize products")?;
        println!("{}", json);
        return Ok(());
    }

    if products.is_empty() {
        println!("No installed products found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Product").add_attribute(Attribute::Bold),
        Cell::new("Version").add_attribute(Attribute::Bold),
        Cell::new("Arch").add_attribute(Attribute::Bold),
        Cell::new("Base").add_attribute(Attribute::Bold),
        Cell::new("Summary").add_attribute(Attribute::Bold),
    ]);
    for product in products {
        table.add_row(vec![
            product.name,
            product.version,
            product.arch,
            if product.is_base { "yes".into() } else { "-".to_string() },
            product.summary,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_services(args: FormatArgs) -> Result<()> {
    let services = zypper::installed_services(&SystemCommandRunner)?;

    if args.want_json()? {
        let json = serde_json::to_string_pretty(&services).context("serialize services")?;
        println!("{}", json);
        return Ok(());
    }

    if services.is_empty() {
        println!("No repository services found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Service").add_attribute(Attribute::Bold),
        Cell::new("Enabled").add_attribute(Attribute::Bold),
        Cell::new("URL").add_attribute(Attribute::Bold),
    ]);
    for service in services {
        table.add_row(vec![
            service.name,
            if service.enabled { "yes".into() } else { "no".to_string() },
            service.url,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_repos(args: FormatArgs) -> Result<()> {
    let repos = zypper::repositories(&SystemCommandRunner)?;

    if args.want_json()? {
        let json = serde_json::to_string_pretty(&repos).context("serialize repositories")?;
        println!("{}", json);
        return Ok(());
    }

    if repos.is_empty() {
        println!("No repositories found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Alias").add_attribute(Attribute::Bold),
        Cell::new("Priority").add_attribute(Attribute::Bold),
        Cell::new("Enabled").add_attribute(Attribute::Bold),
        Cell::new("URL").add_attribute(Attribute::Bold),
    ]);
    for repo in repos {
        table.add_row(vec![
            repo.alias,
            repo.priority.to_string(),
            if repo.enabled { "yes".into() } else { "no".to_string() },
            repo.url,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn run_base_product(args: FormatArgs) -> Result<()> {
    let base = zypper::base_product(&SystemCommandRunner)?;

    if args.want_json()? {
        let json = serde_json::to_string_pretty(&base).context("serialize base product")?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}", base.triplet());
    Ok(())
}

pub fn run_architecture() -> Result<()> {
    let arch = architecture::detect_architecture(&SystemCommandRunner)?;
    println!("{}", arch);
    Ok(())
}
