use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = hostlink::cli::Cli::parse();
    cli.run()
}
