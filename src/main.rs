use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    bookharvest::logging::init().context("init logging")?;

    let cli = bookharvest::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookharvest::cli::Command::Pages(args) => {
            bookharvest::run::pages(args).context("pages")?;
        }
        bookharvest::cli::Command::Authors(args) => {
            bookharvest::run::authors(args).context("authors")?;
        }
    }

    Ok(())
}
