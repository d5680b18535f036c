mod api;
mod cli;
mod config;
mod export;
mod plan_tools;

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::process::ExitCode;

use cli::{Cli, Commands};
use cli::commands::export::handle_export_command;
use cli::commands::plan::{handle_seed_command, handle_split_command};
use config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .format_timestamp(None)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load()?;

    match cli.command {
        Commands::Export(args) => handle_export_command(args, &settings).await,
        Commands::Split(args) => handle_split_command(args, &settings),
        Commands::Seed(args) => handle_seed_command(args, &settings),
    }
}
