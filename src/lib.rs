pub mod check;
pub mod cli;
pub mod columns;
pub mod data;
pub mod export;
pub mod io_utils;
pub mod mapping;
pub mod pipeline;
pub mod preview;
pub mod resolver;
pub mod sequence;
pub mod similarity;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_resolve", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve(args) => export::execute(&args),
        Commands::Preview(args) => preview::execute(&args),
        Commands::Check(args) => check::execute(&args),
    }
}
