mod app;
mod cli;
pub mod config;
pub mod downloader;
mod interrupt;
mod menu;
mod output;

use std::io::{stdin, IsTerminal};
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use app::App;
use cli::{Args, Commands};
use config::Config;
use downloader::{ChainMode, Result};

fn init_tracing(args: &Args) {
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: Args) -> Result<ExitCode> {
    let mut config = Config::discover(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    debug!(?config, "Configuration loaded");

    let runtime = tokio::runtime::Runtime::new()?;
    let mut app = App::new(config)?;
    runtime.spawn(app.interrupts().clone().watch());

    let command = args.command.unwrap_or(Commands::Menu);
    if command.needs_tool() {
        runtime.block_on(app.check())?;
    }

    match command {
        Commands::Get { url } => {
            let success = runtime.block_on(app.download(&url, ChainMode::Standard))?;
            output::print_success(&success);
        }
        Commands::Facebook { url } => {
            let success = runtime.block_on(app.download_facebook(&url))?;
            output::print_success(&success);
        }
        Commands::Batch { file, save_failed } => {
            let list = app.load_batch(&file)?;
            output::print_skipped(&list);
            let report = runtime.block_on(app.batch(&list))?;
            output::print_report(&report);

            if !report.failed.is_empty()
                && (save_failed
                    || (stdin().is_terminal()
                        && menu::confirm("save", "Save the list of failed URLs?", true)?))
            {
                let path = app.save_failed(&report)?;
                println!("Failed URLs saved to {}", path.display());
            }
            if !report.failed.is_empty() || report.interrupted {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Info { url } => {
            let info = runtime.block_on(app.info(&url))?;
            output::print_info(&info);
        }
        Commands::Update => {
            runtime.block_on(app.update())?;
            println!("yt-dlp updated");
        }
        Commands::Check => {
            let info = runtime.block_on(app.check())?;
            output::print_tool(&info);
        }
        Commands::Menu => menu::run_menu(&mut app, &runtime)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Entry point of the `social-downloader` binary
pub fn run() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match execute(args) {
        Ok(code) => code,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
