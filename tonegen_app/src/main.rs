use std::process::ExitCode;

use clap::Parser;
use log::error;

mod cli;
mod control_surface;
mod driver;
mod keyboard;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.resolve_config().and_then(driver::run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
