use anyhow::{Context, Result};

use kinetic_sculpture::config::USAGE;
use kinetic_sculpture::{app, CliOptions};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse().context(USAGE)?;
    app::run(options)
}
