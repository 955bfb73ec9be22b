use clap::Parser;
use std::fs::File;
use std::path::Path;

use skyburst::app::{self, RunOptions};
use skyburst::cli::Args;
use skyburst::{AppConfig, Result};

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    // Raw-mode drawing owns the terminal, so stay quiet unless asked
    let default_filter = if log_file.is_some() { "info" } else { "off" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if let Some(path) = log_file {
        let file = File::create(path)?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if let Some(fps) = args.fps {
        config.display.fps = fps;
        config.validate()?;
    }

    log::info!("skyburst starting ({} cues)", config.captions.cues.len());
    app::run(
        &config,
        &RunOptions {
            muted: args.muted,
            seed: args.seed,
        },
    )
}
