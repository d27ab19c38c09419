use anyhow::Result;
use clap::Parser;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use traffic_light_cv::{DetectionConfig, TrafficLightDetector};

mod cli;
mod runner;
mod source;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = cli::Args::parse();

    let config = match &args.config {
        Some(path) => DetectionConfig::from_json_file(path)?,
        None => DetectionConfig::default(),
    };

    if args.print_config {
        println!("{}", config.to_json_string()?);
        return Ok(());
    }

    let detector = TrafficLightDetector::new(config)?;

    let mode = match args.mode {
        Some(mode) => mode,
        None => cli::prompt_mode(&mut io::stdin().lock(), &mut io::stdout())?,
    };
    log::info!("mode: {:?}", mode);

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    })?;

    runner::run(&detector, mode, stop)
}
