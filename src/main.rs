use rideq::runner;
use rideq::service::{DispatchService, DuplicatePolicy};
use rideq::sink::FileSink;

use anyhow::Context;
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{info, subscriber, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Deserialize, Debug)]
struct Config {
    input: Option<String>,
    #[serde(default = "default_output")]
    output: String,
    #[serde(default)]
    on_duplicate: DuplicatePolicy,
    log: Option<String>,
}

fn default_output() -> String {
    "output_file.txt".to_owned()
}

fn log_level(raw: Option<&str>) -> anyhow::Result<Level> {
    match raw {
        None => Ok(Level::INFO),
        Some(raw) => raw
            .parse::<Level>()
            .with_context(|| format!("invalid RIDEQ_LOG level `{}`", raw)),
    }
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let config = envy::prefixed("RIDEQ_")
        .from_env::<Config>()
        .context("invalid RIDEQ_ configuration")?;

    let level = log_level(config.log.as_deref())?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    subscriber::set_global_default(subscriber)?;

    let Some(input) = std::env::args().nth(1).or(config.input) else {
        eprintln!("usage: rideq <command_log>");
        anyhow::bail!("no command log given");
    };

    let log = File::open(&input)
        .await
        .with_context(|| format!("couldn't open command log {}", input))?;
    let mut sink = FileSink::create(&config.output)
        .await
        .with_context(|| format!("couldn't create {}", config.output))?;
    let mut service = DispatchService::new(config.on_duplicate);

    let summary = runner::run(BufReader::new(log), &mut sink, &mut service, signal::ctrl_c()).await?;
    info!(output = %config.output, ?summary, "done");

    Ok(())
}
