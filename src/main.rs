use anyhow::Result;
use clap::Parser;
use packline::{app, util};
use std::fs::{self, OpenOptions};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = app::Cli::parse();

    // The data dir decides where the log file lives, so pin it first
    util::init_data_dir(cli.data_dir.clone());

    // Initialize logging to file (~/.packline/logs/packline.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();

    app::run(cli).await
}
