use crate::cli::download;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;

const LOG_FILE_NAME: &str = "pngrab.log";
const DEFAULT_LOG_FILTER: &str = "libpngrab=debug,pngrab=debug";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    let f_appender = tracing_appender::rolling::hourly(&cli.log_dir, LOG_FILE_NAME);
    let (non_blk, _guard) = tracing_appender::non_blocking(f_appender);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .event_format(tracing_subscriber::fmt::format().pretty())
        .with_ansi(false)
        .with_writer(non_blk)
        .init();
    download(cli).await
}
