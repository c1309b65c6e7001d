use clap::Parser;
use libpngrab::{init_download, Credentials, ImageOutcome, InvocationConfig, PngError, Update};
use owo_colors::{OwoColorize, Stream};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::mpsc::channel;
use url::Url;

const MAX_BUFFER_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Downloads .png images from URL",
    long_about = "Downloads every image of a web page whose final URL ends in .png \
    into a directory, as image-0.png, image-1.png, ..."
)]
pub struct Cli {
    #[arg(short = 'u', long = "url", help = "URL as source of images")]
    url: Url,
    #[arg(
        short = 'o',
        long = "output_dir",
        visible_alias = "output-dir",
        help = "Output directory for downloaded images"
    )]
    output_dir: PathBuf,
    #[arg(short = 'n', long, requires = "password", help = "Username for BasicAuth")]
    username: Option<String>,
    #[arg(short = 'p', long, requires = "username", help = "Password for BasicAuth")]
    password: Option<String>,
    #[arg(
        short = 't',
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Timeout in seconds for each request. Waits forever when not set."
    )]
    timeout: Option<u64>,
    #[arg(long, default_value = ".", help = "Directory the log file is written to.")]
    pub log_dir: PathBuf,
}

impl Cli {
    pub fn into_config(self) -> InvocationConfig {
        InvocationConfig {
            source_url: self.url,
            output_dir: self.output_dir,
            credentials: Credentials::from_parts(self.username, self.password),
            timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

pub async fn download(cli: Cli) -> ExitCode {
    ExitCode::from(run(cli).await)
}

/// Prints the run as it goes and returns the exit status: 1 when the output
/// directory can't be created, 0 for everything else that finishes.
async fn run(cli: Cli) -> u8 {
    let config = cli.into_config();
    tracing::info!("Downloading images from {}", config.source_url);
    let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
    let task = tokio::spawn(async move { init_download(&config, tx).await });

    while let Some(update) = rx.recv().await {
        print_update(&update);
    }

    match task.await {
        Ok(Ok(tally)) => {
            tracing::info!("{} of {} images saved", tally.saved, tally.found);
            0
        }
        Ok(Err(e)) => {
            print_error(&e);
            u8::from(e.is_fatal())
        }
        Err(e) => {
            tracing::error!("Download task panicked\nError : {}", e);
            println!("Download wasn't able to complete");
            1
        }
    }
}

fn print_update(update: &Update) {
    match update {
        Update::Image(ImageOutcome::Saved { .. }) => {
            println!(
                "{}",
                update.if_supports_color(Stream::Stdout, |text| text.green())
            )
        }
        _ if update.is_error() => {
            println!(
                "{}",
                update.if_supports_color(Stream::Stdout, |text| text.red())
            )
        }
        _ => println!("{update}"),
    }
}

fn print_error(e: &PngError) {
    println!("{}", e.if_supports_color(Stream::Stdout, |text| text.red()));
}
