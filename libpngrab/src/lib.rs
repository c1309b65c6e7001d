use crate::download::{build_client, fetch, fetch_page, has_png_extension, write_image};
use crate::link::resolve_request_url;
use reqwest::Client;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::Sender;
use tracing::instrument;
use url::Url;

pub use crate::download::{prepare_output_dir, FetchResult};
pub use crate::errors::PngError;
pub use crate::link::{get_image_tags, ImageSource, ImageTag, SOURCE_ATTRIBUTES};
pub use crate::session::{ImageOutcome, Tally};

mod download;
mod errors;
mod link;
mod session;

/// Basic auth pair, attached to the page request and to every image request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Auth is only used when both parts are given and neither is empty.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Self { username, password })
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct InvocationConfig {
    pub source_url: Url,
    pub output_dir: PathBuf,
    pub credentials: Option<Credentials>,
    /// Per request timeout. `None` waits forever.
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Image(ImageOutcome),
    NoImagesFound,
    Finished(Tally),
}

impl std::fmt::Display for Update {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Image(ImageOutcome::NoSource) => write!(f, "No image source URL found!"),
            Update::Image(ImageOutcome::FetchFailed { url, reason }) => write!(
                f,
                "Response to URL: {url} failed! Image skipped. Error: {reason}"
            ),
            Update::Image(ImageOutcome::WrongExtension { url }) => write!(
                f,
                "Image with URL: {url} was NOT downloaded! Only .png extension is allowed!"
            ),
            Update::Image(ImageOutcome::WriteFailed { reason }) => {
                write!(f, "Image saving failed! Error: {reason}")
            }
            Update::Image(ImageOutcome::Saved { url, path }) => write!(
                f,
                "Image with URL: {url} was downloaded as {}",
                path.display()
            ),
            Update::NoImagesFound => write!(f, "No images found!"),
            Update::Finished(tally) => write!(
                f,
                "Total {} Images Downloaded Out of {} found!",
                tally.saved, tally.found
            ),
        }
    }
}

impl Update {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Update::Image(ImageOutcome::FetchFailed { .. })
                | Update::Image(ImageOutcome::WriteFailed { .. })
        )
    }
}

/// Runs the whole pipeline: output directory, page request, image tags and
/// finally the images themselves. Progress is reported through `update_tx`.
///
/// Only a failure to create the output directory is fatal
/// (see [`PngError::is_fatal`]). A failed page request ends the run early
/// with [`PngError::PageFetchFailed`]; image failures never end it.
#[instrument(skip(update_tx))]
pub async fn init_download(
    config: &InvocationConfig,
    update_tx: Sender<Update>,
) -> Result<Tally, PngError> {
    prepare_output_dir(&config.output_dir).await?;

    let client = build_client(config.timeout)?;

    let page = fetch_page(&client, &config.source_url, config.credentials.as_ref())
        .await
        .map_err(|e| PngError::PageFetchFailed {
            url: config.source_url.to_string(),
            message: e.to_string(),
        })?;
    if !page.status.is_success() {
        tracing::warn!(
            "Page {} answered with {}, looking for images anyway",
            page.final_url,
            page.status
        );
    }

    let image_tags = get_image_tags(&page.body);

    Ok(download_images(
        &client,
        &image_tags,
        &page.final_url,
        &config.output_dir,
        config.credentials.as_ref(),
        &update_tx,
    )
    .await)
}

/// Downloads the images behind `image_tags` one after the other, in document
/// order. Only images whose final url ends in `.png` are kept, and they are
/// numbered by how many were saved before them.
#[instrument(skip_all, fields(page_url = %page_url, tags = image_tags.len()))]
pub async fn download_images(
    client: &Client,
    image_tags: &[ImageTag],
    page_url: &Url,
    output_dir: &Path,
    credentials: Option<&Credentials>,
    update_tx: &Sender<Update>,
) -> Tally {
    let mut tally = Tally::default();

    if image_tags.is_empty() {
        send_update(update_tx, Update::NoImagesFound).await;
        return tally;
    }

    for image_tag in image_tags {
        let file_path = tally.next_file_path(output_dir);
        let outcome = download_image(client, image_tag, page_url, &file_path, credentials).await;
        tally.record(&outcome);
        send_update(update_tx, Update::Image(outcome)).await;
    }

    tracing::debug!("{} of {} images saved", tally.saved, tally.found);
    send_update(update_tx, Update::Finished(tally)).await;
    tally
}

async fn download_image(
    client: &Client,
    image_tag: &ImageTag,
    page_url: &Url,
    file_path: &Path,
    credentials: Option<&Credentials>,
) -> ImageOutcome {
    let source = match image_tag.source() {
        Some(s) => s,
        None => {
            tracing::debug!("Image tag without source : {:?}", image_tag);
            return ImageOutcome::NoSource;
        }
    };

    let fetched = match resolve_request_url(&source, page_url) {
        Ok(request_url) => fetch(client, &request_url, credentials).await,
        Err(e) => Err(e),
    };
    let response = match fetched {
        Ok(r) => r,
        Err(e) => {
            return ImageOutcome::FetchFailed {
                url: source.value,
                reason: e.to_string(),
            }
        }
    };

    if !response.status.is_success() {
        tracing::warn!(
            "{} answered with {} |{}|",
            source.value,
            response.status,
            response.final_url
        );
    }

    if !has_png_extension(&response.final_url) {
        tracing::debug!(
            "Skipping {}, final url {} is not a png",
            source.value,
            response.final_url
        );
        return ImageOutcome::WrongExtension { url: source.value };
    }

    match write_image(file_path, &response.body).await {
        Ok(()) => ImageOutcome::Saved {
            url: source.value,
            path: file_path.to_path_buf(),
        },
        Err(e) => ImageOutcome::WriteFailed {
            reason: e.to_string(),
        },
    }
}

async fn send_update(update_tx: &Sender<Update>, update: Update) {
    if update_tx.send(update).await.is_err() {
        tracing::warn!("Update receiver dropped, progress is no longer reported");
    }
}
