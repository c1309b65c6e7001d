use crate::errors::PngError;
use crate::Credentials;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use url::Url;

/// A fully buffered response. Any http status counts as a response, only
/// transport failures are errors.
#[derive(Debug)]
pub struct FetchResult<B = Bytes> {
    /// Url the request ended up at after following redirects
    pub final_url: Url,
    pub status: StatusCode,
    pub body: B,
}

/// Creates the output directory along with any missing parents. An already
/// existing directory is fine.
#[tracing::instrument]
pub async fn prepare_output_dir(dest_dir: &Path) -> Result<(), PngError> {
    if let Err(e) = fs::create_dir_all(dest_dir).await {
        tracing::error!("Failed to create destination directory\nError : {}", e);
        return Err(PngError::ErrorCreatingDestinationDirectory(e.to_string()));
    }
    Ok(())
}

/// The client shared by the page request and every image request. Redirects
/// are followed with reqwest's default policy.
pub fn build_client(timeout: Option<Duration>) -> Result<Client, PngError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| PngError::ClientBuild(e.to_string()))
}

async fn send(
    client: &Client,
    url: &Url,
    credentials: Option<&Credentials>,
) -> Result<Response, PngError> {
    let mut request = client.get(url.clone());
    if let Some(credentials) = credentials {
        request = request.basic_auth(&credentials.username, Some(&credentials.password));
    }

    let response = match request.send().await {
        Err(e) => {
            tracing::error!("Error fetching {}", url);
            tracing::error!("{}", e);
            return Err(PngError::NetworkError(e.to_string()));
        }
        Ok(r) => r,
    };

    if response.url() != url {
        tracing::debug!("{} redirected to {}", url, response.url());
    }
    Ok(response)
}

fn body_error(url: &Url, e: reqwest::Error) -> PngError {
    tracing::error!("Error reading response body from {}", url);
    tracing::error!("{}", e);
    PngError::NetworkError(e.to_string())
}

/// Issues one GET request, with basic auth when credentials are given, and
/// buffers the whole body as bytes.
#[tracing::instrument(skip(client, url, credentials), fields(url = %url))]
pub async fn fetch(
    client: &Client,
    url: &Url,
    credentials: Option<&Credentials>,
) -> Result<FetchResult, PngError> {
    let response = send(client, url, credentials).await?;
    let final_url = response.url().clone();
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| body_error(&final_url, e))?;

    Ok(FetchResult {
        final_url,
        status,
        body,
    })
}

/// Same as [`fetch`] but decodes the body as text, using the charset of the
/// `Content-Type` header and falling back to utf-8.
#[tracing::instrument(skip(client, url, credentials), fields(url = %url))]
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    credentials: Option<&Credentials>,
) -> Result<FetchResult<String>, PngError> {
    let response = send(client, url, credentials).await?;
    let final_url = response.url().clone();
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| body_error(&final_url, e))?;

    Ok(FetchResult {
        final_url,
        status,
        body,
    })
}

/// Matches on the whole final url, query string included.
pub fn has_png_extension(url: &Url) -> bool {
    url.as_str().to_ascii_lowercase().ends_with(".png")
}

/// Writes `content` to `file_path`, replacing whatever was there.
#[tracing::instrument(skip(content))]
pub async fn write_image(file_path: &Path, content: &[u8]) -> Result<(), PngError> {
    let file_error = |e: std::io::Error| PngError::FileOperationError {
        file_name: file_path.to_string_lossy().to_string(),
        message: format!("{} | {}", e, e.kind()),
    };

    let mut dest_file = match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(file_path)
        .await
    {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Error opening/creating file {}", file_path.display());
            tracing::error!("{} | {}", e, e.kind());
            return Err(file_error(e));
        }
    };

    if let Err(e) = dest_file.write_all(content).await {
        tracing::error!("Error writing to file : {}\nError : {}", file_path.display(), e);
        return Err(file_error(e));
    }
    dest_file.flush().await.map_err(file_error)?;

    tracing::debug!("Wrote {} bytes to {}", content.len(), file_path.display());
    Ok(())
}
