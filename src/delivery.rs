//! Image download to file or standard output

use std::{
    fmt,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use futures_util::StreamExt as _;
use reqwest::{IntoUrl, StatusCode, Url};

use crate::{cancel::CancelToken, http::ApiHttpClient};

/// Image destination
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Sink {
    /// Write to file, replaced if it exists
    File(PathBuf),
    /// Write to process standard output
    Stdout,
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::File(path) => write!(f, "{}", path.display()),
            Sink::Stdout => write!(f, "stdout"),
        }
    }
}

/// Image delivery error
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Destination file could not be created
    #[error("Unable to write to {path:?}: {source}")]
    SinkUnavailable {
        /// Destination path
        path: PathBuf,
        /// IO error
        #[source]
        source: io::Error,
    },
    /// Writing to the destination failed
    #[error("Failed to write image: {0}")]
    Sink(#[source] io::Error),
    /// Request could not be sent or body could not be fully read
    #[error("Image download failed: {0}")]
    Transport(#[source] reqwest::Error),
    /// Download did not complete in time
    #[error("Image download timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    /// Server answered with a non success status
    #[error("Unexpected HTTP status {status} for image URL {url}")]
    BadStatus {
        /// Image URL
        url: Url,
        /// Response status
        status: StatusCode,
    },
    /// Cancellation was requested before the download completed
    #[error("Image download cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else {
            Self::Transport(err)
        }
    }
}

/// Download image at URL and write it verbatim to sink, return count of bytes written
///
/// A file sink is opened before the request is sent. Bytes go to a temporary file next to the
/// destination, which is moved in place only once the download is complete, so a failed
/// download never leaves a partial file behind.
pub async fn deliver_image<U>(
    http: &ApiHttpClient,
    source_url: U,
    sink: &Sink,
    cancel: &CancelToken,
) -> Result<u64, DeliveryError>
where
    U: IntoUrl,
{
    let written = match sink {
        Sink::File(path) => {
            let tmp_file = temp_file_builder()
                .tempfile_in(parent_dir(path))
                .map_err(|source| DeliveryError::SinkUnavailable {
                    path: path.to_owned(),
                    source,
                })?;
            let mut writer = BufWriter::new(tmp_file);
            let written = download(http, source_url, &mut writer, cancel).await?;
            let tmp_file = writer
                .into_inner()
                .map_err(|err| DeliveryError::Sink(err.into_error()))?;
            tmp_file
                .persist(path)
                .map_err(|err| DeliveryError::SinkUnavailable {
                    path: path.to_owned(),
                    source: err.error,
                })?;
            written
        }
        Sink::Stdout => deliver_to(http, source_url, io::stdout(), cancel).await?,
    };

    #[expect(clippy::cast_precision_loss)]
    let size = human_bytes::human_bytes(written as f64);
    log::info!("Cat saved to {sink} ({size})");
    Ok(written)
}

/// Download image through a buffer flushed once the download is complete
pub(crate) async fn deliver_to<U, W>(
    http: &ApiHttpClient,
    source_url: U,
    writer: W,
    cancel: &CancelToken,
) -> Result<u64, DeliveryError>
where
    U: IntoUrl,
    W: Write,
{
    let mut writer = BufWriter::new(writer);
    let written = download(http, source_url, &mut writer, cancel).await?;
    writer.flush().map_err(DeliveryError::Sink)?;
    Ok(written)
}

/// Temporary file builder, files get the same default permissions as regular new files
fn temp_file_builder() -> tempfile::Builder<'static, 'static> {
    #[cfg_attr(not(unix), expect(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        // Subject to umask, like File::create
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}

/// Directory to create the temporary file in
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}

/// Stream response body to writer, chunk by chunk
async fn download<U, W>(
    http: &ApiHttpClient,
    url: U,
    mut writer: W,
    cancel: &CancelToken,
) -> Result<u64, DeliveryError>
where
    U: IntoUrl,
    W: Write,
{
    let response = cancel
        .run_until_cancelled(http.get_binary(url))
        .await
        .ok_or(DeliveryError::Cancelled)??;

    let status = response.status();
    if !status.is_success() {
        return Err(DeliveryError::BadStatus {
            url: response.url().clone(),
            status,
        });
    }

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    while let Some(chunk) = cancel
        .run_until_cancelled(stream.next())
        .await
        .ok_or(DeliveryError::Cancelled)?
    {
        let chunk = chunk?;
        writer.write_all(&chunk).map_err(DeliveryError::Sink)?;
        written += chunk.len() as u64;
    }
    log::trace!("Downloaded {written} bytes");

    Ok(written)
}
