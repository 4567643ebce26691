//! Stock clip download.

use std::path::Path;

use futures::{Stream, StreamExt};
use reqwest::Client;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};

/// Download `url` to `path` unless a non-empty file is already there.
///
/// Returns `true` when a download happened. The body is streamed to a
/// `.part` sibling and renamed on success, so an interrupted download never
/// looks cached.
pub async fn ensure_downloaded(client: &Client, url: &str, path: &Path) -> MediaResult<bool> {
    if let Ok(meta) = fs::metadata(path).await {
        if meta.is_file() && meta.len() > 0 {
            debug!(path = %path.display(), "Clip already cached");
            return Ok(false);
        }
    }

    download_file(client, url, path).await?;
    Ok(true)
}

/// Stream `url` to `path`, replacing any existing file.
pub async fn download_file(client: &Client, url: &str, path: &Path) -> MediaResult<u64> {
    if url.trim().is_empty() {
        return Err(MediaError::download_failed("empty clip URL"));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    let partial = path.with_extension("part");
    let written = write_partial(&partial, response.bytes_stream()).await?;

    if written == 0 {
        let _ = fs::remove_file(&partial).await;
        return Err(MediaError::download_failed(format!("{} returned an empty body", url)));
    }

    fs::rename(&partial, path).await?;
    info!(path = %path.display(), bytes = written, "Downloaded clip");
    Ok(written)
}

/// Write every chunk of `stream` to `partial`. Any failure removes the
/// partial file before the error is returned.
async fn write_partial<S, B, E>(partial: &Path, stream: S) -> MediaResult<u64>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<MediaError>,
{
    let result: MediaResult<u64> = async {
        let mut stream = std::pin::pin!(stream);
        let mut file = fs::File::create(partial).await?;
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(Into::<MediaError>::into)?;
            let bytes = chunk.as_ref();
            file.write_all(bytes).await?;
            written += bytes.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(partial).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_then_cache_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/clip.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 1024]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("cache").join("asset_9.mp4");
        let client = Client::new();
        let url = format!("{}/clip.mp4", server.uri());

        assert!(ensure_downloaded(&client, &url, &target).await.unwrap());
        assert_eq!(std::fs::metadata(&target).unwrap().len(), 1024);
        assert!(!target.with_extension("part").exists());

        assert!(!ensure_downloaded(&client, &url, &target).await.unwrap());
    }

    #[tokio::test]
    async fn test_error_status_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing.mp4");
        let err = download_file(&Client::new(), &format!("{}/x.mp4", server.uri()), &target)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_stream_error_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("asset_3.part");
        let chunks = futures::stream::iter(vec![
            Ok(vec![7u8; 512]),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
        ]);

        let err = write_partial(&partial, chunks).await.unwrap_err();

        assert!(matches!(err, MediaError::Io(_)));
        assert!(!partial.exists());
    }

    #[tokio::test]
    async fn test_write_partial_counts_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("asset_4.part");
        let chunks = futures::stream::iter(vec![
            Ok::<_, std::io::Error>(vec![1u8; 100]),
            Ok(vec![2u8; 28]),
        ]);

        assert_eq!(write_partial(&partial, chunks).await.unwrap(), 128);
        assert_eq!(std::fs::metadata(&partial).unwrap().len(), 128);
    }

    #[tokio::test]
    async fn test_empty_body_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("empty.mp4");
        let err = download_file(&Client::new(), &format!("{}/x.mp4", server.uri()), &target)
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::DownloadFailed { .. }));
        assert!(!target.exists());
        assert!(!target.with_extension("part").exists());
    }

    #[tokio::test]
    async fn test_empty_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = download_file(&Client::new(), " ", &dir.path().join("a.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::DownloadFailed { .. }));
    }
}
