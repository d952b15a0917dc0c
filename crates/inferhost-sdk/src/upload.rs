//! PUT-based uploads to pre-signed storage URLs.

use std::path::Path;

use reqwest::header::{CONTENT_RANGE, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::{SdkError, SdkResult};

/// 10 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * 1024 * 1024;

const OCTET_STREAM: &str = "application/octet-stream";

/// Upload a whole file in one PUT. 200 and 201 count as success.
pub async fn upload_small_file(
    http: &reqwest::Client,
    upload_url: &str,
    path: &Path,
    content_type: Option<&str>,
) -> SdkResult<()> {
    let data = tokio::fs::read(path).await?;
    let content_type = content_type.unwrap_or(OCTET_STREAM);

    let resp = http
        .put(upload_url)
        .header(CONTENT_TYPE, content_type)
        .body(data)
        .send()
        .await
        .map_err(|e| SdkError::Upload(format!("{}: {e}", path.display())))?;

    let status = resp.status();
    if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
        let body = resp.text().await.unwrap_or_default();
        return Err(SdkError::Upload(format!(
            "{}: HTTP {}: {}",
            path.display(),
            status.as_u16(),
            body.trim()
        )));
    }
    tracing::debug!(path=%path.display(), "file uploaded");
    Ok(())
}

/// Inclusive byte ranges covering `[0, size)` in steps of `chunk_size`.
pub fn chunk_ranges(size: u64, chunk_size: u64) -> Vec<(u64, u64)> {
    let chunk_size = chunk_size.max(1);
    let mut ranges = Vec::with_capacity(size.div_ceil(chunk_size) as usize);
    let mut start = 0;
    while start < size {
        let end = (start + chunk_size).min(size) - 1;
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}

/// Upload a file to a resumable URL chunk by chunk, each PUT carrying
/// `Content-Range: bytes start-end/total`. 308 means "keep going". Any other
/// non-success status aborts; a retry starts from byte 0.
pub async fn upload_large_file(
    http: &reqwest::Client,
    upload_url: &str,
    path: &Path,
    chunk_size: u64,
) -> SdkResult<()> {
    let mut file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    let ranges = chunk_ranges(size, chunk_size);
    tracing::debug!(path=%path.display(), size, chunks = ranges.len(), "starting chunked upload");

    for (start, end) in ranges {
        let len = (end - start + 1) as usize;
        let mut chunk = vec![0u8; len];
        file.seek(std::io::SeekFrom::Start(start)).await?;
        file.read_exact(&mut chunk).await?;

        let resp = http
            .put(upload_url)
            .header(CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
            .body(chunk)
            .send()
            .await
            .map_err(|e| SdkError::Upload(format!("{}: {e}", path.display())))?;

        let status = resp.status();
        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::PERMANENT_REDIRECT
        ) {
            let body = resp.text().await.unwrap_or_default();
            return Err(SdkError::Upload(format!(
                "{}: HTTP {} at bytes {start}-{end}: {}",
                path.display(),
                status.as_u16(),
                body.trim()
            )));
        }
        tracing::debug!(path=%path.display(), uploaded = end + 1, size, "chunk accepted");
    }
    Ok(())
}

/// MIME type from the file extension, `None` when unknown.
pub fn guess_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "zip" => "application/zip",
        "json" => "application/json",
        "txt" | "md" => "text/plain",
        "py" => "text/x-python",
        "yaml" | "yml" => "application/yaml",
        "tar" => "application/x-tar",
        "gz" | "tgz" => "application/gzip",
        "bin" | "safetensors" | "pt" | "pth" | "gguf" | "onnx" => OCTET_STREAM,
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::put;
    use axum::Router;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Clone, Default)]
    struct Recorder {
        puts: Arc<Mutex<Vec<(Option<String>, Option<String>, usize)>>>,
        reject_after: Option<usize>,
        /// Reply to the n-th PUT; 308 once the list runs out.
        replies: Vec<AxumStatus>,
    }

    async fn storage(recorder: Recorder) -> String {
        let app = Router::new()
            .route(
                "/upload",
                put(
                    |State(r): State<Recorder>, headers: HeaderMap, body: Bytes| async move {
                        let header = |name: &str| {
                            headers
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(str::to_string)
                        };
                        let mut puts = r.puts.lock().unwrap();
                        puts.push((header("content-range"), header("content-type"), body.len()));
                        match r.reject_after {
                            Some(n) if puts.len() > n => AxumStatus::FORBIDDEN,
                            _ => r
                                .replies
                                .get(puts.len() - 1)
                                .copied()
                                .unwrap_or(AxumStatus::PERMANENT_REDIRECT),
                        }
                    },
                ),
            )
            .route("/small", put(|| async { AxumStatus::CREATED }))
            .route("/denied", put(|| async { (AxumStatus::FORBIDDEN, "expired") }))
            .with_state(recorder);
        spawn_server(app).await
    }

    fn temp_file(len: usize) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        f.write_all(&data).unwrap();
        f.flush().unwrap();
        f
    }

    /// Storage that answers 308 to the first `accepted` chunks and then
    /// drops the connection without a response. Returns the upload URL and
    /// the number of chunks received.
    async fn flaky_storage(accepted: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = received.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let counter = counter.clone();
                tokio::spawn(async move {
                    while read_request(&mut socket).await.is_some() {
                        if counter.fetch_add(1, Ordering::SeqCst) >= accepted {
                            return;
                        }
                        let reply = b"HTTP/1.1 308 Permanent Redirect\r\ncontent-length: 0\r\n\r\n";
                        if socket.write_all(reply).await.is_err() {
                            return;
                        }
                    }
                });
            }
        });
        (format!("http://{addr}/upload"), received)
    }

    /// Consume one HTTP/1.1 request with a `content-length` body.
    async fn read_request(socket: &mut TcpStream) -> Option<()> {
        let mut buf = Vec::new();
        let mut tmp = [0u8; 4096];
        let header_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut tmp).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&tmp[..n]);
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let len: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let mut body = buf.len() - header_end;
        while body < len {
            let n = socket.read(&mut tmp).await.ok()?;
            if n == 0 {
                return None;
            }
            body += n;
        }
        Some(())
    }

    #[test]
    fn test_chunk_ranges_partition() {
        let ranges = chunk_ranges(25, 10);
        assert_eq!(ranges, vec![(0, 9), (10, 19), (20, 24)]);
        assert_eq!(chunk_ranges(20, 10), vec![(0, 9), (10, 19)]);
        assert!(chunk_ranges(0, 10).is_empty());
        assert_eq!(chunk_ranges(3, 10), vec![(0, 2)]);
    }

    #[test]
    fn test_chunk_ranges_cover_file_exactly() {
        for size in 0..300u64 {
            for chunk in 1..40u64 {
                let ranges = chunk_ranges(size, chunk);
                assert_eq!(ranges.len() as u64, size.div_ceil(chunk), "size {size} chunk {chunk}");
                let mut next = 0;
                for &(start, end) in &ranges {
                    assert_eq!(start, next, "size {size} chunk {chunk}");
                    assert!(end >= start && end - start < chunk);
                    next = end + 1;
                }
                assert_eq!(next, size);
            }
        }
    }

    #[tokio::test]
    async fn test_large_upload_sends_contiguous_ranges() {
        let recorder = Recorder::default();
        let base = storage(recorder.clone()).await;
        let file = temp_file(2_500);

        upload_large_file(
            &reqwest::Client::new(),
            &format!("{base}/upload"),
            file.path(),
            1_000,
        )
        .await
        .unwrap();

        let puts = recorder.puts.lock().unwrap();
        let ranges: Vec<_> = puts.iter().map(|p| p.0.clone().unwrap()).collect();
        assert_eq!(
            ranges,
            vec![
                "bytes 0-999/2500",
                "bytes 1000-1999/2500",
                "bytes 2000-2499/2500"
            ]
        );
        let sizes: Vec<_> = puts.iter().map(|p| p.2).collect();
        assert_eq!(sizes, vec![1_000, 1_000, 500]);
    }

    #[tokio::test]
    async fn test_large_upload_aborts_on_rejection() {
        let recorder = Recorder {
            reject_after: Some(1),
            ..Default::default()
        };
        let base = storage(recorder.clone()).await;
        let file = temp_file(3_000);

        let err = upload_large_file(
            &reqwest::Client::new(),
            &format!("{base}/upload"),
            file.path(),
            1_000,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SdkError::Upload(_)));
        assert_eq!(recorder.puts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_large_upload_continues_after_success_statuses() {
        let recorder = Recorder {
            replies: vec![AxumStatus::OK, AxumStatus::CREATED, AxumStatus::OK],
            ..Default::default()
        };
        let base = storage(recorder.clone()).await;
        let file = temp_file(2_500);

        upload_large_file(
            &reqwest::Client::new(),
            &format!("{base}/upload"),
            file.path(),
            1_000,
        )
        .await
        .unwrap();

        let puts = recorder.puts.lock().unwrap();
        let ranges: Vec<_> = puts.iter().map(|p| p.0.clone().unwrap()).collect();
        assert_eq!(
            ranges,
            vec![
                "bytes 0-999/2500",
                "bytes 1000-1999/2500",
                "bytes 2000-2499/2500"
            ]
        );
    }

    #[tokio::test]
    async fn test_dropped_connection_mid_upload_is_upload_error() {
        let (url, received) = flaky_storage(1).await;
        let file = temp_file(3_000);

        let err = upload_large_file(&reqwest::Client::new(), &url, file.path(), 1_000)
            .await
            .unwrap_err();

        match err {
            SdkError::Upload(msg) => assert!(msg.contains(&file.path().display().to_string())),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(received.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_empty_file_sends_nothing() {
        let recorder = Recorder::default();
        let base = storage(recorder.clone()).await;
        let file = temp_file(0);

        upload_large_file(
            &reqwest::Client::new(),
            &format!("{base}/upload"),
            file.path(),
            DEFAULT_CHUNK_SIZE,
        )
        .await
        .unwrap();
        assert!(recorder.puts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_small_upload_status_handling() {
        let base = storage(Recorder::default()).await;
        let file = temp_file(10);
        let http = reqwest::Client::new();

        upload_small_file(&http, &format!("{base}/small"), file.path(), Some("application/zip"))
            .await
            .unwrap();

        let err = upload_small_file(&http, &format!("{base}/denied"), file.path(), None)
            .await
            .unwrap_err();
        match err {
            SdkError::Upload(msg) => assert!(msg.contains("403")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_upload_error() {
        let file = temp_file(10);
        let err = upload_small_file(
            &reqwest::Client::new(),
            "http://127.0.0.1:1/x",
            file.path(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SdkError::Upload(_)));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("bundle.ZIP")), Some("application/zip"));
        assert_eq!(
            guess_content_type(Path::new("model.safetensors")),
            Some("application/octet-stream")
        );
        assert_eq!(guess_content_type(Path::new("README")), None);
        assert_eq!(guess_content_type(Path::new("x.unknownext")), None);
    }
}
