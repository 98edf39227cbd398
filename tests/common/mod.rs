/*!
 * Common test utilities for the video2srt test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use video2srt::TimedSegment;
use video2srt::app_config::{CircuitBreakerConfig, Config, RetryConfig};
use video2srt::providers::TranslationProvider;

/// Route library logs to the test harness (`RUST_LOG=debug cargo test`)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Configuration with instant retries and a breaker that never recovers on its own
pub fn test_config(max_retries: u32) -> Config {
    let mut config = Config::default();
    config.translator_manager.retry = RetryConfig {
        max_retries,
        base_delay: 0.0,
        max_delay: 0.0,
        backoff_factor: 2.0,
        jitter: false,
    };
    config.translator_manager.circuit_breaker = CircuitBreakerConfig {
        failure_threshold: 5,
        recovery_timeout: 3600.0,
        half_open_max_calls: 3,
    };
    config
}

/// Two close segments that end up in one block
pub fn two_sentences() -> Vec<TimedSegment> {
    vec![
        TimedSegment::from_raw(0.0, 2.0, "Hello world."),
        TimedSegment::from_raw(2.5, 4.0, "How are you?"),
    ]
}

/// Shorthand for a list of shared providers
pub fn providers<const N: usize>(list: [Arc<dyn TranslationProvider>; N]) -> Vec<Arc<dyn TranslationProvider>> {
    list.into_iter().collect()
}

/// Local HTTP server answering every request with the same status and body.
///
/// Returns the base URL and a counter of served requests.
pub async fn serve_http(status: u16, content_type: &str, body: &str) -> Result<(String, Arc<AtomicUsize>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let base_url = format!("http://{}", listener.local_addr()?);
    let served = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&served);
    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    );

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            if read_request(&mut stream).await.is_err() {
                continue;
            }
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    Ok((base_url, served))
}

/// Read one request including its body
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut data = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        data.extend_from_slice(&chunk[..read]);

        if let Some(header_end) = data.windows(4).position(|window| window == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= header_end + 4 + content_length {
                return Ok(());
            }
        }
    }
}
