use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::config::DesktopConfig;

/// Minimal HTTP server standing in for the gateway's health endpoint
pub struct HealthServer {
    port: u16,
    hits: Arc<AtomicUsize>,
}

impl HealthServer {
    /// Answer 503 to the first `fail_first` requests and 200 afterwards
    pub async fn start(fail_first: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(async move {
                    let mut buf = [0u8; 2048];
                    let _ = socket.read(&mut buf).await;

                    let status = if n > fail_first {
                        "200 OK"
                    } else {
                        "503 Service Unavailable"
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                        status
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { port, hits }
    }

    /// Accept connections but never answer
    pub async fn start_silent() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = hits.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        Self { port, hits }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn health_url(&self) -> String {
        format!("http://127.0.0.1:{}/health", self.port)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A local port with nothing listening on it
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Write a shell script to stand in for the gateway entry point
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// Config that runs `entry_point` with `sh` and uses short timings
pub fn script_config(port: u16, entry_point: PathBuf, project_root: &Path) -> DesktopConfig {
    let mut config = DesktopConfig::default();
    config.gateway.port = port;
    config.gateway.interpreter = "sh".to_string();
    config.gateway.entry_point = Some(entry_point);
    config.gateway.project_root = Some(project_root.to_path_buf());
    config.health.timeout_ms = 3_000;
    config.health.interval_ms = 50;
    config.health.probe_timeout_ms = 200;
    config.shutdown.grace_period_ms = 500;
    config.crash_restart.base_delay_ms = 50;
    config.crash_restart.max_delay_ms = 200;
    config.crash_restart.jitter_ms = 0;
    config.crash_restart.max_attempts = 3;
    config
}
