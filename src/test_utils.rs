//! Shared helpers for tests: an in-process encryptor fake and server builders.

use crate::config::Config;
use crate::encryptor::PdfEncryptor;
use crate::errors::{Error, Result};
use crate::{AppState, build_router};
use async_trait::async_trait;
use axum_test::TestServer;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Prefix the mock prepends to its input, so tests can tell outputs from inputs
pub const MOCK_PREFIX: &[u8] = b"ENCRYPTED:";

/// In-process stand-in for the qpdf invocation.
///
/// Records every password it is handed and writes `MOCK_PREFIX` + input bytes
/// to the output path, or fails with a fixed diagnostic.
pub struct MockEncryptor {
    fail_with: Option<String>,
    pub passwords: Mutex<Vec<String>>,
}

impl MockEncryptor {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            passwords: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            fail_with: Some(detail.to_string()),
            passwords: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PdfEncryptor for MockEncryptor {
    async fn encrypt(&self, input: &Path, output: &Path, password: &str) -> Result<()> {
        self.passwords.lock().unwrap().push(password.to_string());

        if let Some(detail) = &self.fail_with {
            return Err(Error::Encryption { detail: detail.clone() });
        }

        let data = tokio::fs::read(input).await.map_err(|e| Error::Encryption { detail: e.to_string() })?;
        let mut out = MOCK_PREFIX.to_vec();
        out.extend_from_slice(&data);
        tokio::fs::write(output, out)
            .await
            .map_err(|e| Error::Encryption { detail: e.to_string() })?;
        Ok(())
    }
}

/// Default config pointed at a test-owned data directory
pub fn test_config(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        ..Config::default()
    }
}

/// In-process server over the real router with the given encryptor
pub fn test_server(config: Config, encryptor: Arc<dyn PdfEncryptor>) -> TestServer {
    let state = AppState { config, encryptor };
    TestServer::new(build_router(state).expect("router should build")).expect("failed to create test server")
}

/// Wait for the data directory to drain; download-mode cleanup runs when the
/// response body is dropped, which can land just after the client finishes
/// reading.
pub async fn assert_dir_drains(dir: &Path) {
    for _ in 0..100 {
        if std::fs::read_dir(dir).unwrap().count() == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let leftover: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    panic!("temp files leaked in data directory: {leftover:?}");
}
