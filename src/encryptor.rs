//! External PDF encryption tool invocation.
//!
//! The actual cryptography is qpdf's job; this module owns the process
//! contract. The invocation is a fixed argument array handed to the OS
//! directly — user input (the password) is never interpolated into a shell
//! string, so shell metacharacters in passwords are inert.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Encryption key length requested from qpdf, in bits.
const KEY_LENGTH_BITS: &str = "256";

/// Narrow interface over the external encryption process.
///
/// Handlers depend on this trait rather than on qpdf itself, so tests can
/// substitute an in-process fake without spawning subprocesses.
#[async_trait]
pub trait PdfEncryptor: Send + Sync {
    /// Encrypt `input` with `password`, writing the result to `output`.
    ///
    /// On success the output file exists and is a valid encrypted PDF. On
    /// failure no usable output is guaranteed and the error carries the
    /// tool's diagnostics when available.
    async fn encrypt(&self, input: &Path, output: &Path, password: &str) -> Result<()>;
}

/// [`PdfEncryptor`] backed by the qpdf command-line tool.
///
/// Every output document gets the same fixed policy: the supplied password
/// for both the owner and user roles, 256-bit keys, and accessibility,
/// extraction, printing, and modification all disabled.
///
/// Note: the password is passed as a process argument and may be visible in
/// process listings on multi-tenant hosts. Accepted tradeoff of the design.
pub struct QpdfEncryptor {
    binary: PathBuf,
    timeout: Duration,
}

impl QpdfEncryptor {
    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    fn command(&self, input: &Path, output: &Path, password: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--encrypt")
            .arg(password) // user password
            .arg(password) // owner password (same, single-password scheme)
            .arg(KEY_LENGTH_BITS)
            .args(["--accessibility=n", "--extract=n", "--print=none", "--modify=none"])
            .arg("--")
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn binary_name(&self) -> String {
        self.binary.display().to_string()
    }
}

#[async_trait]
impl PdfEncryptor for QpdfEncryptor {
    async fn encrypt(&self, input: &Path, output: &Path, password: &str) -> Result<()> {
        let mut cmd = self.command(input, output, password);

        tracing::debug!(
            binary = %self.binary_name(),
            input = %input.display(),
            output = %output.display(),
            "Invoking encryption tool"
        );

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::Encryption {
                detail: format!(
                    "{} did not finish within {}",
                    self.binary_name(),
                    humantime::format_duration(self.timeout)
                ),
            })?
            .map_err(|e| Error::Encryption {
                detail: format!("failed to execute {}: {e}", self.binary_name()),
            })?;

        if result.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&result.stderr);
        let detail = if stderr.trim().is_empty() {
            format!("{} exited with {}", self.binary_name(), result.status)
        } else {
            stderr.trim().to_string()
        };
        Err(Error::Encryption { detail })
    }
}
