//! Bounded invocation of the external tool binaries.
//!
//! Both the codec and the diagnostics go through [`ToolRunner`]: binaries are
//! resolved under the configured directory, that directory is put first on
//! the child's `PATH` (so `rage` can find its identity plugins), and every
//! run is cut off after the configured timeout.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to start '{}': {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error talking to '{}': {source}", program.display())]
    Io {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' timed out after {}s", program.display(), timeout.as_secs_f32())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("'{}' exited with {status}: {stderr}", program.display())]
    Failed {
        program: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Runs binaries from a fixed directory with a per-invocation timeout.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    binaries_path: PathBuf,
    timeout: Duration,
}

impl ToolRunner {
    pub fn new(binaries_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binaries_path: binaries_path.into(),
            timeout,
        }
    }

    pub fn resolve(&self, binary: &str) -> PathBuf {
        self.binaries_path.join(binary)
    }

    /// Run `binary` with `args`, feeding `stdin` if given, and return stdout.
    ///
    /// Stdout is returned in a zeroizing buffer since it may carry decrypted
    /// key material.
    pub async fn run<I, S>(
        &self,
        binary: &str,
        args: I,
        stdin: Option<&[u8]>,
    ) -> Result<Zeroizing<Vec<u8>>, ToolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.resolve(binary);

        let mut cmd = Command::new(&program);
        cmd.args(args);
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let mut search_path = vec![self.binaries_path.clone()];
        if let Some(existing) = std::env::var_os("PATH") {
            search_path.extend(std::env::split_paths(&existing));
        }
        match std::env::join_paths(search_path) {
            Ok(joined) => {
                cmd.env("PATH", joined);
            }
            Err(e) => warn!("Not extending PATH for '{}': {}", program.display(), e),
        }

        debug!("Running '{}'", program.display());

        let mut child = cmd.spawn().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        let input = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(data)) = (input, stdin) {
                pipe.write_all(data).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let result = tokio::time::timeout(self.timeout, async {
            tokio::join!(feed, child.wait_with_output())
        })
        .await;

        let (fed, output) = match result {
            Ok(pair) => pair,
            Err(_) => {
                return Err(ToolError::Timeout {
                    program,
                    timeout: self.timeout,
                })
            }
        };

        let output = output.map_err(|source| ToolError::Io {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // A clean exit with unread input means the payload never arrived.
        fed.map_err(|source| ToolError::Io {
            program: program.clone(),
            source,
        })?;

        Ok(Zeroizing::new(output.stdout))
    }
}
