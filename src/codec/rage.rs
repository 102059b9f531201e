//! `rage` backed codec.
//!
//! Encrypts with `rage --encrypt --armor --output <path> --recipient <r>...`
//! reading plaintext from stdin, and decrypts with
//! `rage --decrypt --identity <id> <path>` reading plaintext from stdout.
//! Plaintext never touches the filesystem.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;
use zeroize::Zeroizing;

use super::SecretCodec;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::infra::process::ToolRunner;

pub struct RageCodec {
    runner: ToolRunner,
    binary: String,
}

impl RageCodec {
    pub fn new(runner: ToolRunner, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ToolRunner::new(&config.binaries_path, config.tool_timeout()),
            config.rage_binary.clone(),
        )
    }

    fn encrypt_args(recipients: &[String], destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--encrypt".into(),
            "--armor".into(),
            "--output".into(),
            destination.as_os_str().to_owned(),
        ];
        for recipient in recipients {
            args.push("--recipient".into());
            args.push(recipient.into());
        }
        args
    }

    fn decrypt_args(source: &Path, identity: &str) -> Vec<OsString> {
        vec![
            "--decrypt".into(),
            "--identity".into(),
            identity.into(),
            source.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl SecretCodec for RageCodec {
    fn name(&self) -> &str {
        "rage"
    }

    async fn encrypt(
        &self,
        plaintext: &[u8],
        recipients: &[String],
        destination: &Path,
    ) -> Result<()> {
        let fail = |reason: String| Error::Encryption {
            path: destination.to_path_buf(),
            reason,
        };

        if recipients.is_empty() {
            return Err(fail("no recipients configured".to_string()));
        }

        debug!(
            recipients = recipients.len(),
            "Encrypting artifact to {}",
            destination.display()
        );

        self.runner
            .run(
                &self.binary,
                Self::encrypt_args(recipients, destination),
                Some(plaintext),
            )
            .await
            .map_err(|e| fail(e.to_string()))?;

        match tokio::fs::metadata(destination).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            Ok(_) => Err(fail("encryption produced an empty artifact".to_string())),
            Err(e) => Err(fail(format!("artifact missing after encryption: {e}"))),
        }
    }

    async fn decrypt(&self, source: &Path, identity: &str) -> Result<Zeroizing<Vec<u8>>> {
        let fail = |reason: String| Error::Decryption {
            path: source.to_path_buf(),
            reason,
        };

        if tokio::fs::metadata(source).await.is_err() {
            return Err(fail("artifact not found".to_string()));
        }

        debug!("Decrypting artifact {}", source.display());

        let plaintext = self
            .runner
            .run(&self.binary, Self::decrypt_args(source, identity), None)
            .await
            .map_err(|e| fail(e.to_string()))?;

        if plaintext.is_empty() {
            return Err(fail("decryption produced no output".to_string()));
        }

        Ok(plaintext)
    }
}
