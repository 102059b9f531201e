//! Asymmetric encryption of artifacts at rest.
//!
//! The [`SecretCodec`] trait is the only way key material reaches disk.
//! Production uses [`RageCodec`], which shells out to `rage`; tests swap in
//! a deterministic in-memory implementation.

mod rage;

pub use rage::RageCodec;

use async_trait::async_trait;
use std::path::Path;
use zeroize::Zeroizing;

use crate::error::Result;

/// Encrypts payloads to a recipient set and decrypts them with one identity.
#[async_trait]
pub trait SecretCodec: Send + Sync {
    /// Display name for logging.
    fn name(&self) -> &str;

    /// Encrypt `plaintext` to every recipient and write the artifact to
    /// `destination`, replacing any existing file.
    ///
    /// Fails with [`Error::Encryption`](crate::Error::Encryption).
    async fn encrypt(
        &self,
        plaintext: &[u8],
        recipients: &[String],
        destination: &Path,
    ) -> Result<()>;

    /// Decrypt the artifact at `source` with `identity`.
    ///
    /// Missing, corrupt, or foreign artifacts fail with
    /// [`Error::Decryption`](crate::Error::Decryption); an empty result is
    /// never returned as success.
    async fn decrypt(&self, source: &Path, identity: &str) -> Result<Zeroizing<Vec<u8>>>;
}
