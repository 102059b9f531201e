//! In-memory stand-ins for the cluster and the encryption tool.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use zeroize::Zeroizing;

use vaultkeeper::codec::SecretCodec;
use vaultkeeper::config::Config;
use vaultkeeper::vault::{ClusterApiError, InitRequest, InitResponse, SealStatus, VaultApi};
use vaultkeeper::{Error, Result};

pub const ROOT_TOKEN: &str = "hvs.fake-root-token";
pub const IDENTITY: &str = "/identities/alice.txt";
pub const RECIPIENT: &str = "age1alice";

pub fn test_config(dir: &Path, shares: u32, threshold: u32) -> Config {
    Config {
        recipients: vec![RECIPIENT.into(), "age1bob".into()],
        identity: IDENTITY.into(),
        vault_address: "http://127.0.0.1:8200".into(),
        recovery_keys_path: dir.join("unseal-keys.age"),
        root_token_path: dir.join("root-token.age"),
        init_key_shares: shares,
        init_key_threshold: threshold,
        binaries_path: dir.join("bin"),
        reconcile_interval_secs: 60,
        request_timeout_secs: 5,
        tool_timeout_secs: 5,
        rage_binary: "rage".into(),
        plugin_binary: "age-plugin-yubikey".into(),
    }
}

// ============================================================================
// Fake cluster
// ============================================================================

#[derive(Debug, Default)]
pub struct VaultState {
    pub initialized: bool,
    pub sealed: bool,
    pub threshold: u32,
    pub total_shares: u32,
    pub progress: u32,
    /// Shares the cluster will accept.
    pub valid_shares: Vec<String>,
    /// Shares accepted in the current unseal attempt.
    pub accepted: Vec<String>,
    /// Every share ever submitted, in order.
    pub submitted: Vec<String>,
    pub init_calls: usize,
    pub seal_status_calls: usize,
    pub fail_seal_status: bool,
    pub fail_unseal: bool,
}

/// A Shamir-style unseal state machine.
#[derive(Debug, Default)]
pub struct FakeVault {
    state: Mutex<VaultState>,
}

impl FakeVault {
    pub fn uninitialized() -> Self {
        Self::default()
    }

    pub fn sealed(valid_shares: &[&str], threshold: u32) -> Self {
        let vault = Self::default();
        {
            let mut state = vault.state();
            state.initialized = true;
            state.sealed = true;
            state.threshold = threshold;
            state.total_shares = valid_shares.len() as u32;
            state.valid_shares = valid_shares.iter().map(|s| s.to_string()).collect();
        }
        vault
    }

    pub fn unsealed() -> Self {
        let vault = Self::sealed(&["only-share"], 1);
        vault.state().sealed = false;
        vault
    }

    pub fn state(&self) -> MutexGuard<'_, VaultState> {
        self.state.lock().unwrap()
    }

    /// Simulate a cluster restart: sealed again, progress lost.
    pub fn reseal(&self) {
        let mut state = self.state();
        state.sealed = true;
        state.progress = 0;
        state.accepted.clear();
    }

    fn status(state: &VaultState) -> SealStatus {
        SealStatus {
            initialized: state.initialized,
            sealed: state.sealed,
            progress: state.progress,
            threshold: state.threshold,
            shares: state.total_shares,
        }
    }
}

#[async_trait]
impl VaultApi for FakeVault {
    async fn init_status(&self) -> std::result::Result<bool, ClusterApiError> {
        Ok(self.state().initialized)
    }

    async fn init(&self, request: InitRequest) -> std::result::Result<InitResponse, ClusterApiError> {
        let mut state = self.state();
        state.init_calls += 1;
        if state.initialized {
            return Err(ClusterApiError::Status {
                operation: "init",
                status: 400,
                message: "Vault is already initialized".into(),
            });
        }

        let keys: Vec<String> = (1..=request.secret_shares)
            .map(|i| format!("c2hhcmUt{i}=="))
            .collect();
        state.initialized = true;
        state.sealed = true;
        state.threshold = request.secret_threshold;
        state.total_shares = request.secret_shares;
        state.valid_shares = keys.clone();

        Ok(InitResponse {
            keys,
            root_token: ROOT_TOKEN.into(),
        })
    }

    async fn seal_status(&self) -> std::result::Result<SealStatus, ClusterApiError> {
        let mut state = self.state();
        state.seal_status_calls += 1;
        if state.fail_seal_status {
            return Err(ClusterApiError::Timeout {
                operation: "seal-status",
            });
        }
        Ok(Self::status(&state))
    }

    async fn unseal(&self, share: &str) -> std::result::Result<SealStatus, ClusterApiError> {
        let mut state = self.state();
        state.submitted.push(share.to_string());
        if state.fail_unseal {
            return Err(ClusterApiError::Status {
                operation: "unseal",
                status: 503,
                message: "Vault is in standby".into(),
            });
        }

        let valid = state.valid_shares.iter().any(|s| s == share);
        let duplicate = state.accepted.iter().any(|s| s == share);
        if state.sealed && valid && !duplicate {
            state.accepted.push(share.to_string());
            state.progress += 1;
            if state.progress >= state.threshold {
                state.sealed = false;
                state.progress = 0;
                state.accepted.clear();
            }
        }
        Ok(Self::status(&state))
    }
}

// ============================================================================
// Fake codec
// ============================================================================

const MAGIC: &str = "FAKE-AGE v1";

/// Deterministic codec: hex "ciphertext" with a recipients header.
///
/// Decryption only succeeds when the identity's recipient is in the header.
#[derive(Debug)]
pub struct FakeCodec {
    identities: HashMap<String, String>,
    pub encrypt_calls: AtomicUsize,
    pub decrypt_calls: AtomicUsize,
    fail_encrypt_to: Mutex<Option<PathBuf>>,
}

impl Default for FakeCodec {
    fn default() -> Self {
        let mut identities = HashMap::new();
        identities.insert(IDENTITY.to_string(), RECIPIENT.to_string());
        Self {
            identities,
            encrypt_calls: AtomicUsize::new(0),
            decrypt_calls: AtomicUsize::new(0),
            fail_encrypt_to: Mutex::new(None),
        }
    }
}

impl FakeCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_encrypt_to(&self, path: &Path) {
        *self.fail_encrypt_to.lock().unwrap() = Some(path.to_path_buf());
    }

    pub fn encrypts(&self) -> usize {
        self.encrypt_calls.load(Ordering::SeqCst)
    }

    pub fn decrypts(&self) -> usize {
        self.decrypt_calls.load(Ordering::SeqCst)
    }
}

fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

#[async_trait]
impl SecretCodec for FakeCodec {
    fn name(&self) -> &str {
        "fake"
    }

    async fn encrypt(&self, plaintext: &[u8], recipients: &[String], destination: &Path) -> Result<()> {
        self.encrypt_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_encrypt_to.lock().unwrap().as_deref() == Some(destination) {
            return Err(Error::Encryption {
                path: destination.to_path_buf(),
                reason: "simulated tool failure".into(),
            });
        }
        let body = format!(
            "{MAGIC}\nrecipients: {}\n{}\n",
            recipients.join(","),
            to_hex(plaintext)
        );
        std::fs::write(destination, body).map_err(|e| Error::Encryption {
            path: destination.to_path_buf(),
            reason: e.to_string(),
        })
    }

    async fn decrypt(&self, source: &Path, identity: &str) -> Result<Zeroizing<Vec<u8>>> {
        self.decrypt_calls.fetch_add(1, Ordering::SeqCst);
        let fail = |reason: &str| Error::Decryption {
            path: source.to_path_buf(),
            reason: reason.to_string(),
        };

        let content = std::fs::read_to_string(source).map_err(|_| fail("artifact not found"))?;
        let mut lines = content.lines();
        if lines.next() != Some(MAGIC) {
            return Err(fail("header is invalid"));
        }
        let recipients = lines
            .next()
            .and_then(|l| l.strip_prefix("recipients: "))
            .ok_or_else(|| fail("recipients line missing"))?;
        let wanted = self
            .identities
            .get(identity)
            .ok_or_else(|| fail("identity is unknown"))?;
        if !recipients.split(',').any(|r| r == wanted) {
            return Err(fail("no identity matched any of the recipients"));
        }
        let payload = lines
            .next()
            .and_then(from_hex)
            .ok_or_else(|| fail("ciphertext is corrupt"))?;
        Ok(Zeroizing::new(payload))
    }
}
