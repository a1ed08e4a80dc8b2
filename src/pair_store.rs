//! Encrypted persistence of the last selected trading pair.
//!
//! The pair is the only thing the desk keeps between sessions. It is stored as
//! JSON under a single key, sealed with AES-256-GCM. The key is derived from a
//! passphrase with SHA-256 and a fresh nonce is prepended to every ciphertext.
//! Anything that fails to read back (missing key, wrong passphrase, tampered
//! bytes) is treated as "nothing stored".

use crate::types::TradingPair;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Storage key the selected pair lives under.
pub const PAIR_KEY: &str = "symbols";

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored value is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("encryption key is empty")]
    EmptyKey,

    #[error("ciphertext could not be sealed or opened")]
    Crypto,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON file backing the store. None keeps nothing between runs.
    pub path: Option<String>,
    // secrets come from the environment only
    #[serde(skip)]
    pub encryption_key: Option<String>,
}

/// String key/value storage, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raw stored value, for inspecting what actually hits storage.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Whole-file JSON object on disk. Rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// AES-256-GCM over a passphrase derived key. Output is base64(nonce || ciphertext).
#[derive(Clone)]
pub struct PairCipher {
    cipher: Aes256Gcm,
}

impl PairCipher {
    pub fn from_passphrase(passphrase: &str) -> Result<Self, StoreError> {
        if passphrase.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        let digest = Sha256::digest(passphrase.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(digest.as_slice());
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, StoreError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| StoreError::Crypto)?;

        let mut bytes = Vec::with_capacity(NONCE_LEN + sealed.len());
        bytes.extend_from_slice(nonce.as_slice());
        bytes.extend_from_slice(&sealed);
        Ok(STANDARD.encode(bytes))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String, StoreError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        if bytes.len() <= NONCE_LEN {
            return Err(StoreError::Crypto);
        }
        let (nonce, sealed) = bytes.split_at(NONCE_LEN);
        let opened = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| StoreError::Crypto)?;
        String::from_utf8(opened).map_err(|_| StoreError::Crypto)
    }
}

/// The last selected pair, sealed under [`PAIR_KEY`].
pub struct PairStore {
    store: Box<dyn KeyValueStore>,
    cipher: PairCipher,
}

impl PairStore {
    pub fn new(store: Box<dyn KeyValueStore>, cipher: PairCipher) -> Self {
        Self { store, cipher }
    }

    /// File backed store from config. None without both a path and a key.
    pub fn from_config(config: &StorageConfig) -> Option<Self> {
        let path = config.path.as_deref()?;
        let key = config.encryption_key.as_deref()?;
        match PairCipher::from_passphrase(key) {
            Ok(cipher) => Some(Self::new(Box::new(FileStore::new(path)), cipher)),
            Err(err) => {
                log::warn!("pair storage disabled: {}", err);
                None
            }
        }
    }

    pub fn save(&mut self, pair: &TradingPair) -> Result<(), StoreError> {
        let json = serde_json::to_string(pair)?;
        let sealed = self.cipher.encrypt(&json)?;
        self.store.set(PAIR_KEY, sealed)
    }

    /// Stored pair, or None when nothing usable is stored.
    pub fn load(&self) -> Option<TradingPair> {
        let sealed = match self.store.get(PAIR_KEY) {
            Ok(Some(sealed)) => sealed,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("could not read stored pair: {}", err);
                return None;
            }
        };

        let pair = self
            .cipher
            .decrypt(&sealed)
            .and_then(|json| serde_json::from_str::<TradingPair>(&json).map_err(StoreError::from));
        match pair {
            Ok(pair) => Some(pair),
            Err(err) => {
                log::warn!("ignoring stored pair: {}", err);
                None
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(PAIR_KEY)
    }
}
