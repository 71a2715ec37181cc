//! Flat JSON file storage backend.
//!
//! Each collection lives in its own file holding one JSON array. Every read
//! loads the whole file; every write rewrites it (temp file, then rename).
//! A missing or empty file reads as an empty collection.
//!
//! ```text
//! <data dir>/
//! ├── usuarios.json    ["+5493410000000", ...]
//! └── historial.json   [{"numero": ..., "fecha": ..., "origen": ...}, ...]
//! ```
//!
//! Writes are serialized within the process only. Two processes sharing a
//! data directory can lose each other's appends.

use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::recipient::{DeliveryRecord, Recipient};
use crate::storage::traits::{DeliveryStore, RecipientStore, StorageError};

/// File name of the recipient registry.
pub const RECIPIENTS_FILE: &str = "usuarios.json";

/// File name of the delivery history.
pub const DELIVERIES_FILE: &str = "historial.json";

#[derive(Debug)]
struct JsonArrayFile<T> {
    path: PathBuf,
    write_guard: Mutex<()>,
    _items: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonArrayFile<T> {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_guard: Mutex::new(()),
            _items: PhantomData,
        }
    }

    fn load(&self) -> Result<Vec<T>, StorageError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StorageError::SerializationError {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    fn store(&self, items: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(items).map_err(|e| StorageError::SerializationError {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Load, let `f` modify, and rewrite when `f` reports a change.
    fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> (R, bool)) -> Result<R, StorageError> {
        let _guard = self
            .write_guard
            .lock()
            .map_err(|_| StorageError::BackendError(format!("poisoned lock: {}", self.path.display())))?;
        let mut items = self.load()?;
        let (result, changed) = f(&mut items);
        if changed {
            self.store(&items)?;
        }
        Ok(result)
    }
}

/// Recipient registry stored in `usuarios.json`.
///
/// The format is a plain array of number strings, so hand-edited or legacy
/// files load unchanged.
#[derive(Debug)]
pub struct JsonFileRecipientStore {
    file: JsonArrayFile<Recipient>,
}

impl JsonFileRecipientStore {
    /// Store backed by the file at `path` (created on first write).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonArrayFile::new(path.into()),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl RecipientStore for JsonFileRecipientStore {
    fn list_recipients(&self) -> Result<Vec<Recipient>, StorageError> {
        self.file.load()
    }

    fn add_recipient(&self, recipient: Recipient) -> Result<bool, StorageError> {
        self.file.update(|items| {
            if items.contains(&recipient) {
                return (false, false);
            }
            items.push(recipient);
            (true, true)
        })
    }
}

/// Delivery history stored in `historial.json`.
#[derive(Debug)]
pub struct JsonFileDeliveryStore {
    file: JsonArrayFile<DeliveryRecord>,
}

impl JsonFileDeliveryStore {
    /// Store backed by the file at `path` (created on first write).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonArrayFile::new(path.into()),
        }
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file.path
    }
}

impl DeliveryStore for JsonFileDeliveryStore {
    fn append_delivery(&self, record: DeliveryRecord) -> Result<(), StorageError> {
        self.file.update(|items| {
            items.push(record);
            ((), true)
        })
    }

    fn read_deliveries(&self) -> Result<Vec<DeliveryRecord>, StorageError> {
        self.file.load()
    }
}

/// Both JSON file stores for one data directory.
#[derive(Debug)]
pub struct JsonFileStores {
    /// Recipient registry.
    pub recipients: JsonFileRecipientStore,
    /// Delivery history.
    pub deliveries: JsonFileDeliveryStore,
}

/// Open (creating if needed) the data directory and its two stores.
///
/// Existing files are validated eagerly so a corrupt file fails at startup
/// rather than on the first alert.
///
/// # Errors
/// - If the directory cannot be created
/// - If an existing file is unreadable or not a JSON array of the expected shape
pub fn open_json_stores(dir: impl AsRef<Path>) -> Result<JsonFileStores, StorageError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| StorageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let stores = JsonFileStores {
        recipients: JsonFileRecipientStore::new(dir.join(RECIPIENTS_FILE)),
        deliveries: JsonFileDeliveryStore::new(dir.join(DELIVERIES_FILE)),
    };
    stores.recipients.list_recipients()?;
    stores.deliveries.read_deliveries()?;
    Ok(stores)
}
