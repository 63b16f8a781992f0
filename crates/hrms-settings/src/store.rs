//! File-backed settings store with typed accessors.
//!
//! # Design
//! - Keep the whole document in memory and rewrite the file on each write
//!   (temp file + rename) so a crash never leaves a truncated document.
//! - Clones share one document; the last writer wins.
//! - Read-modify-write helpers hold the lock for the whole update so
//!   concurrent markers within one process are never lost.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hrms_api_models::NotificationId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::keys::{
    ACCESS_TOKEN_KEY, BADGE_KEY_PREFIX, Badge, PUSH_CURSOR_KEY, READ_MARKERS_KEY,
    REFRESH_TOKEN_KEY,
};

const APP_DIR: &str = "hrms-console";
const FILE_NAME: &str = "settings.json";

/// Shared handle to the persisted settings document.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    path: Option<PathBuf>,
    document: Mutex<Map<String, Value>>,
}

impl SettingsStore {
    /// Open (or lazily create) the settings document at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or is not a
    /// JSON object.
    pub fn open(path: impl Into<PathBuf>) -> SettingsResult<Self> {
        let path = path.into();
        let document = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => serde_json::from_slice::<Map<String, Value>>(&bytes).map_err(
                |source| SettingsError::Malformed {
                    path: path.clone(),
                    source,
                },
            )?,
            Err(err) if err.kind() == ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(SettingsError::Io { path, source }),
        };
        debug!(path = %path.display(), keys = document.len(), "settings loaded");
        Ok(Self {
            inner: Arc::new(Inner {
                path: Some(path),
                document: Mutex::new(document),
            }),
        })
    }

    /// Store that never touches the filesystem.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                path: None,
                document: Mutex::new(Map::new()),
            }),
        }
    }

    /// Default settings location under the platform configuration directory.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoConfigDir`] when the platform exposes none.
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(FILE_NAME))
            .ok_or(SettingsError::NoConfigDir)
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Read and convert a value.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value does not match `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> SettingsResult<Option<T>> {
        let document = self.lock();
        document
            .get(key)
            .cloned()
            .map(|value| {
                serde_json::from_value(value).map_err(|source| SettingsError::InvalidValue {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Store a value and persist the document.
    ///
    /// # Errors
    ///
    /// Returns an error when the value cannot be encoded or the file cannot
    /// be written.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> SettingsResult<()> {
        let encoded = serde_json::to_value(value).map_err(|source| SettingsError::InvalidValue {
            key: key.to_string(),
            source,
        })?;
        self.update(|document| {
            document.insert(key.to_string(), encoded);
            Ok(true)
        })
    }

    /// Remove a key and persist the document.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn remove(&self, key: &str) -> SettingsResult<()> {
        self.update(|document| Ok(document.remove(key).is_some()))
    }

    /// Stored access token.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value is not a string.
    pub fn access_token(&self) -> SettingsResult<Option<String>> {
        Ok(self
            .get::<String>(ACCESS_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value is not a string.
    pub fn refresh_token(&self) -> SettingsResult<Option<String>> {
        Ok(self
            .get::<String>(REFRESH_TOKEN_KEY)?
            .filter(|token| !token.trim().is_empty()))
    }

    /// Persist a fresh access token, and the refresh token when provided.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn store_tokens(&self, access: &str, refresh: Option<&str>) -> SettingsResult<()> {
        self.update(|document| {
            document.insert(ACCESS_TOKEN_KEY.to_string(), Value::from(access));
            if let Some(refresh) = refresh {
                document.insert(REFRESH_TOKEN_KEY.to_string(), Value::from(refresh));
            }
            Ok(true)
        })
    }

    /// Drop both auth tokens.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn clear_tokens(&self) -> SettingsResult<()> {
        self.update(|document| {
            document.remove(ACCESS_TOKEN_KEY);
            document.remove(REFRESH_TOKEN_KEY);
            Ok(true)
        })
    }

    /// Drop everything tied to the signed-in user: tokens, read markers,
    /// badge counters and the push cursor.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn clear_session(&self) -> SettingsResult<()> {
        self.update(|document| {
            document.retain(|key, _| {
                key != ACCESS_TOKEN_KEY
                    && key != REFRESH_TOKEN_KEY
                    && key != READ_MARKERS_KEY
                    && key != PUSH_CURSOR_KEY
                    && !key.starts_with(BADGE_KEY_PREFIX)
            });
            Ok(true)
        })
    }

    /// Notification ids the user has seen.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value is not a list of ids.
    pub fn read_markers(&self) -> SettingsResult<BTreeSet<NotificationId>> {
        Ok(self
            .get::<BTreeSet<NotificationId>>(READ_MARKERS_KEY)?
            .unwrap_or_default())
    }

    /// Add ids to the read-marker set, returning the updated set.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored set is malformed or the file cannot
    /// be written.
    pub fn add_read_markers<I>(&self, ids: I) -> SettingsResult<BTreeSet<NotificationId>>
    where
        I: IntoIterator<Item = NotificationId>,
    {
        let mut updated = BTreeSet::new();
        self.update(|document| {
            let mut markers = match document.get(READ_MARKERS_KEY).cloned() {
                Some(value) => serde_json::from_value::<BTreeSet<NotificationId>>(value)
                    .map_err(|source| SettingsError::InvalidValue {
                        key: READ_MARKERS_KEY.to_string(),
                        source,
                    })?,
                None => BTreeSet::new(),
            };
            let before = markers.len();
            markers.extend(ids);
            let changed = markers.len() != before;
            if changed {
                let encoded = serde_json::to_value(&markers).map_err(|source| {
                    SettingsError::InvalidValue {
                        key: READ_MARKERS_KEY.to_string(),
                        source,
                    }
                })?;
                document.insert(READ_MARKERS_KEY.to_string(), encoded);
            }
            updated = markers;
            Ok(changed)
        })?;
        Ok(updated)
    }

    /// Last event id received over the push stream.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value is not an integer.
    pub fn push_cursor(&self) -> SettingsResult<Option<i64>> {
        self.get::<i64>(PUSH_CURSOR_KEY)
    }

    /// Advance the push cursor; lower ids never move it backwards.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn advance_push_cursor(&self, id: i64) -> SettingsResult<()> {
        self.update(|document| {
            let current = document.get(PUSH_CURSOR_KEY).and_then(Value::as_i64);
            if current.is_some_and(|current| current >= id) {
                return Ok(false);
            }
            document.insert(PUSH_CURSOR_KEY.to_string(), Value::from(id));
            Ok(true)
        })
    }

    /// Count recorded when the badge was last viewed.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored value is not an integer.
    pub fn badge_last_seen(&self, badge: Badge) -> SettingsResult<u64> {
        Ok(self.get::<u64>(&badge.storage_key())?.unwrap_or(0))
    }

    /// Record the count shown when the badge was viewed.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn set_badge_last_seen(&self, badge: Badge, count: u64) -> SettingsResult<()> {
        self.set(&badge.storage_key(), &count)
    }

    /// Items added since the badge was last viewed.
    ///
    /// # Errors
    ///
    /// Returns an error when the stored counter is malformed.
    pub fn badge_unseen(&self, badge: Badge, current: u64) -> SettingsResult<u64> {
        Ok(current.saturating_sub(self.badge_last_seen(badge)?))
    }

    /// Apply `change` to a copy of the document and make it visible only
    /// once the copy is on disk. `change` reports whether it changed anything.
    fn update<F>(&self, change: F) -> SettingsResult<()>
    where
        F: FnOnce(&mut Map<String, Value>) -> SettingsResult<bool>,
    {
        let mut document = self.lock();
        let mut staged = document.clone();
        if change(&mut staged)? {
            self.persist(&staged)?;
            *document = staged;
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.inner
            .document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, document: &Map<String, Value>) -> SettingsResult<()> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        let io_error = |source| SettingsError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let encoded = serde_json::to_vec_pretty(document).map_err(|source| {
            SettingsError::Malformed {
                path: path.clone(),
                source,
            }
        })?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, encoded).map_err(io_error)?;
        fs::rename(&staging, path).map_err(io_error)?;
        Ok(())
    }
}
