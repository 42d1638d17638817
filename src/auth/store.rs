//! Durable storage for the credential record.
//!
//! Each field of the record lives in its own small JSON file under the
//! state directory, so a corrupt or missing file degrades only that field
//! and partial failures stay individually diagnosable. An in-memory
//! snapshot behind a lock is the single source of truth at runtime; the
//! files are a durability layer written through on every mutation.
//!
//! When no state directory is available the store still works: reads
//! return an empty record and every mutation is a no-op, which downstream
//! code treats as "not authenticated".

use std::path::PathBuf;
use std::sync::RwLock;

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Role, UserProfile};

/// File names for the per-field state files (".json" is appended).
const ACCESS_TOKEN_FIELD: &str = "access_token";
const REFRESH_TOKEN_FIELD: &str = "refresh_token";
const EXPIRES_AT_FIELD: &str = "expires_at";
const ROLE_FIELD: &str = "role";
const PROFILE_FIELD: &str = "profile";

/// Full persisted session state. A default record means "nobody is
/// signed in".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry instant in epoch milliseconds.
    pub expires_at: Option<i64>,
    pub role: Option<Role>,
    pub profile: Option<UserProfile>,
}

impl CredentialRecord {
    /// A record with no expiry is treated as already expired; otherwise
    /// the token is unusable from the expiry instant onwards.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now().timestamp_millis() >= at,
            None => true,
        }
    }

    /// Milliseconds until expiry. Negative once expired, `None` when no
    /// expiry is stored.
    pub fn expires_in_ms(&self) -> Option<i64> {
        self.expires_at.map(|at| at - Utc::now().timestamp_millis())
    }
}

pub struct CredentialStore {
    state_dir: Option<PathBuf>,
    record: RwLock<CredentialRecord>,
}

impl CredentialStore {
    /// Open the store, loading whatever fields are currently persisted.
    ///
    /// Never fails: an unusable state directory downgrades the store to
    /// its in-memory no-op mode, and a corrupt field file loads as absent
    /// while the other fields load normally.
    pub fn open(state_dir: Option<PathBuf>) -> Self {
        let state_dir = state_dir.and_then(|dir| match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "State directory unavailable, running without persistence");
                None
            }
        });

        let record = match state_dir {
            Some(ref dir) => CredentialRecord {
                access_token: Self::load_field(dir, ACCESS_TOKEN_FIELD),
                refresh_token: Self::load_field(dir, REFRESH_TOKEN_FIELD),
                expires_at: Self::load_field(dir, EXPIRES_AT_FIELD),
                role: Self::load_field(dir, ROLE_FIELD),
                profile: Self::load_field(dir, PROFILE_FIELD),
            },
            None => CredentialRecord::default(),
        };

        Self {
            state_dir,
            record: RwLock::new(record),
        }
    }

    /// Current snapshot of the record. Always internally consistent:
    /// mutations swap the whole snapshot under the write lock.
    pub fn read(&self) -> CredentialRecord {
        self.lock_read().clone()
    }

    /// Replace the entire record. This is the atomicity point for the
    /// renewal path: no reader ever observes an old token paired with a
    /// new expiry.
    pub fn replace(&self, record: CredentialRecord) {
        if self.state_dir.is_none() {
            return;
        }
        let mut guard = self.lock_write();
        self.persist_field(ACCESS_TOKEN_FIELD, &record.access_token);
        self.persist_field(REFRESH_TOKEN_FIELD, &record.refresh_token);
        self.persist_field(EXPIRES_AT_FIELD, &record.expires_at);
        self.persist_field(ROLE_FIELD, &record.role);
        self.persist_field(PROFILE_FIELD, &record.profile);
        *guard = record;
    }

    /// Update display data without touching the token fields.
    pub fn set_profile(&self, profile: UserProfile) {
        if self.state_dir.is_none() {
            return;
        }
        let mut guard = self.lock_write();
        let value = Some(profile);
        self.persist_field(PROFILE_FIELD, &value);
        guard.profile = value;
    }

    /// Record a resolved role without touching the token fields.
    pub fn set_role(&self, role: Role) {
        if self.state_dir.is_none() {
            return;
        }
        let mut guard = self.lock_write();
        let value = Some(role);
        self.persist_field(ROLE_FIELD, &value);
        guard.role = value;
    }

    /// Remove every field. Idempotent; clearing an empty store is fine.
    pub fn clear(&self) {
        if self.state_dir.is_none() {
            return;
        }
        let mut guard = self.lock_write();
        for field in [
            ACCESS_TOKEN_FIELD,
            REFRESH_TOKEN_FIELD,
            EXPIRES_AT_FIELD,
            ROLE_FIELD,
            PROFILE_FIELD,
        ] {
            self.remove_field(field);
        }
        *guard = CredentialRecord::default();
    }

    /// Whether mutations actually persist anything.
    pub fn is_persistent(&self) -> bool {
        self.state_dir.is_some()
    }

    fn field_path(dir: &std::path::Path, field: &str) -> PathBuf {
        dir.join(format!("{}.json", field))
    }

    fn load_field<T: DeserializeOwned>(dir: &std::path::Path, field: &str) -> Option<T> {
        let path = Self::field_path(dir, field);
        if !path.exists() {
            return None;
        }

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!(field, error = %e, "Failed to read state field, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(field, error = %e, "Failed to parse state field, treating as absent");
                None
            }
        }
    }

    /// Write a field file, or remove it when the value is `None`. IO
    /// failures are logged and swallowed; the in-memory snapshot still
    /// advances so the running process stays consistent.
    fn persist_field<T: Serialize>(&self, field: &str, value: &Option<T>) {
        match value {
            Some(v) => {
                let Some(ref dir) = self.state_dir else {
                    return;
                };
                let path = Self::field_path(dir, field);
                match serde_json::to_string_pretty(v) {
                    Ok(contents) => {
                        if let Err(e) = std::fs::write(&path, contents) {
                            warn!(field, error = %e, "Failed to write state field");
                        }
                    }
                    Err(e) => warn!(field, error = %e, "Failed to serialize state field"),
                }
            }
            None => self.remove_field(field),
        }
    }

    fn remove_field(&self, field: &str) {
        let Some(ref dir) = self.state_dir else {
            return;
        };
        let path = Self::field_path(dir, field);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(field, error = %e, "Failed to remove state field");
            } else {
                debug!(field, "State field removed");
            }
        }
    }

    fn lock_read(&self) -> std::sync::RwLockReadGuard<'_, CredentialRecord> {
        // A poisoned lock still holds the last snapshot, which is the
        // right thing to hand out for a store whose operations must not
        // fail the caller.
        self.record.read().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_write(&self) -> std::sync::RwLockWriteGuard<'_, CredentialRecord> {
        self.record.write().unwrap_or_else(|e| e.into_inner())
    }
}
