//! In-memory license store and module queries.
//!
//! The store maps the exact original license text to its decoded record.
//! Entries are created by a successful decode plus validity check, never
//! mutated, and removed only by a bulk [`LicenseStore::clear`]. Queries scan
//! all entries; module counts and license counts are small, so no secondary
//! index is kept.
//!
//! The store is the only shared mutable state in the crate. A reader/writer
//! lock lets concurrent feature checks proceed in parallel while inserts and
//! clears are exclusive. Codec operations themselves are pure. A panic while
//! holding the lock cannot leave a half-written entry, so a poisoned lock is
//! recovered rather than propagated.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Datelike, Local};
use tracing::debug;

use crate::codec::{self, LicenseRecord};
use crate::config::KeyMaterial;
use crate::errors::{LicenseError, LicenseResult};

/// Holds decoded licenses and answers module licensing queries.
pub struct LicenseStore {
    keys: KeyMaterial,
    licenses: RwLock<HashMap<String, LicenseRecord>>,
}

impl LicenseStore {
    /// Create an empty store using the given key material for decoding.
    pub fn new(keys: KeyMaterial) -> Self {
        Self {
            keys,
            licenses: RwLock::new(HashMap::new()),
        }
    }

    /// Remove all stored licenses.
    pub fn clear(&self) {
        let mut licenses = self.licenses.write().unwrap_or_else(|e| e.into_inner());
        let removed = licenses.len();
        licenses.clear();
        debug!(removed, "license store cleared");
    }

    /// Number of stored licenses.
    pub fn len(&self) -> usize {
        self.licenses
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether the store holds no licenses.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode, validate, and store a license text.
    ///
    /// An empty text is a no-op success. Re-adding a text that is already
    /// stored is also a no-op success and does not re-validate expiry.
    /// Otherwise the text must decode cleanly and must not already be
    /// expired; decode errors propagate and an expired license reports
    /// [`LicenseError::Expired`].
    pub fn add_license(&self, text: &str) -> LicenseResult<()> {
        if text.is_empty() {
            return Ok(());
        }

        let mut licenses = self.licenses.write().unwrap_or_else(|e| e.into_inner());
        if licenses.contains_key(text) {
            return Ok(());
        }

        let (record, _) = codec::decode(text, &self.keys)?;
        if !record.is_date_valid() {
            return Err(LicenseError::Expired);
        }

        debug!(
            modules = ?record.modules(),
            expiry_year = record.expiry_year(),
            "license added to store"
        );
        licenses.insert(text.to_string(), record);
        Ok(())
    }

    /// Whether any stored, date-valid license covers `module_id`.
    ///
    /// Reports [`LicenseError::Expired`] when licenses for the module exist
    /// but all have lapsed, and [`LicenseError::NotFound`] when no stored
    /// license mentions the module at all.
    pub fn is_module_licensed(&self, module_id: u8) -> LicenseResult<()> {
        let now = Local::now();
        self.is_module_licensed_at(module_id, now.year(), now.month0())
    }

    /// [`Self::is_module_licensed`] against an explicit year and zero-based month.
    pub fn is_module_licensed_at(
        &self,
        module_id: u8,
        year: i32,
        month0: u32,
    ) -> LicenseResult<()> {
        let licenses = self.licenses.read().unwrap_or_else(|e| e.into_inner());
        let mut found_expired = false;
        for record in licenses.values() {
            if record.covers_module(module_id) {
                if record.is_date_valid_at(year, month0) {
                    return Ok(());
                }
                found_expired = true;
            }
        }
        if found_expired {
            Err(LicenseError::Expired)
        } else {
            Err(LicenseError::NotFound)
        }
    }

    /// Whether any stored, date-valid license covers `module_id` with an
    /// exactly matching auth code. Anything less reports
    /// [`LicenseError::Unauthenticated`].
    pub fn is_module_authenticated(&self, module_id: u8, auth_code: u16) -> LicenseResult<()> {
        let now = Local::now();
        self.is_module_authenticated_at(module_id, auth_code, now.year(), now.month0())
    }

    /// [`Self::is_module_authenticated`] against an explicit year and zero-based month.
    pub fn is_module_authenticated_at(
        &self,
        module_id: u8,
        auth_code: u16,
        year: i32,
        month0: u32,
    ) -> LicenseResult<()> {
        let licenses = self.licenses.read().unwrap_or_else(|e| e.into_inner());
        for record in licenses.values() {
            if record.covers_module(module_id)
                && record.is_date_valid_at(year, month0)
                && record.auth_code == auth_code
            {
                return Ok(());
            }
        }
        Err(LicenseError::Unauthenticated)
    }
}
