//! # Status Registry
//!
//! Maps credential identities (opaque strings, conventionally
//! `<wallet>/<achievement>`) to a permanently reserved bit index and a
//! revocation state.
//!
//! ## Invariants
//!
//! - An index is assigned once per identity and never reused, even after the
//!   identity is renamed away.
//! - `next_index` is one plus the largest index ever allocated and never
//!   decreases.
//! - No two identities share an index.
//!
//! Registries read from disk are checked against these invariants by
//! [`StatusRegistry::validate`]; a violation is reported as corruption, not
//! repaired.

use std::collections::{BTreeMap, HashMap};

use credkit_core::Timestamp;
use serde::{Deserialize, Serialize};

use crate::bitstring::Bitstring;
use crate::error::StatusError;

/// The registry record for one credential identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Reserved bit position in the status list.
    pub index: u64,
    /// Whether the credential is revoked.
    pub revoked: bool,
    /// When the credential was revoked. `None` while active.
    pub revoked_at: Option<Timestamp>,
    /// When the index was allocated.
    pub issued_at: Timestamp,
}

/// Aggregate counts over a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Registered identities.
    pub total: usize,
    /// Revoked identities.
    pub revoked: usize,
    /// Active identities.
    pub active: usize,
    /// Next index to be allocated.
    pub next_index: u64,
}

/// The persisted registry document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRegistry {
    next_index: u64,
    credentials: BTreeMap<String, StatusEntry>,
}

impl StatusRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index to be allocated.
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// The entry for `identity`.
    pub fn get(&self, identity: &str) -> Option<&StatusEntry> {
        self.credentials.get(identity)
    }

    /// Whether `identity` is registered.
    pub fn contains(&self, identity: &str) -> bool {
        self.credentials.contains_key(identity)
    }

    /// The index reserved for `identity`.
    pub fn index_of(&self, identity: &str) -> Option<u64> {
        self.get(identity).map(|e| e.index)
    }

    /// Revocation state of `identity`, `None` if unregistered.
    pub fn is_revoked(&self, identity: &str) -> Option<bool> {
        self.get(identity).map(|e| e.revoked)
    }

    /// All entries ordered by identity.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &StatusEntry)> {
        self.credentials.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered identities.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Reserve an index for `identity`. Idempotent: an already registered
    /// identity gets its existing index back and nothing changes.
    pub fn allocate_index(&mut self, identity: &str, now: Timestamp) -> u64 {
        if let Some(entry) = self.credentials.get(identity) {
            tracing::debug!(identity, index = entry.index, "status index already allocated");
            return entry.index;
        }
        let index = self.next_index;
        self.next_index += 1;
        self.credentials.insert(
            identity.to_string(),
            StatusEntry {
                index,
                revoked: false,
                revoked_at: None,
                issued_at: now,
            },
        );
        tracing::info!(identity, index, "allocated status index");
        index
    }

    /// Mark `identity` revoked. Returns false if the identity is unknown.
    /// Revoking an already revoked identity keeps its original
    /// `revoked_at`.
    pub fn revoke(&mut self, identity: &str, now: Timestamp) -> bool {
        let Some(entry) = self.credentials.get_mut(identity) else {
            return false;
        };
        if !entry.revoked {
            entry.revoked = true;
            entry.revoked_at = Some(now);
            tracing::info!(identity, index = entry.index, "revoked credential");
        }
        true
    }

    /// Clear revocation on `identity`. Returns false if the identity is
    /// unknown.
    pub fn unrevoke(&mut self, identity: &str) -> bool {
        let Some(entry) = self.credentials.get_mut(identity) else {
            return false;
        };
        if entry.revoked {
            entry.revoked = false;
            entry.revoked_at = None;
            tracing::info!(identity, index = entry.index, "unrevoked credential");
        }
        true
    }

    /// Move the entry for `from` to `to`, preserving index, state, and
    /// timestamps. Renaming an identity to itself is a no-op.
    ///
    /// # Errors
    ///
    /// `UnknownIdentity` if `from` is absent; `Conflict` if `to` exists.
    /// Neither mutates the registry.
    pub fn rename_identity(&mut self, from: &str, to: &str) -> Result<(), StatusError> {
        if from == to {
            return Ok(());
        }
        if !self.credentials.contains_key(from) {
            return Err(StatusError::UnknownIdentity(from.to_string()));
        }
        if self.credentials.contains_key(to) {
            return Err(StatusError::Conflict {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        if let Some(entry) = self.credentials.remove(from) {
            tracing::info!(from, to, index = entry.index, "renamed status entry");
            self.credentials.insert(to.to_string(), entry);
        }
        Ok(())
    }

    /// Rename every identity starting with `old_prefix` to start with
    /// `new_prefix` instead. Entries whose new identity already exists are
    /// skipped. Returns the number of entries moved.
    pub fn rename_all_with_prefix(&mut self, old_prefix: &str, new_prefix: &str) -> usize {
        if old_prefix == new_prefix {
            return 0;
        }
        let candidates: Vec<(String, String)> = self
            .credentials
            .keys()
            .filter_map(|id| {
                id.strip_prefix(old_prefix)
                    .map(|rest| (id.clone(), format!("{new_prefix}{rest}")))
            })
            .collect();

        let mut moved = 0;
        for (from, to) in candidates {
            match self.rename_identity(&from, &to) {
                Ok(()) => moved += 1,
                Err(e) => tracing::warn!(%from, %to, error = %e, "skipping rename"),
            }
        }
        moved
    }

    /// Build a bitstring of `size_bytes` bytes with a bit set for every
    /// revoked entry.
    pub fn to_bitstring(&self, size_bytes: usize) -> Result<Bitstring, StatusError> {
        let mut bits = Bitstring::new(size_bytes);
        for entry in self.credentials.values().filter(|e| e.revoked) {
            bits.set(entry.index, true)?;
        }
        Ok(bits)
    }

    /// Aggregate counts.
    pub fn stats(&self) -> RegistryStats {
        let revoked = self.credentials.values().filter(|e| e.revoked).count();
        RegistryStats {
            total: self.credentials.len(),
            revoked,
            active: self.credentials.len() - revoked,
            next_index: self.next_index,
        }
    }

    /// Check the index invariants.
    pub fn validate(&self) -> Result<(), StatusError> {
        let mut seen: HashMap<u64, &str> = HashMap::new();
        for (id, entry) in &self.credentials {
            if entry.index >= self.next_index {
                return Err(StatusError::CorruptRegistry(format!(
                    "{id} has index {} but next_index is {}",
                    entry.index, self.next_index
                )));
            }
            if let Some(other) = seen.insert(entry.index, id) {
                return Err(StatusError::CorruptRegistry(format!(
                    "index {} is held by both {other} and {id}",
                    entry.index
                )));
            }
            if entry.revoked != entry.revoked_at.is_some() {
                tracing::warn!(identity = %id, "revoked flag and revoked_at disagree");
            }
        }
        Ok(())
    }
}
