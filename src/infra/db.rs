//! Embedded document store.
//!
//! A single sled keyspace holds every document in the system, keyed by id
//! and serialized as JSON. Posts and comments share the keyspace, exactly
//! as they share one database file on disk; upper layers tell them apart by
//! shape. The handle is opened once at startup and owned explicitly by the
//! components it is passed to, for the process lifetime.

use std::path::Path;

use serde_json::Value;

use super::error::InfraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Generic embedded persistence: get/put/delete by key plus a filtered,
/// sorted scan. Every write replaces the whole document; there is no
/// partial-field update primitive.
pub struct DocumentStore {
    db: sled::Db,
}

impl DocumentStore {
    /// Open (or create) the store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, InfraError> {
        let db = sled::open(dir.as_ref()).map_err(InfraError::database)?;
        Ok(Self { db })
    }

    /// Fetch one document. Absence is a normal result, not an error.
    pub fn get(&self, id: &str) -> Result<Option<Value>, InfraError> {
        let Some(raw) = self.db.get(id).map_err(InfraError::database)? else {
            return Ok(None);
        };
        let document = serde_json::from_slice(&raw).map_err(|err| InfraError::corrupt(id, err))?;
        Ok(Some(document))
    }

    /// Create or replace one document. Atomic for the single document.
    pub fn put(&self, id: &str, document: &Value) -> Result<(), InfraError> {
        let raw = serde_json::to_vec(document).map_err(InfraError::serialization)?;
        self.db.insert(id, raw).map_err(InfraError::database)?;
        self.db.flush().map_err(InfraError::database)?;
        Ok(())
    }

    /// Remove one document. Removing an absent id is not an error.
    pub fn delete(&self, id: &str) -> Result<(), InfraError> {
        self.db.remove(id).map_err(InfraError::database)?;
        self.db.flush().map_err(InfraError::database)?;
        Ok(())
    }

    /// Scan all documents, keep those matching `predicate`, ordered by the
    /// extracted sort key. The underlying iterator is scoped to this call
    /// and released on every exit path.
    pub fn query<P, K, O>(
        &self,
        mut predicate: P,
        mut sort_key: K,
        direction: SortDirection,
    ) -> Result<Vec<(String, Value)>, InfraError>
    where
        P: FnMut(&Value) -> bool,
        K: FnMut(&Value) -> O,
        O: Ord,
    {
        let mut rows = Vec::new();
        for entry in self.db.iter() {
            let (key, raw) = entry.map_err(InfraError::database)?;
            let id = String::from_utf8(key.to_vec())
                .map_err(|err| InfraError::corrupt("<non-utf8 key>", err))?;
            let document: Value =
                serde_json::from_slice(&raw).map_err(|err| InfraError::corrupt(&id, err))?;
            if predicate(&document) {
                let ord = sort_key(&document);
                rows.push((ord, id, document));
            }
        }

        rows.sort_by(|a, b| match direction {
            SortDirection::Ascending => a.0.cmp(&b.0),
            SortDirection::Descending => b.0.cmp(&a.0),
        });

        Ok(rows.into_iter().map(|(_, id, document)| (id, document)).collect())
    }
}
