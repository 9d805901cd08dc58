//! # Object Store
//!
//! Identifier -> (vector, properties) mapping owned by a collection.
//!
//! Each object also gets a dense internal `DocId` in insertion order. The
//! vector index only knows doc ids; the store translates them back into
//! object identifiers when results are assembled.
//!
//! The store keeps the vector exactly as the caller supplied it. Indices may
//! hold a prepared copy (normalized for cosine), so near-object queries must
//! resolve through here to see the same input a near-vector query would.
//!
//! Not synchronized on its own: the owning `Collection` guards it together
//! with its index.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use neardb_core::error::{Error, Result};
use neardb_core::{ObjectId, ObjectRecord, Properties};
use neardb_index::DocId;

/// Stored payload of one object
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Internal insertion sequence number, also the index key
    pub doc_id: DocId,
    /// Vector as supplied on insert
    pub vector: Vec<f32>,
    pub properties: Properties,
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, StoredObject>,
    /// doc_id -> object id
    doc_ids: Vec<ObjectId>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            objects: HashMap::with_capacity(capacity),
            doc_ids: Vec::with_capacity(capacity),
        }
    }

    /// Doc id the next successful insert will receive
    pub fn next_doc_id(&self) -> DocId {
        self.doc_ids.len() as DocId
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Store a new object, returning its doc id
    pub fn insert(
        &mut self,
        id: ObjectId,
        vector: Vec<f32>,
        properties: Properties,
    ) -> Result<DocId> {
        let doc_id = self.next_doc_id();
        match self.objects.entry(id) {
            Entry::Occupied(_) => Err(Error::AlreadyExists { id: id.to_string() }),
            Entry::Vacant(entry) => {
                entry.insert(StoredObject {
                    doc_id,
                    vector,
                    properties,
                });
                self.doc_ids.push(id);
                Ok(doc_id)
            }
        }
    }

    pub fn get(&self, id: &ObjectId) -> Option<&StoredObject> {
        self.objects.get(id)
    }

    /// Fetch an object as a record, with the vector only when asked for
    pub fn fetch(&self, id: &ObjectId, include_vector: bool) -> Result<ObjectRecord> {
        let object = self.get(id).ok_or_else(|| Error::not_found(id))?;
        Ok(ObjectRecord {
            id: *id,
            vector: include_vector.then(|| object.vector.clone()),
            properties: object.properties.clone(),
        })
    }

    /// Vector of a stored object
    pub fn vector(&self, id: &ObjectId) -> Result<&[f32]> {
        self.get(id)
            .map(|object| object.vector.as_slice())
            .ok_or_else(|| Error::not_found(id))
    }

    /// Translate an index doc id back into the object it belongs to
    pub fn resolve(&self, doc_id: DocId) -> Option<(ObjectId, &StoredObject)> {
        let id = *self.doc_ids.get(usize::try_from(doc_id).ok()?)?;
        self.objects.get(&id).map(|object| (id, object))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &StoredObject)> + '_ {
        self.doc_ids
            .iter()
            .filter_map(|id| self.objects.get(id).map(|object| (*id, object)))
    }
}
