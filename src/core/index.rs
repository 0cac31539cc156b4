//! estateID -> content address index.
//!
//! The index is an ordered map: entries keep processing order, and the
//! flushed JSON object lists keys in that same order.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::ContentAddress;

/// Ordered mapping from estateID to content address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMap {
    entries: Vec<(u32, ContentAddress)>,
}

impl IndexMap {
    /// Insert or overwrite; an overwritten key keeps its original position
    fn insert(&mut self, estate_id: u32, address: ContentAddress) {
        match self.entries.iter_mut().find(|(id, _)| *id == estate_id) {
            Some(entry) => entry.1 = address,
            None => self.entries.push((estate_id, address)),
        }
    }

    pub fn get(&self, estate_id: u32) -> Option<&ContentAddress> {
        self.entries
            .iter()
            .find(|(id, _)| *id == estate_id)
            .map(|(_, address)| address)
    }

    pub fn contains(&self, estate_id: u32) -> bool {
        self.get(estate_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &ContentAddress)> {
        self.entries.iter().map(|(id, address)| (*id, address))
    }

    /// Estate ids in processing order
    pub fn keys(&self) -> Vec<u32> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    /// Parse a flushed index file
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Serialize for IndexMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, address) in &self.entries {
            map.serialize_entry(&id.to_string(), address)?;
        }
        map.end()
    }
}

struct IndexMapVisitor;

impl<'de> Visitor<'de> for IndexMapVisitor {
    type Value = IndexMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping estate ids to content addresses")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<IndexMap, A::Error> {
        let mut index = IndexMap::default();
        while let Some((key, address)) = access.next_entry::<String, ContentAddress>()? {
            let estate_id = key
                .parse::<u32>()
                .map_err(|_| de::Error::custom(format!("invalid estate id key: {:?}", key)))?;
            index.insert(estate_id, address);
        }
        Ok(index)
    }
}

impl<'de> Deserialize<'de> for IndexMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IndexMapVisitor)
    }
}

/// Accumulates index entries for one run and snapshots them once
#[derive(Debug, Default)]
pub struct IndexWriter {
    map: IndexMap,
}

impl IndexWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a published record
    pub fn record(&mut self, estate_id: u32, address: ContentAddress) {
        self.map.insert(estate_id, address);
    }

    pub fn map(&self) -> &IndexMap {
        &self.map
    }

    /// Full snapshot as pretty-printed JSON, keys in processing order
    pub fn flush(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(&self.map)
    }

    pub fn into_map(self) -> IndexMap {
        self.map
    }
}
