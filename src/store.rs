//! Named buckets of JSON records over a string key-value store.
//!
//! A bucket holds one encoded array. `read_all` never fails: a missing key,
//! a backend error or an undecodable body all read as an empty list.
//! Writes are stricter. `update` only starts from an empty list when the
//! key is absent or its body is malformed, and gives up on a backend read
//! error so stored records are never overwritten.
//!
//! `append` is a read followed by a write with nothing held in between,
//! so two writers appending to the same bucket at once race and the last
//! write wins.

use std::{
    fmt,
    marker::PhantomData,
};
use log::warn;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;


#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketKey {
    NavbarReports,
    CommunityReports,
    SafetyReports,
    SafetyRatings,
    SosAlerts,
    EmergencyContacts,
}

impl BucketKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKey::NavbarReports => "navbarReports",
            BucketKey::CommunityReports => "communityReports",
            BucketKey::SafetyReports => "safetyReports",
            BucketKey::SafetyRatings => "safetyRatings",
            BucketKey::SosAlerts => "sosAlerts",
            BucketKey::EmergencyContacts => "emergencyContacts",
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}


pub trait BucketStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, body: &str) -> Result<()>;
}


#[cfg(test)]
pub use self::memory::MemoryStore;



pub struct Bucket<'s, T> {
    store: &'s dyn BucketStore,
    key: BucketKey,
    record: PhantomData<T>,
}

impl<'s, T> Bucket<'s, T> where
    T: Serialize + DeserializeOwned {

    pub fn new(store: &'s dyn BucketStore, key: BucketKey) -> Self {
        Bucket {
            store,
            key,
            record: PhantomData,
        }
    }

    pub fn read_all(&self) -> Vec<T> {
        self.read_stored().unwrap_or_else(|err| {
            warn!("Fail to read bucket {}: {}", self.key, err);
            Vec::new()
        })
    }

    fn read_stored(&self) -> Result<Vec<T>> {
        let body = match self.store.get(self.key.as_str())? {
            Some(body) => body,
            None => return Ok(Vec::new()),
        };

        match serde_json::from_str::<Vec<T>>(&body) {
            Ok(records) => Ok(records),
            Err(err) => {
                warn!("Bucket {} is malformed, reading as empty: {}", self.key, err);
                Ok(Vec::new())
            },
        }
    }

    pub fn write_all(&self, records: &[T]) -> Result<()> {
        let body = serde_json::to_string(records)?;
        self.store.set(self.key.as_str(), &body)
    }

    /// Puts `record` in front of the stored records and writes the list back.
    pub fn append(&self, record: T) -> Result<Vec<T>> {
        self.update(|records| records.insert(0, record))
            .map(|(records, _)| records)
    }

    /// Puts `record` after the stored records and writes the list back.
    pub fn push_back(&self, record: T) -> Result<Vec<T>> {
        self.update(|records| records.push(record))
            .map(|(records, _)| records)
    }

    pub fn update<F, R>(&self, job: F) -> Result<(Vec<T>, R)> where
        F: FnOnce(&mut Vec<T>) -> R {

        let mut records = self.read_stored()?;
        let result = job(&mut records);
        self.write_all(&records)?;
        Ok((records, result))
    }
}
