//! A sharded in-memory store on top of [`hashbrown::HashMap`].
//!
//! ## Configuration Format
//!
//! ``` toml
//! [store]
//! name = "hashmap"
//! shards = ... # number of shards
//! ```
//!
//! Keys are spread over `shards` independently locked maps by their hash. There is no key order,
//! so scans return [`Status::NotImplemented`].

use crate::error::{Error, Result};
use crate::stores::{parse_opt, Registry};
use crate::*;
use hashbrown::hash_map::DefaultHashBuilder;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::Deserialize;
use std::hash::BuildHasher;
use std::sync::Arc;

type Fields = HashMap<String, String>;

/// One shard: table name to key to record.
type Shard = HashMap<String, HashMap<String, Fields>>;

#[derive(Deserialize, Debug)]
pub struct HashMapStoreOpt {
    pub shards: usize,
}

#[derive(Clone)]
pub struct HashMapStore {
    hasher: DefaultHashBuilder,
    shards: Arc<Vec<RwLock<Shard>>>,
}

impl HashMapStore {
    pub fn new(opt: &HashMapStoreOpt) -> Result<Self> {
        if opt.shards == 0 {
            return Err(Error::InvalidValue {
                key: "shards".to_string(),
                value: "0".to_string(),
                expected: "a positive integer",
            });
        }
        let shards = (0..opt.shards).map(|_| RwLock::new(Shard::new())).collect();
        Ok(Self {
            hasher: DefaultHashBuilder::default(),
            shards: Arc::new(shards),
        })
    }

    pub fn new_store(opt: &toml::Table) -> Result<Arc<dyn Store>> {
        let opt: HashMapStoreOpt = parse_opt("hashmap", opt)?;
        Ok(Arc::new(Self::new(&opt)?))
    }

    fn shard(&self, key: &str) -> &RwLock<Shard> {
        let hash = self.hasher.hash_one(key) as usize;
        &self.shards[hash % self.shards.len()]
    }
}

impl Store for HashMapStore {
    fn handle(&self) -> Box<dyn StoreHandle> {
        Box::new(self.clone())
    }
}

impl StoreHandle for HashMapStore {
    fn read(&mut self, table: &str, key: &str, fields: &[String], result: &mut Record) -> Status {
        let shard = self.shard(key).read();
        let Some(record) = shard.get(table).and_then(|t| t.get(key)) else {
            return Status::NotFound;
        };
        match fields.is_empty() {
            true => result.extend(record.iter().map(|(f, v)| (f.clone(), v.clone()))),
            false => {
                for f in fields.iter() {
                    if let Some(v) = record.get(f) {
                        result.push((f.clone(), v.clone()));
                    }
                }
            }
        }
        Status::Ok
    }

    fn scan(
        &mut self,
        _table: &str,
        _start_key: &str,
        _count: usize,
        _fields: &[String],
        _result: &mut Vec<Record>,
    ) -> Status {
        Status::NotImplemented
    }

    fn update(&mut self, table: &str, key: &str, values: &Record) -> Status {
        let mut shard = self.shard(key).write();
        match shard.get_mut(table).and_then(|t| t.get_mut(key)) {
            Some(record) => {
                record.extend(values.iter().cloned());
                Status::Ok
            }
            None => Status::NotFound,
        }
    }

    fn insert(&mut self, table: &str, key: &str, values: &Record) -> Status {
        let record: Fields = values.iter().cloned().collect();
        let mut shard = self.shard(key).write();
        shard
            .entry_ref(table)
            .or_default()
            .insert(key.to_string(), record);
        Status::Ok
    }

    fn delete(&mut self, table: &str, key: &str) -> Status {
        let mut shard = self.shard(key).write();
        match shard.get_mut(table).and_then(|t| t.remove(key)) {
            Some(_) => Status::Ok,
            None => Status::NotFound,
        }
    }
}

inventory::submit! {
    Registry::new("hashmap", HashMapStore::new_store)
}
