//! A store that does nothing.
//!
//! ## Configuration Format
//!
//! ``` toml
//! [store]
//! name = "null"
//! ```
//!
//! Every operation returns [`Status::Ok`] without touching any data, so a benchmark against it
//! measures the overhead of the workload and the harness alone.

use crate::error::Result;
use crate::stores::Registry;
use crate::*;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct NullStore;

impl NullStore {
    pub fn new() -> Self {
        Self
    }

    pub fn new_store(_opt: &toml::Table) -> Result<Arc<dyn Store>> {
        Ok(Arc::new(Self::new()))
    }
}

impl Store for NullStore {
    fn handle(&self) -> Box<dyn StoreHandle> {
        Box::new(self.clone())
    }
}

impl StoreHandle for NullStore {
    fn read(&mut self, _table: &str, _key: &str, _fields: &[String], _: &mut Record) -> Status {
        Status::Ok
    }

    fn scan(
        &mut self,
        _table: &str,
        _start_key: &str,
        _count: usize,
        _fields: &[String],
        _: &mut Vec<Record>,
    ) -> Status {
        Status::Ok
    }

    fn update(&mut self, _table: &str, _key: &str, _values: &Record) -> Status {
        Status::Ok
    }

    fn insert(&mut self, _table: &str, _key: &str, _values: &Record) -> Status {
        Status::Ok
    }

    fn delete(&mut self, _table: &str, _key: &str) -> Status {
        Status::Ok
    }
}

inventory::submit! {
    Registry::new("null", NullStore::new_store)
}
