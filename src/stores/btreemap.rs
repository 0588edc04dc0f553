//! An ordered in-memory store on top of [`std::collections::BTreeMap`].
//!
//! ## Configuration Format
//!
//! ``` toml
//! [store]
//! name = "btreemap"
//! ```
//!
//! Each table is a [`BTreeMap`] from key to record, all behind one [`RwLock`]. Keys are kept in
//! byte order, so this store supports scans.

use crate::error::Result;
use crate::stores::Registry;
use crate::*;
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

type Fields = HashMap<String, String>;

type Records = BTreeMap<String, Fields>;

fn project(fields: &Fields, wanted: &[String], result: &mut Record) {
    match wanted.is_empty() {
        true => result.extend(fields.iter().map(|(f, v)| (f.clone(), v.clone()))),
        false => {
            for f in wanted.iter() {
                if let Some(v) = fields.get(f) {
                    result.push((f.clone(), v.clone()));
                }
            }
        }
    }
}

#[derive(Clone, Default)]
pub struct BTreeMapStore(Arc<RwLock<HashMap<String, Records>>>);

impl BTreeMapStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_store(_opt: &toml::Table) -> Result<Arc<dyn Store>> {
        Ok(Arc::new(Self::new()))
    }
}

impl Store for BTreeMapStore {
    fn handle(&self) -> Box<dyn StoreHandle> {
        Box::new(self.clone())
    }
}

impl StoreHandle for BTreeMapStore {
    fn read(&mut self, table: &str, key: &str, fields: &[String], result: &mut Record) -> Status {
        let tables = self.0.read();
        match tables.get(table).and_then(|t| t.get(key)) {
            Some(record) => {
                project(record, fields, result);
                Status::Ok
            }
            None => Status::NotFound,
        }
    }

    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        count: usize,
        fields: &[String],
        result: &mut Vec<Record>,
    ) -> Status {
        let tables = self.0.read();
        let Some(t) = tables.get(table) else {
            return Status::NotFound;
        };
        let range = t.range::<str, _>((Bound::Included(start_key), Bound::Unbounded));
        for (_, record) in range.take(count) {
            let mut r = Record::new();
            project(record, fields, &mut r);
            result.push(r);
        }
        Status::Ok
    }

    fn update(&mut self, table: &str, key: &str, values: &Record) -> Status {
        let mut tables = self.0.write();
        match tables.get_mut(table).and_then(|t| t.get_mut(key)) {
            Some(record) => {
                record.extend(values.iter().cloned());
                Status::Ok
            }
            None => Status::NotFound,
        }
    }

    fn insert(&mut self, table: &str, key: &str, values: &Record) -> Status {
        let record: Fields = values.iter().cloned().collect();
        self.0
            .write()
            .entry_ref(table)
            .or_default()
            .insert(key.to_string(), record);
        Status::Ok
    }

    fn delete(&mut self, table: &str, key: &str) -> Status {
        let mut tables = self.0.write();
        match tables.get_mut(table).and_then(|t| t.remove(key)) {
            Some(_) => Status::Ok,
            None => Status::NotFound,
        }
    }
}

inventory::submit! {
    Registry::new("btreemap", BTreeMapStore::new_store)
}
