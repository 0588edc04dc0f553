//! Built-in stores and the store registry.
//!
//! ## Configuration Format
//!
//! A store is selected by the `[store]` section of a benchmark file. `name` picks the registered
//! constructor, and every other key in the section is handed to that constructor:
//!
//! ```toml
//! [store]
//! name = "hashmap"
//! shards = 512
//! ```
//!
//! ## Built-in Stores
//!
//! - `null` ([`null::NullStore`]): accepts everything and stores nothing.
//! - `basic` ([`basic::BasicStore`]): logs every call at the info level, stores nothing.
//! - `btreemap` ([`btreemap::BTreeMapStore`]): an ordered in-memory store with scans.
//! - `hashmap` ([`hashmap::HashMapStore`]): a sharded in-memory store without scans.
//!
//! ## Registering New Stores
//!
//! To benchmark your own store, implement [`Store`]/[`StoreHandle`] for it and write a constructor
//! with the signature `fn(&toml::Table) -> Result<Arc<dyn Store>>`. Then register the constructor
//! with [`inventory`], e.g., `inventory::submit! { Registry::new("name", constructor_fn) };`, and
//! call [`crate::cmdline()`] from your `main`.
//!
//! The source code of the built-in stores are good examples of this process.

use crate::error::{Error, Result};
use crate::Store;
use hashbrown::HashMap;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use toml::Table;

/// The constructor of a registered store.
pub type Constructor = fn(&Table) -> Result<Arc<dyn Store>>;

/// The centralized registry that maps the name of a store to its constructor function.
///
/// Use the [`inventory::submit!`] macro to add an entry.
pub struct Registry<'a> {
    name: &'a str,
    constructor: Constructor,
}

impl<'a> Registry<'a> {
    pub const fn new(name: &'a str, constructor: Constructor) -> Self {
        Self { name, constructor }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }
}

inventory::collect!(Registry<'static>);

/// The `[store]` section of a benchmark file.
#[derive(Deserialize, Clone, Debug)]
pub struct StoreOpt {
    pub name: String,
    #[serde(flatten)]
    pub opt: Table,
}

/// Create the store described by `opt`.
pub fn new(opt: &StoreOpt) -> Result<Arc<dyn Store>> {
    let mut registered: HashMap<&'static str, Constructor> = HashMap::new();
    for r in inventory::iter::<Registry> {
        debug!("Adding supported store: {}", r.name);
        assert!(
            registered.insert(r.name, r.constructor).is_none(),
            "store {} registered twice",
            r.name
        );
    }
    let f = registered
        .get(opt.name.as_str())
        .ok_or_else(|| Error::UnknownStore(opt.name.clone()))?;
    f(&opt.opt)
}

/// Names of all registered stores, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = inventory::iter::<Registry>.into_iter().map(|r| r.name).collect();
    names.sort_unstable();
    names
}

/// Deserialize the options of store `name` from its TOML section.
pub fn parse_opt<T: DeserializeOwned>(name: &str, opt: &Table) -> Result<T> {
    opt.clone().try_into().map_err(|source| Error::StoreOption {
        name: name.to_string(),
        source,
    })
}

pub mod basic;
pub mod btreemap;
pub mod hashmap;
pub mod null;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, Status};

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }

    fn sorted(mut r: Record) -> Record {
        r.sort();
        r
    }

    pub(crate) fn store_test(store: &dyn Store) {
        let mut handle = store.handle();
        handle.init();
        let mut result = Record::new();

        // insert + read
        let foo = record(&[("field0", "a"), ("field1", "b")]);
        assert_eq!(handle.insert("t", "foo", &foo), Status::Ok);
        assert_eq!(handle.read("t", "foo", &[], &mut result), Status::Ok);
        assert_eq!(sorted(result.clone()), foo);

        // missing key, missing table
        result.clear();
        assert_eq!(handle.read("t", "f00", &[], &mut result), Status::NotFound);
        assert_eq!(handle.read("u", "foo", &[], &mut result), Status::NotFound);
        assert!(result.is_empty());

        // read one field
        assert_eq!(
            handle.read("t", "foo", &["field1".to_string()], &mut result),
            Status::Ok
        );
        assert_eq!(result, record(&[("field1", "b")]));

        // update overwrites only the given fields
        result.clear();
        let update = record(&[("field0", "c")]);
        assert_eq!(handle.update("t", "foo", &update), Status::Ok);
        assert_eq!(handle.read("t", "foo", &[], &mut result), Status::Ok);
        assert_eq!(sorted(result.clone()), record(&[("field0", "c"), ("field1", "b")]));
        assert_eq!(handle.update("t", "f00", &update), Status::NotFound);

        // insert replaces the whole record
        result.clear();
        assert_eq!(handle.insert("t", "foo", &update), Status::Ok);
        assert_eq!(handle.read("t", "foo", &[], &mut result), Status::Ok);
        assert_eq!(result, update);

        // delete
        result.clear();
        assert_eq!(handle.delete("t", "foo"), Status::Ok);
        assert_eq!(handle.read("t", "foo", &[], &mut result), Status::NotFound);
        assert_eq!(handle.delete("t", "foo"), Status::NotFound);
        handle.cleanup();
    }

    pub(crate) fn store_test_scan(store: &dyn Store) {
        let mut handle = store.handle();
        for i in 10000..20000 {
            let key = format!("user{}", i);
            let value = record(&[("field0", &key)]);
            assert_eq!(handle.insert("t", &key, &value), Status::Ok);
        }

        let mut result = Vec::new();
        assert_eq!(handle.scan("t", "user10000", 10000, &[], &mut result), Status::Ok);
        assert_eq!(result.len(), 10000);
        for (i, r) in result.iter().enumerate() {
            assert_eq!(r[0].1, format!("user{}", i + 10000));
        }

        // start key between two keys
        result.clear();
        assert_eq!(handle.scan("t", "user123455", 3, &[], &mut result), Status::Ok);
        let values: Vec<&str> = result.iter().map(|r| r[0].1.as_str()).collect();
        assert_eq!(values, vec!["user12346", "user12347", "user12348"]);

        // past the end
        result.clear();
        assert_eq!(handle.scan("t", "user19998", 10, &[], &mut result), Status::Ok);
        assert_eq!(result.len(), 2);

        // only the requested fields
        result.clear();
        assert_eq!(
            handle.scan("t", "user1", 5, &["field1".to_string()], &mut result),
            Status::Ok
        );
        assert_eq!(result.len(), 5);
        assert!(result.iter().all(|r| r.is_empty()));
    }

    pub(crate) fn store_test_concurrent(store: Arc<dyn Store>) {
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let mut handle = store.handle();
                    for i in 0..1000 {
                        let key = format!("user{}-{}", t, i);
                        let value = record(&[("field0", &key)]);
                        assert_eq!(handle.insert("t", &key, &value), Status::Ok);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let mut handle = store.handle();
        for t in 0..4 {
            for i in 0..1000 {
                let key = format!("user{}-{}", t, i);
                let mut result = Record::new();
                assert_eq!(handle.read("t", &key, &[], &mut result), Status::Ok);
                assert_eq!(result[0].1, key);
            }
        }
    }

    #[test]
    fn builtin_stores_registered() {
        let names = names();
        for name in ["basic", "btreemap", "hashmap", "null"] {
            assert!(names.contains(&name), "{} missing", name);
        }
    }

    #[test]
    fn unknown_store() {
        let opt = StoreOpt {
            name: "nostore".to_string(),
            opt: Table::new(),
        };
        assert!(matches!(new(&opt), Err(Error::UnknownStore(n)) if n == "nostore"));
    }

    #[test]
    fn store_from_toml() {
        let opt: StoreOpt = toml::from_str(
            r#"name = "hashmap"
               shards = 16"#,
        )
        .unwrap();
        assert_eq!(opt.opt.get("shards").and_then(|v| v.as_integer()), Some(16));
        let store = new(&opt).unwrap();
        store_test(store.as_ref());
    }

    #[test]
    fn store_with_bad_options() {
        let opt: StoreOpt = toml::from_str(
            r#"name = "hashmap"
               shards = "many""#,
        )
        .unwrap();
        assert!(matches!(new(&opt), Err(Error::StoreOption { .. })));
    }
}
