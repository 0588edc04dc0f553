//! A store that logs every call.
//!
//! ## Configuration Format
//!
//! ``` toml
//! [store]
//! name = "basic"
//! ```
//!
//! Nothing is stored and every operation returns [`Status::Ok`]. Each call is written to the log
//! at the info level (run with `RUST_LOG=info` to see it), which is handy for checking what a
//! workload actually sends to a store.

use crate::error::Result;
use crate::stores::Registry;
use crate::*;
use log::info;
use std::sync::Arc;

#[derive(Clone, Debug, Default)]
pub struct BasicStore;

impl BasicStore {
    pub fn new() -> Self {
        Self
    }

    pub fn new_store(_opt: &toml::Table) -> Result<Arc<dyn Store>> {
        Ok(Arc::new(Self::new()))
    }
}

fn fields_str(fields: &[String]) -> String {
    match fields.is_empty() {
        true => "<all fields>".to_string(),
        false => format!("[ {} ]", fields.join(" ")),
    }
}

fn values_str(values: &Record) -> String {
    let pairs: Vec<String> = values.iter().map(|(f, v)| format!("{}={}", f, v)).collect();
    format!("[ {} ]", pairs.join(" "))
}

impl Store for BasicStore {
    fn handle(&self) -> Box<dyn StoreHandle> {
        Box::new(self.clone())
    }
}

impl StoreHandle for BasicStore {
    fn init(&mut self) {
        info!("A new thread begins working");
    }

    fn read(&mut self, table: &str, key: &str, fields: &[String], _: &mut Record) -> Status {
        info!("READ {} {} {}", table, key, fields_str(fields));
        Status::Ok
    }

    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        count: usize,
        fields: &[String],
        _: &mut Vec<Record>,
    ) -> Status {
        info!(
            "SCAN {} {} {} {}",
            table,
            start_key,
            count,
            fields_str(fields)
        );
        Status::Ok
    }

    fn update(&mut self, table: &str, key: &str, values: &Record) -> Status {
        info!("UPDATE {} {} {}", table, key, values_str(values));
        Status::Ok
    }

    fn insert(&mut self, table: &str, key: &str, values: &Record) -> Status {
        info!("INSERT {} {} {}", table, key, values_str(values));
        Status::Ok
    }

    fn delete(&mut self, table: &str, key: &str) -> Status {
        info!("DELETE {} {}", table, key);
        Status::Ok
    }
}

inventory::submit! {
    Registry::new("basic", BasicStore::new_store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        assert_eq!(fields_str(&[]), "<all fields>");
        assert_eq!(
            fields_str(&["field0".to_string(), "field3".to_string()]),
            "[ field0 field3 ]"
        );
        let values = vec![("field0".to_string(), "abc".to_string())];
        assert_eq!(values_str(&values), "[ field0=abc ]");
    }

    #[test]
    fn everything_succeeds() {
        let _ = env_logger::try_init();
        let mut handle = BasicStore::new().handle();
        handle.init();
        let values = vec![("field0".to_string(), "abc".to_string())];
        assert_eq!(handle.insert("t", "k", &values), Status::Ok);
        assert_eq!(handle.update("t", "k", &values), Status::Ok);
        let mut result = Vec::new();
        assert_eq!(handle.scan("t", "k", 10, &[], &mut result), Status::Ok);
        assert!(result.is_empty());
    }
}
