#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! A YCSB-style benchmark engine for pluggable stores.
//!
//! `ycsb-bench` loads a store with records, then runs a timed, statistically controlled mix of
//! read/update/insert/scan/read-modify-write transactions against it from multiple threads, and
//! reports the throughput in thousand transactions per second (KTPS).
//!
//! The workload is configured with the classic YCSB knobs (`recordcount`, `readproportion`,
//! `requestdistribution`, ...) in a TOML file. Stores are black boxes behind the [`Store`] and
//! [`StoreHandle`] traits, created by name from a registry. You can benchmark your own store by
//! implementing the traits, registering a constructor, and calling [`cmdline()`] from your own
//! `main`.
//!
//! A few key design choices include:
//!
//! - One workload instance is shared by every worker, so the key popularity distribution is
//! global. All generators synchronize internally, and each worker brings its own RNG.
//! - Each worker gets its own store handle; a handle is never shared between threads.
//! - Configuration errors are reported before any worker starts. Failed store operations only
//! show up in the success tally, they are never retried.
//!
//! More detailed usage could be found in the module-level rustdocs:
//!
//! - [`mod@workload`] for the workload knobs.
//! - [`mod@generator`] for the value generators.
//! - [`mod@bench`] for the benchmark config and output format.
//! - [`mod@stores`] for the built-in stores.
//! - [`cmdline()`] for the usage of the default command line interface.

use std::fmt;

/// A `(field name, field value)` pair.
pub type Field = (String, String);

/// An ordered list of fields.
pub type Record = Vec<Field>;

/// The outcome of a store operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Status {
    Ok,
    Error,
    NotFound,
    NotImplemented,
    UnexpectedState,
    BadRequest,
    Forbidden,
    ServiceUnavailable,
    BatchedOk,
}

impl Status {
    /// Only `Ok` and `BatchedOk` count as a success.
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok | Status::BatchedOk)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
            Status::NotFound => "NOT_FOUND",
            Status::NotImplemented => "NOT_IMPLEMENTED",
            Status::UnexpectedState => "UNEXPECTED_STATE",
            Status::BadRequest => "BAD_REQUEST",
            Status::Forbidden => "FORBIDDEN",
            Status::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Status::BatchedOk => "BATCHED_OK",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Status::Ok => "The operation completed successfully.",
            Status::Error => "The operation failed.",
            Status::NotFound => "The requested record was not found.",
            Status::NotImplemented => "The operation is not implemented for the current binding.",
            Status::UnexpectedState => {
                "The operation reported success, but the result was not as expected."
            }
            Status::BadRequest => "The request was not valid.",
            Status::Forbidden => "The operation is forbidden.",
            Status::ServiceUnavailable => {
                "Dependant service for the current binding is not available."
            }
            Status::BatchedOk => "The operation has been batched by the binding to be executed later.",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The kinds of transactions a workload can issue.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    /// Insert a new record at the next sequence key.
    Insert,
    /// Read one field or all fields of a record.
    Read,
    /// Overwrite one field or all fields of a record.
    Update,
    /// Read a range of records starting from a key.
    Scan,
    /// Read a record, then update it.
    ReadModifyWrite,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Insert,
        Operation::Read,
        Operation::Update,
        Operation::Scan,
        Operation::ReadModifyWrite,
    ];

    pub fn index(&self) -> usize {
        match self {
            Operation::Insert => 0,
            Operation::Read => 1,
            Operation::Update => 2,
            Operation::Scan => 3,
            Operation::ReadModifyWrite => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert => "insert",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Scan => "scan",
            Operation::ReadModifyWrite => "readmodifywrite",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A thread-safe store that can be benchmarked.
///
/// The store itself is shared by the harness; each worker thread asks for its own
/// [`StoreHandle`] and only talks to the store through it. For most in-process stores, the handle
/// can just be a clone of an [`std::sync::Arc`].
pub trait Store: Send + Sync + 'static {
    /// Create a handle owned by one worker thread.
    fn handle(&self) -> Box<dyn StoreHandle>;

    fn thread(&self) -> Box<dyn crate::thread::Thread> {
        Box::new(crate::thread::DefaultThread)
    }
}

/// A per-thread handle that references a [`Store`].
///
/// An empty `fields` slice means "all fields".
pub trait StoreHandle {
    /// Called once by the worker before its first operation.
    fn init(&mut self) {}

    /// Called once by the worker after its last operation.
    fn cleanup(&mut self) {}

    /// Read a record; the requested fields are appended to `result`.
    fn read(&mut self, table: &str, key: &str, fields: &[String], result: &mut Record) -> Status;

    /// Read up to `count` records in key order, starting from the first key greater than or
    /// equal to `start_key`.
    fn scan(
        &mut self,
        table: &str,
        start_key: &str,
        count: usize,
        fields: &[String],
        result: &mut Vec<Record>,
    ) -> Status;

    /// Overwrite the given fields of an existing record.
    fn update(&mut self, table: &str, key: &str, values: &Record) -> Status;

    /// Insert a record, replacing any record with the same key.
    fn insert(&mut self, table: &str, key: &str, values: &Record) -> Status;

    /// Remove a record.
    fn delete(&mut self, table: &str, key: &str) -> Status;
}

pub mod bench;
pub mod client;
mod cmdline;
pub mod error;
pub mod generator;
pub mod properties;
pub mod stores;
pub mod thread;
pub mod workload;

pub use cmdline::cmdline;
pub use error::{Error, Result};

pub extern crate inventory;
pub extern crate toml;
