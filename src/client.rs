//! One worker's session against a store.
//!
//! A [`Client`] owns a store handle and an RNG, and borrows the shared [`CoreWorkload`] through an
//! [`Arc`]. The harness creates one client per worker thread and drives it with
//! [`Client::do_insert`] during the load phase and [`Client::do_transaction_op`] during the
//! transaction phase.

use crate::workload::CoreWorkload;
use crate::{Operation, Record, Status, StoreHandle};
use rand::rngs::SmallRng;
use std::sync::Arc;

pub struct Client {
    handle: Box<dyn StoreHandle>,
    workload: Arc<CoreWorkload>,
    rng: SmallRng,
}

impl Client {
    pub fn new(handle: Box<dyn StoreHandle>, workload: Arc<CoreWorkload>, rng: SmallRng) -> Self {
        Self {
            handle,
            workload,
            rng,
        }
    }

    pub fn init(&mut self) {
        self.handle.init();
    }

    pub fn cleanup(&mut self) {
        self.handle.cleanup();
    }

    /// Insert the next record of the load phase. Returns whether the store accepted it.
    pub fn do_insert(&mut self) -> bool {
        let key = self.workload.next_sequence_key(&mut self.rng);
        let mut values = Record::with_capacity(self.workload.field_count());
        self.workload.build_values(&mut self.rng, &mut values);
        self.handle
            .insert(self.workload.table(), &key, &values)
            .is_ok()
    }

    /// Run one transaction. Returns whether the store reported success.
    pub fn do_transaction(&mut self) -> bool {
        self.do_transaction_op().1.is_ok()
    }

    /// Run one transaction, returning what was run and how it went.
    pub fn do_transaction_op(&mut self) -> (Operation, Status) {
        let op = self.workload.next_operation(&mut self.rng);
        let status = match op {
            Operation::Read => self.transaction_read(),
            Operation::Update => self.transaction_update(),
            Operation::Insert => self.transaction_insert(),
            Operation::Scan => self.transaction_scan(),
            Operation::ReadModifyWrite => self.transaction_read_modify_write(),
        };
        (op, status)
    }

    /// An empty list asks for all fields.
    fn read_fields(&mut self) -> Vec<String> {
        match self.workload.read_all_fields() {
            true => Vec::new(),
            false => vec![self.workload.next_field_name(&mut self.rng)],
        }
    }

    fn update_values(&mut self) -> Record {
        let mut values = Record::new();
        match self.workload.write_all_fields() {
            true => self.workload.build_values(&mut self.rng, &mut values),
            false => self.workload.build_update(&mut self.rng, &mut values),
        }
        values
    }

    fn transaction_read(&mut self) -> Status {
        let key = self.workload.next_transaction_key(&mut self.rng);
        let fields = self.read_fields();
        let mut result = Record::new();
        self.handle
            .read(self.workload.table(), &key, &fields, &mut result)
    }

    fn transaction_update(&mut self) -> Status {
        let key = self.workload.next_transaction_key(&mut self.rng);
        let values = self.update_values();
        self.handle.update(self.workload.table(), &key, &values)
    }

    fn transaction_insert(&mut self) -> Status {
        let number = self.workload.next_sequence_number(&mut self.rng);
        let key = self.workload.build_key_name(number);
        let mut values = Record::with_capacity(self.workload.field_count());
        self.workload.build_values(&mut self.rng, &mut values);
        let status = self.handle.insert(self.workload.table(), &key, &values);
        if status.is_ok() {
            self.workload.acknowledge_insert(number);
        }
        status
    }

    fn transaction_scan(&mut self) -> Status {
        let start_key = self.workload.next_transaction_key(&mut self.rng);
        let count = self.workload.next_scan_length(&mut self.rng);
        let fields = self.read_fields();
        let mut result = Vec::new();
        self.handle.scan(
            self.workload.table(),
            &start_key,
            count,
            &fields,
            &mut result,
        )
    }

    fn transaction_read_modify_write(&mut self) -> Status {
        let key = self.workload.next_transaction_key(&mut self.rng);
        let fields = self.read_fields();
        let values = self.update_values();
        let mut result = Record::new();
        // the write goes ahead whatever the read returned
        let _ = self
            .handle
            .read(self.workload.table(), &key, &fields, &mut result);
        self.handle.update(self.workload.table(), &key, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Properties;
    use parking_lot::Mutex;
    use rand::SeedableRng;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init,
        Cleanup,
        Read(String, String, Vec<String>),
        Scan(String, usize, Vec<String>),
        Update(String, Record),
        Insert(String, Record),
    }

    /// Records every call and answers with a fixed status.
    struct RecordingHandle {
        calls: Arc<Mutex<Vec<Call>>>,
        read_status: Status,
        write_status: Status,
    }

    impl StoreHandle for RecordingHandle {
        fn init(&mut self) {
            self.calls.lock().push(Call::Init);
        }

        fn cleanup(&mut self) {
            self.calls.lock().push(Call::Cleanup);
        }

        fn read(&mut self, table: &str, key: &str, fields: &[String], _: &mut Record) -> Status {
            self.calls
                .lock()
                .push(Call::Read(table.into(), key.into(), fields.to_vec()));
            self.read_status
        }

        fn scan(
            &mut self,
            _: &str,
            start_key: &str,
            count: usize,
            fields: &[String],
            _: &mut Vec<Record>,
        ) -> Status {
            self.calls
                .lock()
                .push(Call::Scan(start_key.into(), count, fields.to_vec()));
            self.read_status
        }

        fn update(&mut self, _: &str, key: &str, values: &Record) -> Status {
            self.calls
                .lock()
                .push(Call::Update(key.into(), values.clone()));
            self.write_status
        }

        fn insert(&mut self, _: &str, key: &str, values: &Record) -> Status {
            self.calls
                .lock()
                .push(Call::Insert(key.into(), values.clone()));
            self.write_status
        }

        fn delete(&mut self, _: &str, _: &str) -> Status {
            Status::NotImplemented
        }
    }

    fn client(
        workload: &str,
        read_status: Status,
        write_status: Status,
    ) -> (Client, Arc<CoreWorkload>, Arc<Mutex<Vec<Call>>>) {
        let props = Properties::from_toml_str(workload).unwrap();
        let workload = Arc::new(CoreWorkload::new(&props).unwrap());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handle = Box::new(RecordingHandle {
            calls: calls.clone(),
            read_status,
            write_status,
        });
        let rng = SmallRng::seed_from_u64(0);
        (Client::new(handle, workload.clone(), rng), workload, calls)
    }

    #[test]
    fn load_inserts() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               fieldcount = 3
               insertorder = "ordered""#,
            Status::Ok,
            Status::Ok,
        );
        c.init();
        assert!(c.do_insert());
        assert!(c.do_insert());
        c.cleanup();
        let calls = calls.lock();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], Call::Init);
        match &calls[1] {
            Call::Insert(key, values) => {
                assert_eq!(key, "user0");
                assert_eq!(values.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(&calls[2], Call::Insert(key, _) if key == "user1"));
        assert_eq!(calls[3], Call::Cleanup);
    }

    #[test]
    fn failed_insert() {
        let (mut c, _, _) = client("recordcount = 10", Status::Ok, Status::Error);
        assert!(!c.do_insert());
        let (mut c, _, _) = client("recordcount = 10", Status::Ok, Status::BatchedOk);
        assert!(c.do_insert());
    }

    #[test]
    fn read_one_field() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               readproportion = 1
               updateproportion = 0
               readallfields = false"#,
            Status::NotFound,
            Status::Ok,
        );
        let (op, status) = c.do_transaction_op();
        assert_eq!(op, Operation::Read);
        assert_eq!(status, Status::NotFound);
        let calls = calls.lock();
        match &calls[0] {
            Call::Read(table, _, fields) => {
                assert_eq!(table, "usertable");
                assert_eq!(fields.len(), 1);
                assert!(fields[0].starts_with("field"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn read_all_fields() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               readproportion = 1
               updateproportion = 0"#,
            Status::Ok,
            Status::Ok,
        );
        assert!(c.do_transaction());
        assert!(matches!(&calls.lock()[0], Call::Read(_, _, f) if f.is_empty()));
    }

    #[test]
    fn update_one_or_all_fields() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               readproportion = 0
               updateproportion = 1"#,
            Status::Ok,
            Status::Ok,
        );
        assert!(c.do_transaction());
        assert!(matches!(&calls.lock()[0], Call::Update(_, v) if v.len() == 1));

        let (mut c, _, calls) = client(
            r#"recordcount = 10
               fieldcount = 4
               readproportion = 0
               updateproportion = 1
               writeallfields = true"#,
            Status::Ok,
            Status::Ok,
        );
        assert!(c.do_transaction());
        assert!(matches!(&calls.lock()[0], Call::Update(_, v) if v.len() == 4));
    }

    #[test]
    fn insert_moves_frontier() {
        let (mut c, w, calls) = client(
            r#"recordcount = 10
               readproportion = 0
               updateproportion = 0
               insertproportion = 1
               insertorder = "ordered""#,
            Status::Ok,
            Status::Ok,
        );
        for _ in 0..10 {
            assert!(c.do_insert());
        }
        assert_eq!(w.insert_frontier(), 9);
        assert_eq!(c.do_transaction_op(), (Operation::Insert, Status::Ok));
        assert!(matches!(&calls.lock()[10], Call::Insert(k, _) if k == "user10"));
        assert_eq!(w.insert_frontier(), 10);
    }

    #[test]
    fn failed_insert_keeps_frontier() {
        let (mut c, w, _) = client(
            r#"recordcount = 10
               readproportion = 0
               updateproportion = 0
               insertproportion = 1"#,
            Status::Ok,
            Status::Error,
        );
        assert_eq!(c.do_transaction_op(), (Operation::Insert, Status::Error));
        assert_eq!(w.insert_frontier(), 9);
    }

    #[test]
    fn scan() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               readproportion = 0
               updateproportion = 0
               scanproportion = 1
               maxscanlength = 5"#,
            Status::Ok,
            Status::Ok,
        );
        for _ in 0..100 {
            assert_eq!(c.do_transaction_op(), (Operation::Scan, Status::Ok));
        }
        let calls = calls.lock();
        for call in calls.iter() {
            match call {
                Call::Scan(key, count, fields) => {
                    assert!(key.starts_with("user"));
                    assert!(*count >= 1 && *count <= 5);
                    assert!(fields.is_empty());
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn read_modify_write_ignores_read_status() {
        let (mut c, _, calls) = client(
            r#"recordcount = 10
               readproportion = 0
               updateproportion = 0
               readmodifywriteproportion = 1"#,
            Status::NotFound,
            Status::Ok,
        );
        assert_eq!(
            c.do_transaction_op(),
            (Operation::ReadModifyWrite, Status::Ok)
        );
        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        match (&calls[0], &calls[1]) {
            (Call::Read(_, rk, _), Call::Update(uk, v)) => {
                assert_eq!(rk, uk);
                assert_eq!(v.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
