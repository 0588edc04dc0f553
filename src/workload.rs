//! The core workload: turns the workload properties into keys, fields, values and operations.
//!
//! ## Configuration
//!
//! [`CoreWorkload`] is built from the flat `[workload]` section of a benchmark file (see
//! [`mod@crate::properties`]). The recognized keys and their defaults:
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `table` | `"usertable"` | Table name passed to every store call. |
//! | `recordcount` | required | Number of records loaded, and the initial key space. |
//! | `operationcount` | required for `zipfian` | Transaction phase length, also sizes the zipfian key space. |
//! | `insertstart` | 0 | First key number handed out by the load phase. |
//! | `insertorder` | `"hashed"` | `"hashed"` scatters key numbers with FNV-64, `"ordered"` keeps them. |
//! | `fieldcount` | 10 | Fields per record. |
//! | `fieldlength` | 100 | Maximum (or exact, for `constant`) field length. |
//! | `field_len_dist` | `"constant"` | `"constant"`, `"uniform"` or `"zipfian"` over `[1, fieldlength]`. |
//! | `readallfields` | true | Reads ask for all fields instead of one. |
//! | `writeallfields` | false | Updates write all fields instead of one. |
//! | `readproportion` | 0.95 | Weight of reads. |
//! | `updateproportion` | 0.05 | Weight of updates. |
//! | `insertproportion` | 0 | Weight of inserts. |
//! | `scanproportion` | 0 | Weight of scans. |
//! | `readmodifywriteproportion` | 0 | Weight of read-modify-writes. |
//! | `requestdistribution` | `"uniform"` | `"uniform"`, `"zipfian"` (scrambled) or `"latest"`. |
//! | `maxscanlength` | 1000 | Longest scan. |
//! | `scanlengthdistribution` | `"uniform"` | `"uniform"` or `"zipfian"` over `[1, maxscanlength]`. |
//!
//! ## Keys
//!
//! Key numbers are dispensed by two counters. The load counter starts at `insertstart` and hands
//! out the numbers of every inserted record, in both phases. The insertion frontier starts at
//! `recordcount - 1` and only moves forward when transaction-phase inserts succeed, and then only
//! over an unbroken run of acknowledged numbers: an insert that is still running or that failed
//! holds it back. Transaction keys are drawn by the request distribution and redrawn while they
//! are past the frontier, so reads never target a record that was not inserted yet.

use crate::error::{Error, Result};
use crate::generator::*;
use crate::properties::Properties;
use crate::{Operation, Record};
use log::debug;
use rand::Rng;

/// Where the hot keys of the transaction phase are.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RequestDistribution {
    Uniform,
    Zipfian,
    Latest,
}

impl RequestDistribution {
    fn parse(name: &str) -> Result<Self> {
        match name {
            "uniform" => Ok(Self::Uniform),
            "zipfian" => Ok(Self::Zipfian),
            "latest" => Ok(Self::Latest),
            _ => Err(Error::UnknownDistribution {
                property: "requestdistribution",
                name: name.to_string(),
            }),
        }
    }
}

fn field_len_generator(dist: &str, field_length: u64) -> Result<NumberGenerator> {
    match dist {
        "constant" => Ok(NumberGenerator::Const(ConstGenerator::new(field_length))),
        "uniform" => Ok(NumberGenerator::Uniform(UniformGenerator::new(
            1,
            field_length,
        )?)),
        "zipfian" => Ok(NumberGenerator::Zipfian(ZipfianGenerator::new(
            1,
            field_length,
        )?)),
        _ => Err(Error::UnknownDistribution {
            property: "field_len_dist",
            name: dist.to_string(),
        }),
    }
}

fn scan_len_generator(dist: &str, max_scan_length: u64) -> Result<NumberGenerator> {
    match dist {
        "uniform" => Ok(NumberGenerator::Uniform(UniformGenerator::new(
            1,
            max_scan_length,
        )?)),
        "zipfian" => Ok(NumberGenerator::Zipfian(ZipfianGenerator::new(
            1,
            max_scan_length,
        )?)),
        _ => Err(Error::UnknownDistribution {
            property: "scanlengthdistribution",
            name: dist.to_string(),
        }),
    }
}

fn at_least_one(what: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(Error::OutOfBounds {
            what,
            value,
            min: 1,
            max: u64::MAX,
        });
    }
    Ok(())
}

/// The workload driver shared by every worker of a run.
///
/// All methods take `&self`: the generators inside synchronize themselves, and each caller
/// supplies its own RNG.
#[derive(Debug)]
pub struct CoreWorkload {
    table: String,
    field_names: Vec<String>,
    read_all_fields: bool,
    write_all_fields: bool,
    ordered_inserts: bool,
    record_count: u64,
    operation_count: Option<u64>,
    request_distribution: RequestDistribution,
    field_len_generator: NumberGenerator,
    /// Load counter, also used by transaction-phase inserts.
    key_sequence: CounterGenerator,
    /// Every key number up to this one is known to be inserted.
    insert_key_sequence: AcknowledgedCounterGenerator,
    op_chooser: DiscreteGenerator<Operation>,
    key_chooser: NumberGenerator,
    field_chooser: UniformGenerator,
    scan_len_chooser: NumberGenerator,
}

impl CoreWorkload {
    pub fn new(props: &Properties) -> Result<Self> {
        let table = props.get_string_or("table", "usertable")?;

        let record_count = props.get_uint("recordcount")?;
        at_least_one("recordcount", record_count)?;
        let operation_count = match props.contains("operationcount") {
            true => Some(props.get_uint("operationcount")?),
            false => None,
        };
        let insert_start = props.get_uint_or("insertstart", 0)?;

        let field_count = props.get_uint_or("fieldcount", 10)?;
        at_least_one("fieldcount", field_count)?;
        let field_length = props.get_uint_or("fieldlength", 100)?;
        let field_len_dist = props.get_string_or("field_len_dist", "constant")?;
        let field_len_generator = field_len_generator(&field_len_dist, field_length)?;

        let read_all_fields = props.get_bool_or("readallfields", true)?;
        let write_all_fields = props.get_bool_or("writeallfields", false)?;

        let read_proportion = props.get_double_or("readproportion", 0.95)?;
        let update_proportion = props.get_double_or("updateproportion", 0.05)?;
        let insert_proportion = props.get_double_or("insertproportion", 0.0)?;
        let scan_proportion = props.get_double_or("scanproportion", 0.0)?;
        let rmw_proportion = props.get_double_or("readmodifywriteproportion", 0.0)?;

        let mut op_chooser = DiscreteGenerator::new();
        for (op, weight) in [
            (Operation::Read, read_proportion),
            (Operation::Update, update_proportion),
            (Operation::Insert, insert_proportion),
            (Operation::Scan, scan_proportion),
            (Operation::ReadModifyWrite, rmw_proportion),
        ] {
            if weight > 0.0 {
                op_chooser.add_value(op, weight);
            }
        }
        if op_chooser.is_empty() {
            return Err(Error::EmptyOperationMix);
        }

        let ordered_inserts = match props.get_string_or("insertorder", "hashed")?.as_str() {
            "hashed" => false,
            "ordered" => true,
            other => {
                return Err(Error::InvalidValue {
                    key: "insertorder".to_string(),
                    value: other.to_string(),
                    expected: "\"hashed\" or \"ordered\"",
                })
            }
        };

        let key_sequence = CounterGenerator::new(insert_start);
        let insert_key_sequence = AcknowledgedCounterGenerator::new(record_count);

        let request_distribution =
            RequestDistribution::parse(&props.get_string_or("requestdistribution", "uniform")?)?;
        let key_chooser = match request_distribution {
            RequestDistribution::Uniform => {
                NumberGenerator::Uniform(UniformGenerator::new(0, record_count - 1)?)
            }
            RequestDistribution::Zipfian => {
                // leave room for the keys inserted during the transaction phase
                let operation_count = operation_count
                    .ok_or_else(|| Error::MissingKey("operationcount".to_string()))?;
                let new_keys = (operation_count as f64 * insert_proportion * 2.0) as u64;
                NumberGenerator::ScrambledZipfian(ScrambledZipfianGenerator::with_items(
                    record_count + new_keys,
                )?)
            }
            RequestDistribution::Latest => NumberGenerator::SkewedLatest(
                SkewedLatestGenerator::new(insert_key_sequence.basis())?,
            ),
        };

        let field_chooser = UniformGenerator::new(0, field_count - 1)?;

        let max_scan_length = props.get_uint_or("maxscanlength", 1000)?;
        let scan_len_dist = props.get_string_or("scanlengthdistribution", "uniform")?;
        let scan_len_chooser = scan_len_generator(&scan_len_dist, max_scan_length)?;

        let workload = Self {
            table,
            field_names: (0..field_count).map(|i| format!("field{}", i)).collect(),
            read_all_fields,
            write_all_fields,
            ordered_inserts,
            record_count,
            operation_count,
            request_distribution,
            field_len_generator,
            key_sequence,
            insert_key_sequence,
            op_chooser,
            key_chooser,
            field_chooser,
            scan_len_chooser,
        };
        debug!(
            "workload: table {} records {} operations {:?} fields {} distribution {:?}",
            workload.table,
            workload.record_count,
            workload.operation_count,
            workload.field_names.len(),
            workload.request_distribution
        );
        Ok(workload)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
    }

    pub fn operation_count(&self) -> Option<u64> {
        self.operation_count
    }

    pub fn field_count(&self) -> usize {
        self.field_names.len()
    }

    pub fn read_all_fields(&self) -> bool {
        self.read_all_fields
    }

    pub fn write_all_fields(&self) -> bool {
        self.write_all_fields
    }

    pub fn request_distribution(&self) -> RequestDistribution {
        self.request_distribution
    }

    /// Append one `(fieldN, value)` pair per field to `values`.
    pub fn build_values(&self, rng: &mut impl Rng, values: &mut Record) {
        for name in self.field_names.iter() {
            let len = self.field_len_generator.next(rng) as usize;
            values.push((name.clone(), random_printable(rng, len)));
        }
    }

    /// Append a single pair for one randomly chosen field to `values`.
    pub fn build_update(&self, rng: &mut impl Rng, values: &mut Record) {
        let name = self.next_field_name(rng);
        let len = self.field_len_generator.next(rng) as usize;
        values.push((name, random_printable(rng, len)));
    }

    /// Dispense the next key number from the load counter.
    pub fn next_sequence_number(&self, rng: &mut impl Rng) -> u64 {
        self.key_sequence.next(rng)
    }

    /// Render a key number, hashing it unless inserts are ordered.
    pub fn build_key_name(&self, number: u64) -> String {
        let number = match self.ordered_inserts {
            true => number,
            false => fnv_hash64(number),
        };
        format!("user{}", number)
    }

    pub fn next_sequence_key(&self, rng: &mut impl Rng) -> String {
        let number = self.next_sequence_number(rng);
        self.build_key_name(number)
    }

    /// The key number of a transaction target, never past the insertion frontier.
    pub fn next_transaction_number(&self, rng: &mut impl Rng) -> u64 {
        loop {
            let number = self.key_chooser.next(rng);
            if number <= self.insert_key_sequence.last() {
                return number;
            }
        }
    }

    pub fn next_transaction_key(&self, rng: &mut impl Rng) -> String {
        let number = self.next_transaction_number(rng);
        self.build_key_name(number)
    }

    pub fn next_operation(&self, rng: &mut impl Rng) -> Operation {
        self.op_chooser.next(rng)
    }

    pub fn next_field_name(&self, rng: &mut impl Rng) -> String {
        let i = self.field_chooser.next(rng) as usize;
        self.field_names[i].clone()
    }

    pub fn next_scan_length(&self, rng: &mut impl Rng) -> usize {
        self.scan_len_chooser.next(rng) as usize
    }

    /// Mark key number `number` as inserted. It becomes a valid transaction target once every
    /// number below it is acknowledged too.
    pub fn acknowledge_insert(&self, number: u64) {
        self.insert_key_sequence.acknowledge(number);
    }

    /// The highest key number transactions may target.
    pub fn insert_frontier(&self) -> u64 {
        self.insert_key_sequence.last()
    }
}
