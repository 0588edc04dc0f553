//! Error types for building a benchmark run.
//!
//! Every error here is produced while the configuration is read and the workload is built, i.e.,
//! before any worker thread exists. Failed store operations are not errors: they come back as a
//! [`crate::Status`] and are only counted.

use thiserror::Error;

/// Errors that can occur while configuring a benchmark.
#[derive(Debug, Error)]
pub enum Error {
    /// A required property is absent and has no default.
    #[error("missing required property `{0}`")]
    MissingKey(String),

    /// A property is present but cannot be read as the requested type.
    #[error("invalid value for property `{key}`: expected {expected}, got `{value}`")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// A distribution name that the given property does not support.
    #[error("unknown distribution `{name}` for property `{property}`")]
    UnknownDistribution { property: &'static str, name: String },

    /// A generator was asked to cover a range it cannot handle.
    #[error("{what} out of bounds: {value} not in [{min}, {max}]")]
    OutOfBounds {
        what: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    /// All operation proportions are zero, so no transaction can be drawn.
    #[error("no operation has a positive proportion")]
    EmptyOperationMix,

    /// No store is registered under the given name.
    #[error("store `{0}` not found in registry")]
    UnknownStore(String),

    /// A store rejected its options.
    #[error("invalid options for store `{name}`: {source}")]
    StoreOption {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    /// The configuration text could not be parsed or extracted.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// A configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for configuration and initialization.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            Error::MissingKey("recordcount".to_string()).to_string(),
            "missing required property `recordcount`"
        );
        let e = Error::UnknownDistribution {
            property: "requestdistribution",
            name: "gaussian".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "unknown distribution `gaussian` for property `requestdistribution`"
        );
        let e = Error::OutOfBounds {
            what: "zipfian item count",
            value: 1,
            min: 2,
            max: (1 << 40) - 1,
        };
        assert!(e.to_string().starts_with("zipfian item count out of bounds: 1"));
    }
}
