#![deny(warnings)]

pub mod caller;
pub mod config;
pub mod error;
pub mod logger;
pub mod sanitize;
pub mod sink;
pub mod trace;
pub mod value;

pub use config::{LoggerConfig, Severity, LOG_LEVEL_ENV};
pub use error::{LogError, Result};
pub use logger::{ComplexError, LogInput, Logger};
pub use sanitize::sanitize;
pub use sink::{MemorySink, Sink, StdSink, Stream};
pub use value::{Array, Callable, ErrorValue, LogValue, Record};
