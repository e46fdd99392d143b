use crate::sink::Stream;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LogError>;

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Write Error: could not write log line (stream: {stream})")]
    Write {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialize Error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Config Error: unrecognized log level {value:?}")]
    UnknownLevel { value: String },
}
