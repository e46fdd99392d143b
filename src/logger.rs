use crate::caller;
use crate::config::{LoggerConfig, Severity};
use crate::error::{LogError, Result};
use crate::sanitize::sanitize;
use crate::sink::{Sink, StdSink};
use crate::value::{Array, ErrorValue, LogValue, Record};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fmt;

/// Symbol prefix shared by every frame the logger itself puts on the stack.
const INTERNAL_FRAME_PREFIX: &str = concat!(module_path!(), "::Logger::");

type Method = fn(&Logger, Severity, LogInput) -> Result<()>;

/// What a logging method accepts: plain text or a structured value.
#[derive(Debug, Clone)]
pub enum LogInput {
    Text(String),
    Structured(LogValue),
}

impl From<&str> for LogInput {
    fn from(s: &str) -> Self {
        LogInput::Text(s.to_string())
    }
}

impl From<String> for LogInput {
    fn from(s: String) -> Self {
        LogInput::Text(s)
    }
}

impl From<&String> for LogInput {
    fn from(s: &String) -> Self {
        LogInput::Text(s.clone())
    }
}

impl From<LogValue> for LogInput {
    fn from(v: LogValue) -> Self {
        match v {
            LogValue::String(s) => LogInput::Text(s),
            other => LogInput::Structured(other),
        }
    }
}

impl From<Record> for LogInput {
    fn from(r: Record) -> Self {
        LogInput::Structured(r.into())
    }
}

impl From<Array> for LogInput {
    fn from(a: Array) -> Self {
        LogInput::Structured(a.into())
    }
}

impl From<ErrorValue> for LogInput {
    fn from(e: ErrorValue) -> Self {
        LogInput::Structured(e.into())
    }
}

impl From<Value> for LogInput {
    fn from(json: Value) -> Self {
        LogValue::from(json).into()
    }
}

/// Input of [`Logger::log_complex_error`].
#[derive(Debug, Clone)]
pub enum ComplexError {
    Native(ErrorValue),
    Other(LogValue),
}

impl From<ErrorValue> for ComplexError {
    fn from(e: ErrorValue) -> Self {
        ComplexError::Native(e)
    }
}

impl From<LogValue> for ComplexError {
    fn from(v: LogValue) -> Self {
        match v {
            LogValue::Error(e) => ComplexError::Native(e),
            other => ComplexError::Other(other),
        }
    }
}

impl From<Record> for ComplexError {
    fn from(r: Record) -> Self {
        ComplexError::Other(r.into())
    }
}

impl From<Value> for ComplexError {
    fn from(json: Value) -> Self {
        ComplexError::Other(json.into())
    }
}

/// JSON-lines logger bound to one service.
///
/// The threshold is fixed at construction. Each severity is bound once to
/// either the emitting path or a no-op, so a disabled level never builds,
/// sanitizes or serializes anything.
pub struct Logger {
    service_name: String,
    threshold: Severity,
    methods: [Method; 4],
    sink: Box<dyn Sink>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("service_name", &self.service_name)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger writing to stdout/stderr, with the threshold read
    /// from `LOG_LEVEL` now and never again.
    #[must_use]
    pub fn new(service_name: impl Into<String>) -> Self {
        Self::with_config(service_name, LoggerConfig::from_env())
    }

    #[must_use]
    pub fn with_config(service_name: impl Into<String>, config: LoggerConfig) -> Self {
        Self::with_sink(service_name, config, StdSink)
    }

    #[must_use]
    pub fn with_sink(service_name: impl Into<String>, config: LoggerConfig, sink: impl Sink + 'static) -> Self {
        let threshold = config.level;
        let methods = Severity::ALL.map(|level| -> Method {
            if threshold >= level {
                Logger::emit
            } else {
                Logger::skip
            }
        });
        Self {
            service_name: service_name.into(),
            threshold,
            methods,
            sink: Box::new(sink),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn threshold(&self) -> Severity {
        self.threshold
    }

    pub fn is_enabled(&self, level: Severity) -> bool {
        self.threshold >= level
    }

    /// Logs to stderr.
    pub fn error(&self, input: impl Into<LogInput>) -> Result<()> {
        self.dispatch(Severity::Error, input.into())
    }

    pub fn warn(&self, input: impl Into<LogInput>) -> Result<()> {
        self.dispatch(Severity::Warn, input.into())
    }

    pub fn info(&self, input: impl Into<LogInput>) -> Result<()> {
        self.dispatch(Severity::Info, input.into())
    }

    pub fn debug(&self, input: impl Into<LogInput>) -> Result<()> {
        self.dispatch(Severity::Debug, input.into())
    }

    /// Logs an error (or any value) as a single-line `complexError` field,
    /// with newlines in the rendered text replaced by spaces.
    pub fn log_complex_error(&self, error: impl Into<ComplexError>) -> Result<()> {
        if !self.is_enabled(Severity::Error) {
            return Ok(());
        }
        let text = match error.into() {
            ComplexError::Native(e) => format!("{}: {}\n{}", e.name, e.message, e.stack),
            ComplexError::Other(v) => serde_json::to_string(&sanitize(&v))?,
        };
        let record = Record::new();
        record.insert("complexError", text.replace('\n', " "));
        self.error(record)
    }

    fn dispatch(&self, level: Severity, input: LogInput) -> Result<()> {
        (self.methods[usize::from(level.rank())])(self, level, input)
    }

    fn skip(&self, _level: Severity, _input: LogInput) -> Result<()> {
        Ok(())
    }

    #[inline(never)]
    fn emit(&self, level: Severity, input: LogInput) -> Result<()> {
        let caller = caller::current(INTERNAL_FRAME_PREFIX);
        let record = self.build_record(level, input, caller)?;
        let line = serde_json::to_string(&Value::Object(record))?;
        let stream = level.stream();
        self.sink
            .write_line(stream, &line)
            .map_err(|source| LogError::Write { stream, source })
    }

    /// Envelope first, then the sanitized top-level keys of structured
    /// input. Those keys win over envelope keys of the same name.
    fn build_record(&self, level: Severity, input: LogInput, caller: String) -> Result<Map<String, Value>> {
        let mut record = Map::new();
        record.insert(
            "timestamp".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        record.insert("level".to_string(), Value::String(level.as_str().to_string()));

        match input {
            LogInput::Text(text) => {
                record.insert("message".to_string(), Value::String(text));
                self.insert_identity(&mut record, caller);
            }
            LogInput::Structured(value) => {
                let clean = sanitize(&value);
                record.insert("message".to_string(), Value::String(serde_json::to_string(&clean)?));
                self.insert_identity(&mut record, caller);
                // TODO: colliding keys replace envelope fields; decide whether to namespace them instead.
                match clean {
                    Value::Object(fields) => record.extend(fields),
                    Value::Array(items) => {
                        record.extend(items.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)));
                    }
                    _ => {}
                }
            }
        }
        Ok(record)
    }

    fn insert_identity(&self, record: &mut Map<String, Value>, caller: String) {
        record.insert("microservice".to_string(), Value::String(self.service_name.clone()));
        record.insert("caller".to_string(), Value::String(caller));
    }
}
