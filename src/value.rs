//! Runtime values accepted by the logger.
//!
//! Records and arrays are shared handles: cloning one yields another handle
//! to the same storage, which is how aliased and self-referential values are
//! built. Identity is the address of that storage.

use crate::trace;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub enum LogValue {
    Undefined,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Array),
    Record(Record),
    Error(ErrorValue),
    Callable(Callable),
}

impl LogValue {
    /// Converts any `Serialize` value. A value that fails to serialize is
    /// kept as the error it produced.
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => json.into(),
            Err(e) => LogValue::Error(ErrorValue::from_error(&e)),
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, LogValue::Undefined)
    }
}

impl fmt::Debug for LogValue {
    // shallow: handles may be cyclic
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogValue::Undefined => f.write_str("Undefined"),
            LogValue::Null => f.write_str("Null"),
            LogValue::Bool(b) => write!(f, "Bool({b})"),
            LogValue::Number(n) => write!(f, "Number({n})"),
            LogValue::String(s) => write!(f, "String({s:?})"),
            LogValue::Array(a) => write!(f, "Array(len={})", a.len()),
            LogValue::Record(r) => write!(f, "Record(len={})", r.len()),
            LogValue::Error(e) => write!(f, "Error({}: {})", e.name, e.message),
            LogValue::Callable(c) => write!(f, "Callable({:?})", c.source),
        }
    }
}

/// Property key. Symbol keys never reach the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Str(String),
    Symbol(String),
}

#[derive(Clone)]
pub struct Property {
    pub key: Key,
    pub value: LogValue,
    pub enumerable: bool,
}

/// Shared, ordered key/value record.
#[derive(Clone, Default)]
pub struct Record(Rc<RefCell<Vec<Property>>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an enumerable string-keyed property.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<LogValue>) -> &Self {
        self.put(Key::Str(key.into()), value.into(), true)
    }

    /// Sets a non-enumerable property.
    pub fn insert_hidden(&self, key: impl Into<String>, value: impl Into<LogValue>) -> &Self {
        self.put(Key::Str(key.into()), value.into(), false)
    }

    /// Sets a symbol-keyed property; `description` only identifies the symbol.
    pub fn insert_symbol(&self, description: impl Into<String>, value: impl Into<LogValue>) -> &Self {
        self.put(Key::Symbol(description.into()), value.into(), true)
    }

    fn put(&self, key: Key, value: LogValue, enumerable: bool) -> &Self {
        let mut props = self.0.borrow_mut();
        match props.iter_mut().find(|p| p.key == key) {
            Some(existing) => {
                existing.value = value;
                existing.enumerable = enumerable;
            }
            None => props.push(Property {
                key,
                value,
                enumerable,
            }),
        }
        drop(props);
        self
    }

    pub fn get(&self, key: &str) -> Option<LogValue> {
        self.0
            .borrow()
            .iter()
            .find(|p| matches!(&p.key, Key::Str(k) if k == key))
            .map(|p| p.value.clone())
    }

    /// Snapshot of all properties, including hidden and symbol-keyed ones.
    pub fn properties(&self) -> Vec<Property> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

/// Shared, growable array.
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<LogValue>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: impl Into<LogValue>) -> &Self {
        self.0.borrow_mut().push(value.into());
        self
    }

    pub fn items(&self) -> Vec<LogValue> {
        self.0.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl<T: Into<LogValue>> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Array(Rc::new(RefCell::new(iter.into_iter().map(Into::into).collect())))
    }
}

/// Error captured with its stack at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorValue {
    pub name: String,
    pub message: String,
    pub stack: String,
}

const ERROR_CTOR_PREFIX: &str = concat!(module_path!(), "::ErrorValue::");

impl ErrorValue {
    #[inline(never)]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        let name = name.into();
        let message = message.into();
        let stack = render_stack(&name, &message, &trace::capture());
        Self {
            name,
            message,
            stack,
        }
    }

    /// Named after the error's type, e.g. `ParseIntError`.
    #[inline(never)]
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::new(short_type_name::<E>(), err.to_string())
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

fn short_type_name<E: ?Sized>() -> String {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn render_stack(name: &str, message: &str, frames: &[trace::Frame]) -> String {
    let mut out = format!("{name}: {message}");
    let mut wrote_frame = false;
    for frame in frames.iter().skip_while(|f| f.symbol.starts_with(ERROR_CTOR_PREFIX)) {
        out.push_str("\n    at ");
        out.push_str(&frame.symbol);
        if let Some(location) = &frame.location {
            out.push_str(" (");
            out.push_str(location);
            out.push(')');
        }
        wrote_frame = true;
    }
    if !wrote_frame {
        out.push_str("\n    at <unknown>");
    }
    out
}

/// A function value, represented by its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callable {
    pub source: String,
}

impl Callable {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Describes `f` by its type, e.g. `fn orders::handlers::create_order`.
    pub fn of<F>(_f: &F) -> Self {
        Self::new(format!("fn {}", std::any::type_name::<F>()))
    }
}

impl From<&str> for LogValue {
    fn from(s: &str) -> Self {
        LogValue::String(s.to_string())
    }
}

impl From<String> for LogValue {
    fn from(s: String) -> Self {
        LogValue::String(s)
    }
}

impl From<bool> for LogValue {
    fn from(b: bool) -> Self {
        LogValue::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for LogValue {
            fn from(n: $t) -> Self {
                LogValue::Number(n.into())
            }
        })*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for LogValue {
    /// Non-finite values become `Null`, as they do in JSON.
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n).map_or(LogValue::Null, LogValue::Number)
    }
}

impl From<f32> for LogValue {
    fn from(n: f32) -> Self {
        f64::from(n).into()
    }
}

impl From<Record> for LogValue {
    fn from(r: Record) -> Self {
        LogValue::Record(r)
    }
}

impl From<Array> for LogValue {
    fn from(a: Array) -> Self {
        LogValue::Array(a)
    }
}

impl From<Vec<LogValue>> for LogValue {
    fn from(items: Vec<LogValue>) -> Self {
        LogValue::Array(items.into_iter().collect())
    }
}

impl From<ErrorValue> for LogValue {
    fn from(e: ErrorValue) -> Self {
        LogValue::Error(e)
    }
}

impl From<Callable> for LogValue {
    fn from(c: Callable) -> Self {
        LogValue::Callable(c)
    }
}

impl From<serde_json::Value> for LogValue {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value;
        match json {
            Value::Null => LogValue::Null,
            Value::Bool(b) => LogValue::Bool(b),
            Value::Number(n) => LogValue::Number(n),
            Value::String(s) => LogValue::String(s),
            Value::Array(items) => LogValue::Array(items.into_iter().collect()),
            Value::Object(map) => {
                let record = Record::new();
                for (k, v) in map {
                    record.insert(k, v);
                }
                LogValue::Record(record)
            }
        }
    }
}
