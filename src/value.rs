//! The dynamic values a Lox program can produce.

use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::interpreter::RuntimeError;

#[derive(Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Number(f64),
    String(String),
    Callable(Arc<dyn Callable>),
    Instance(Arc<Instance>),
}

impl Value {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Callable(_) => "callable",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => Arc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Callable(c) => write!(f, "<fn {}>", c.name()),
            Value::Instance(i) => write!(f, "{} instance", i.class_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            other => write!(f, "{other}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

/// Anything a call expression can invoke.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn call(&self, arguments: Vec<Value>) -> Result<Value, RuntimeError>;
}

pub type NativeFn = fn(&[Value]) -> Result<Value, RuntimeError>;

/// A host function exposed to scripts.
pub struct NativeFunction {
    name: String,
    arity: usize,
    function: NativeFn,
}

impl NativeFunction {
    pub fn new(name: impl Into<String>, arity: usize, function: NativeFn) -> Self {
        Self {
            name: name.into(),
            arity,
            function,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Callable(Arc::new(self))
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.function)(&arguments)
    }
}

/// An object with a class name and a mutable field table.
///
/// Fields sit behind a lock so instances can be shared between threads the
/// same way the rest of the value domain is.
pub struct Instance {
    class_name: String,
    fields: RwLock<FxHashMap<String, Value>>,
}

impl Instance {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            fields: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Instance(Arc::new(self))
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.fields.write().insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_follows_lox_rules() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-5.0).to_string(), "-5");
    }

    #[test]
    fn equality_is_by_identity_for_references() {
        let first = Instance::new("Bagel").into_value();
        let second = Instance::new("Bagel").into_value();
        assert_eq!(first, first.clone());
        assert_ne!(first, second);
        assert_ne!(Value::Nil, Value::Boolean(false));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
    }

    #[test]
    fn instance_fields_are_readable_after_set() {
        let bagel = Instance::new("Bagel");
        assert_eq!(bagel.get("topping"), None);
        bagel.set("topping", Value::from("sesame"));
        assert_eq!(bagel.get("topping"), Some(Value::from("sesame")));
        assert_eq!(bagel.class_name(), "Bagel");
    }

    #[test]
    fn native_function_reports_name_and_arity() {
        let clock = NativeFunction::new("clock", 0, |_| Ok(Value::Number(0.0)));
        assert_eq!(clock.name(), "clock");
        assert_eq!(clock.arity(), 0);
        assert_eq!(clock.into_value().to_string(), "<fn clock>");
    }

    #[test]
    fn values_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Value>();
    }
}
