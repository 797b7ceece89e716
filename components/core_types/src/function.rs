//! Callable values and property bags.

use crate::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The outcome of calling a [`Function`]: a return value, or a thrown value.
pub type Completion = Result<Value, Value>;

/// A JavaScript function backed by a Rust closure.
///
/// Cloning a `Function` shares the same closure, so two clones compare equal
/// the way two references to one JavaScript function object do.
///
/// # Examples
///
/// ```
/// use core_types::{Function, Value};
///
/// let double = Function::new(|args| match args.first() {
///     Some(Value::Smi(n)) => Ok(Value::Smi(n * 2)),
///     _ => Err(Value::from("expected a number")),
/// });
/// assert_eq!(double.call(vec![Value::Smi(21)]), Ok(Value::Smi(42)));
/// ```
#[derive(Clone)]
pub struct Function {
    callback: Rc<dyn Fn(Vec<Value>) -> Completion>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Completion + 'static,
    {
        Self {
            callback: Rc::new(f),
        }
    }

    /// Calls the function with the given arguments.
    ///
    /// `Err` carries the value the function threw.
    pub fn call(&self, args: Vec<Value>) -> Completion {
        (self.callback)(args)
    }

    /// Returns true if both handles refer to the same closure.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// A property slot on an [`Object`].
#[derive(Debug, Clone)]
pub enum Property {
    /// A plain data property
    Data(Value),
    /// An accessor; reading the property calls the getter, which may throw
    Getter(Function),
}

/// An ordinary JavaScript object: an insertion-ordered property bag.
///
/// Objects are shared through `Rc` and compared by identity. Any object whose
/// `then` property yields a function is a *thenable*.
#[derive(Debug, Default)]
pub struct Object {
    properties: RefCell<Vec<(String, Property)>>,
}

impl Object {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an object from data properties, keeping their order.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new();
        for (key, value) in entries {
            object.set(key, value);
        }
        object
    }

    /// Sets a data property, replacing any existing slot with that key.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.define(key.into(), Property::Data(value));
    }

    /// Installs a getter for `key`.
    pub fn define_getter(&self, key: impl Into<String>, getter: Function) {
        self.define(key.into(), Property::Getter(getter));
    }

    fn define(&self, key: String, property: Property) {
        let mut properties = self.properties.borrow_mut();
        match properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = property,
            None => properties.push((key, property)),
        }
    }

    /// Reads a property. Missing properties read as `undefined`; a getter
    /// that throws makes the read fail with the thrown value.
    pub fn get(&self, key: &str) -> Completion {
        let property = self
            .properties
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, property)| property.clone());
        match property {
            None => Ok(Value::Undefined),
            Some(Property::Data(value)) => Ok(value),
            // The borrow is released before the getter runs, so getters may
            // touch the object themselves.
            Some(Property::Getter(getter)) => getter.call(Vec::new()),
        }
    }

    /// Returns true if the object has an own property named `key`.
    pub fn has(&self, key: &str) -> bool {
        self.properties.borrow().iter().any(|(k, _)| k == key)
    }

    /// Returns a snapshot of the data properties in insertion order.
    /// Accessor properties are skipped.
    pub fn data_entries(&self) -> Vec<(String, Value)> {
        self.properties
            .borrow()
            .iter()
            .filter_map(|(key, property)| match property {
                Property::Data(value) => Some((key.clone(), value.clone())),
                Property::Getter(_) => None,
            })
            .collect()
    }
}
