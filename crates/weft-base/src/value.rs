//! Dynamic values held by attributes, config entries and event arguments.
//!
//! Primitives (`undefined`, `null`, booleans, numbers, strings) compare by value.
//! Arrays, plain objects, functions and host handles are shared references:
//! cloning a [`Value`] clones the reference, and [`Value::strict_eq`] compares
//! identity. [`Value::deep_clone`] is the only way to obtain an independent copy.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::func::Func;

/// Insertion-ordered map backing plain objects.
pub type ObjectMap = IndexMap<String, Value>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<RefCell<Vec<Value>>>),
    /// A plain object. Only plain objects take part in field-by-field merging.
    Object(Rc<RefCell<ObjectMap>>),
    Function(Func),
    /// Opaque host reference (a DOM element, a timer handle, ...).
    Handle(Rc<dyn Any>),
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn object(map: ObjectMap) -> Self {
        Value::Object(Rc::new(RefCell::new(map)))
    }

    pub fn empty_object() -> Self {
        Self::object(ObjectMap::new())
    }

    /// Wrap a host value so it can be stored without being copied.
    pub fn handle<T: Any>(value: T) -> Self {
        Value::Handle(Rc::new(value))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_plain_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Downcast a [`Value::Handle`] to its concrete host type.
    pub fn downcast_handle<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Value::Handle(h) => Rc::clone(h).downcast::<T>().ok(),
            _ => None,
        }
    }

    pub fn borrow_object(&self) -> Option<Ref<'_, ObjectMap>> {
        match self {
            Value::Object(o) => Some(o.borrow()),
            _ => None,
        }
    }

    pub fn borrow_object_mut(&self) -> Option<RefMut<'_, ObjectMap>> {
        match self {
            Value::Object(o) => Some(o.borrow_mut()),
            _ => None,
        }
    }

    pub fn borrow_array(&self) -> Option<Ref<'_, Vec<Value>>> {
        match self {
            Value::Array(a) => Some(a.borrow()),
            _ => None,
        }
    }

    pub fn borrow_array_mut(&self) -> Option<RefMut<'_, Vec<Value>>> {
        match self {
            Value::Array(a) => Some(a.borrow_mut()),
            _ => None,
        }
    }

    /// Field of a plain object, `undefined` for anything else.
    pub fn field(&self, key: &str) -> Value {
        self.borrow_object()
            .and_then(|o| o.get(key).cloned())
            .unwrap_or_default()
    }

    /// Element of an array, `undefined` when out of range or not an array.
    pub fn index(&self, index: usize) -> Value {
        self.borrow_array()
            .and_then(|a| a.get(index).cloned())
            .unwrap_or_default()
    }

    /// Insert a field into a plain object. Returns `false` for non-objects.
    pub fn set_field(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.borrow_object_mut() {
            Some(mut o) => {
                o.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    /// Append to an array. Returns `false` for non-arrays.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        match self.borrow_array_mut() {
            Some(mut a) => {
                a.push(value.into());
                true
            }
            None => false,
        }
    }

    /// Number of elements (arrays), fields (objects) or chars (strings).
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(a.borrow().len()),
            Value::Object(o) => Some(o.borrow().len()),
            Value::String(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Handle(_) => "handle",
        }
    }

    /// `===`: primitives by value (NaN is never equal), references by identity.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Handle(a), Value::Handle(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Independent copy of arrays and plain objects, recursively.
    ///
    /// Functions and handles stay shared. Cyclic structures are not supported.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(a) => Value::array(a.borrow().iter().map(Value::deep_clone).collect()),
            Value::Object(o) => Value::object(
                o.borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_clone()))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Merge `over` onto `base` into a new plain object.
    ///
    /// Nested plain objects present on both sides merge recursively; every
    /// other value in `over` replaces the one in `base` as-is (no copy).
    /// If either side is not a plain object, `over` wins outright.
    pub fn merge_plain(base: &Value, over: &Value) -> Value {
        let (Value::Object(b), Value::Object(o)) = (base, over) else {
            return over.clone();
        };

        let mut merged = b.borrow().clone();
        for (key, value) in o.borrow().iter() {
            let next = match merged.get(key) {
                Some(existing) if existing.is_plain_object() && value.is_plain_object() => {
                    Value::merge_plain(existing, value)
                }
                _ => value.clone(),
            };
            merged.insert(key.clone(), next);
        }
        Value::object(merged)
    }

    /// Values that a bulk `change()` treats as "nothing to announce":
    /// `undefined`, `null`, `""`, `[]` and `{}`.
    pub fn is_empty_attr(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.borrow().is_empty(),
            Value::Object(o) => o.borrow().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => match a.try_borrow() {
                Ok(items) => f.debug_list().entries(items.iter()).finish(),
                Err(_) => write!(f, "[array <borrowed>]"),
            },
            Value::Object(o) => match o.try_borrow() {
                Ok(map) => f.debug_map().entries(map.iter()).finish(),
                Err(_) => write!(f, "{{object <borrowed>}}"),
            },
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Handle(_) => write!(f, "[handle]"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        self.as_f64() == Some(*other)
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Func> for Value {
    fn from(f: Func) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<ObjectMap> for Value {
    fn from(map: ObjectMap) -> Self {
        Value::object(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Build a plain-object [`Value`]: `obj! { "width": 100, "height": 100 }`.
#[macro_export]
macro_rules! obj {
    () => {
        $crate::Value::empty_object()
    };
    ($($key:literal : $value:expr),+ $(,)?) => {{
        let mut map = $crate::ObjectMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        $crate::Value::object(map)
    }};
}

/// Build an array [`Value`]: `arr![1, 2, 3]`.
#[macro_export]
macro_rules! arr {
    ($($value:expr),* $(,)?) => {
        $crate::Value::array(::std::vec![$($crate::Value::from($value)),*])
    };
}
