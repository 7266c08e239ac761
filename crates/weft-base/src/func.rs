//! Callables stored in class definitions, attribute specs and listener tables.

use std::fmt;
use std::rc::Rc;

use crate::config::Config;
use crate::error::BaseResult;
use crate::instance::Instance;
use crate::value::Value;

type Callback = dyn Fn(&Instance, &[Value]) -> BaseResult<Value>;

/// A method, listener or advice.
///
/// The first argument is the call context (`this`). Two `Func`s are equal only
/// if they are clones of the same function, which is what `off(event, handler)`
/// matches on.
#[derive(Clone)]
pub struct Func(Rc<Callback>);

impl Func {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> BaseResult<Value> + 'static,
    {
        Func(Rc::new(f))
    }

    /// Wrap a function that cannot fail.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Value + 'static,
    {
        Func(Rc::new(move |this, args| Ok(f(this, args))))
    }

    pub fn noop() -> Self {
        Func::from_fn(|_, _| Value::Undefined)
    }

    pub fn call(&self, this: &Instance, args: &[Value]) -> BaseResult<Value> {
        (self.0)(this, args)
    }

    pub fn ptr_eq(&self, other: &Func) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[function {:p}]", Rc::as_ptr(&self.0) as *const ())
    }
}

impl PartialEq for Func {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Computes an attribute's value on every `get`.
pub type Getter = Rc<dyn Fn(&Instance) -> Value>;

/// Transforms a value before it is stored: `(this, value, attribute name)`.
pub type Setter = Rc<dyn Fn(&Instance, Value, &str) -> Value>;

/// Accepts or rejects a value before it is stored.
pub type Validator = Rc<dyn Fn(&Instance, &Value) -> bool>;

/// Constructor body. Receives the raw, mutable construction config.
pub type Initializer = Rc<dyn Fn(&Instance, &mut Config) -> BaseResult<()>>;

/// Invoked with `(attribute name, rejected value)` when validation fails.
pub type ErrorCallback = Rc<dyn Fn(&str, &Value)>;
