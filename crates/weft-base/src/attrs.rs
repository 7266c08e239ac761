//! Attribute engine: spec merging, per-instance storage, `get` / `set` / `change`.
//!
//! Specs are declared per class and merged once per class, least-derived first:
//! a child spec overlays only the fields it supplies, and plain-object default
//! values merge field by field. Every instance starts from a deep copy of the
//! merged defaults, so mutating one instance's array or object never reaches
//! the class or its siblings.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};
use weft_core::config::FailurePolicy;

use crate::config::Config;
use crate::func::{ErrorCallback, Getter, Setter, Validator};
use crate::instance::{Instance, Phase};
use crate::naming;
use crate::value::{ObjectMap, Value};

/// Normalized descriptor for one attribute.
///
/// Every field is optional so that a subclass can override, say, only the
/// setter and keep the inherited default value.
#[derive(Clone, Default)]
pub struct AttrSpec {
    pub value: Option<Value>,
    pub getter: Option<Getter>,
    pub setter: Option<Setter>,
    pub validator: Option<Validator>,
}

impl AttrSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spec holding only a default value; what a bare value in `attrs` means.
    pub fn value(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn getter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance) -> Value + 'static,
    {
        self.getter = Some(Rc::new(f));
        self
    }

    pub fn setter<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance, Value, &str) -> Value + 'static,
    {
        self.setter = Some(Rc::new(f));
        self
    }

    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance, &Value) -> bool + 'static,
    {
        self.validator = Some(Rc::new(f));
        self
    }

    /// Fresh copy of the default value, `undefined` if there is none.
    pub fn default_value(&self) -> Value {
        self.value
            .as_ref()
            .map(Value::deep_clone)
            .unwrap_or_default()
    }

    /// Overlay `child` onto this (inherited) spec.
    ///
    /// Hooks supplied by the child replace the inherited ones outright.
    pub(crate) fn overlay(&self, child: &AttrSpec) -> AttrSpec {
        let value = match (&self.value, &child.value) {
            (Some(base), Some(over)) => Some(Value::merge_plain(base, over)),
            (base, None) => base.clone(),
            (None, Some(over)) => Some(over.clone()),
        };

        AttrSpec {
            value,
            getter: child.getter.clone().or_else(|| self.getter.clone()),
            setter: child.setter.clone().or_else(|| self.setter.clone()),
            validator: child.validator.clone().or_else(|| self.validator.clone()),
        }
    }
}

impl fmt::Debug for AttrSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttrSpec")
            .field("value", &self.value)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Merged specs of a class, in declaration order (ancestors first).
pub(crate) type AttrTable = IndexMap<String, AttrSpec>;

/// Overlay a class's own specs onto the table inherited from its parent.
pub(crate) fn resolve_table(
    inherited: Option<&AttrTable>,
    own: &IndexMap<String, AttrSpec>,
) -> AttrTable {
    let mut table = inherited.cloned().unwrap_or_default();
    for (name, spec) in own {
        let merged = match table.get(name) {
            Some(parent) => parent.overlay(spec),
            None => spec.clone(),
        };
        table.insert(name.clone(), merged);
    }
    table
}

/// Options for [`Instance::set_with`] and [`Instance::set_many`].
#[derive(Clone, Default)]
pub struct SetOptions {
    /// Store the value without notifying anyone.
    pub silent: bool,
    /// Called with `(name, value)` when a validator rejects the value.
    pub on_error: Option<ErrorCallback>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silent() -> Self {
        Self {
            silent: true,
            on_error: None,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Value) + 'static,
    {
        self.on_error = Some(Rc::new(f));
        self
    }
}

impl fmt::Debug for SetOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetOptions")
            .field("silent", &self.silent)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Per-instance attribute values.
#[derive(Debug, Default)]
pub(crate) struct AttrStore {
    values: ObjectMap,
}

impl AttrStore {
    /// Storage seeded with an independent copy of every default.
    pub(crate) fn from_table(table: &AttrTable) -> Self {
        Self {
            values: table
                .iter()
                .map(|(name, spec)| (name.clone(), spec.default_value()))
                .collect(),
        }
    }

    pub(crate) fn raw(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub(crate) fn store(&mut self, name: &str, value: Value) {
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.to_string(), value);
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.shift_remove(name)
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub(crate) fn snapshot(&self) -> Vec<(String, Value)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Instance {
    /// Current value of an attribute.
    ///
    /// A getter, if declared, computes the value (and may read other
    /// attributes); otherwise the stored value is returned. Unknown names
    /// yield `undefined`.
    pub fn get(&self, name: &str) -> Value {
        let layout = self.class().layout();
        match layout.attrs.get(name).and_then(|spec| spec.getter.clone()) {
            Some(getter) => getter(self),
            None => self.get_raw(name),
        }
    }

    /// Stored value of an attribute, bypassing any getter.
    pub fn get_raw(&self, name: &str) -> Value {
        self.data().attrs.borrow().raw(name)
    }

    /// Whether the instance stores a value under `name`.
    pub fn has_attr(&self, name: &str) -> bool {
        self.data().attrs.borrow().contains(name)
    }

    /// Stored attribute names in storage order.
    pub fn attr_names(&self) -> Vec<String> {
        self.data().attrs.borrow().names()
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> &Self {
        self.set_with(name, value, &SetOptions::default())
    }

    /// Validate, transform and store one attribute, then notify.
    ///
    /// 1. a rejecting validator aborts silently (or through `on_error`)
    /// 2. a setter replaces the value
    /// 3. a strictly equal value is a no-op
    /// 4. otherwise the value is stored and, unless silent, `_onChange<Attr>`
    ///    runs followed by the `change:<name>` event with `(new, old, name)`
    pub fn set_with(&self, name: &str, value: impl Into<Value>, options: &SetOptions) -> &Self {
        self.set_one(name, value.into(), options);
        self
    }

    /// Apply [`set_with`](Self::set_with) to each entry in order.
    ///
    /// Entries are independent: a rejected value does not stop the others.
    pub fn set_many<I, K, V>(&self, values: I, options: &SetOptions) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.set_one(name.as_ref(), value.into(), options);
        }
        self
    }

    /// Announce every attribute that holds a meaningful value.
    ///
    /// For each stored attribute, in storage order, whose current value is not
    /// empty (`undefined`, `null`, `""`, `[]`, `{}`), runs `_onChange<Attr>` and
    /// triggers `change:<name>` with `(value, undefined, name)`. Widgets call this
    /// from their render phase to apply all attributes at once. Has no effect
    /// while the instance is still being constructed.
    pub fn change(&self) -> &Self {
        if self.phase() != Phase::Ready {
            return self;
        }

        for name in self.attr_names() {
            let value = self.get(&name);
            if value.is_empty_attr() {
                continue;
            }
            self.notify_change(&name, &value, &Value::Undefined);
        }
        self
    }

    fn set_one(&self, name: &str, value: Value, options: &SetOptions) -> bool {
        let layout = self.class().layout();
        let spec = layout.attrs.get(name);

        if let Some(validator) = spec.and_then(|s| s.validator.as_ref()) {
            if !validator(self, &value) {
                debug!(instance = %self.id(), attr = name, "rejected {:?}", value);
                if let Some(on_error) = &options.on_error {
                    on_error(name, &value);
                }
                return false;
            }
        }

        let value = match spec.and_then(|s| s.setter.as_ref()) {
            Some(setter) => setter(self, value, name),
            None => value,
        };

        let prev = self.get_raw(name);
        if prev.strict_eq(&value) {
            return false;
        }

        self.data().attrs.borrow_mut().store(name, value.clone());
        trace!(instance = %self.id(), attr = name, "{:?} -> {:?}", prev, value);

        if options.silent || self.phase() != Phase::Ready {
            return true;
        }

        self.notify_change(name, &value, &prev);
        true
    }

    /// `_onChange<Attr>` first, then the `change:<name>` listeners.
    ///
    /// Under [`FailurePolicy::Halt`] a failing change method skips the listeners.
    pub(crate) fn notify_change(&self, name: &str, value: &Value, prev: &Value) {
        let args = [value.clone(), prev.clone(), Value::from(name)];

        let method = naming::change_method(name);
        if self.has_method(&method) {
            if let Err(err) = self.call(&method, &args) {
                tracing::warn!(instance = %self.id(), method = %method, "change handler failed: {}", err);
                if self.class().settings().failure_policy == FailurePolicy::Halt {
                    return;
                }
            }
        }

        self.dispatch(&naming::change_event(name), &args);
    }

    /// Overlay the construction config and run setters and validators once.
    ///
    /// This is what the root class's `initialize` does. Config values are
    /// stored by reference, except that a plain object landing on a plain
    /// object default is merged into a new object.
    pub(crate) fn init_attrs(&self, config: &Config) {
        {
            let mut store = self.data().attrs.borrow_mut();
            for (key, user) in config {
                let current = store.raw(key);
                let next = if current.is_plain_object() && user.is_plain_object() {
                    Value::merge_plain(&current, user)
                } else {
                    user.clone()
                };
                store.store(key, next);
            }
        }

        let layout = self.class().layout();
        for (name, spec) in layout.attrs.iter() {
            if let Some(validator) = &spec.validator {
                let current = self.get_raw(name);
                if !validator(self, &current) {
                    debug!(instance = %self.id(), attr = %name, "rejected initial {:?}", current);
                    self.data()
                        .attrs
                        .borrow_mut()
                        .store(name, spec.default_value());
                }
            }

            // Setter-only attributes absent from the config stay untouched.
            if let Some(setter) = &spec.setter {
                let current = self.get_raw(name);
                if !config.contains_key(name) && current.is_undefined() {
                    continue;
                }
                let next = setter(self, current, name);
                self.data().attrs.borrow_mut().store(name, next);
            }
        }
    }

    /// Drop an attribute from storage (declared handlers are consumed this way).
    pub(crate) fn take_attr(&self, name: &str) -> Option<Value> {
        self.data().attrs.borrow_mut().remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obj;

    #[test]
    fn test_overlay_keeps_inherited_fields() {
        let parent = AttrSpec::value("x").validator(|_, v| v.as_str().is_some());
        let child = AttrSpec::new().setter(|_, _, _| Value::from("x2"));

        let merged = parent.overlay(&child);

        assert_eq!(merged.value, Some(Value::from("x")));
        assert!(merged.setter.is_some());
        assert!(merged.validator.is_some());
    }

    #[test]
    fn test_overlay_child_setter_replaces_parent() {
        let parent = AttrSpec::value(1).setter(|_, _, _| Value::from("parent"));
        let child = AttrSpec::new().setter(|_, _, _| Value::from("child"));

        let merged = parent.overlay(&child);
        let (Some(parent_setter), Some(child_setter), Some(merged_setter)) =
            (&parent.setter, &child.setter, &merged.setter)
        else {
            panic!("setters missing");
        };
        assert!(Rc::ptr_eq(child_setter, merged_setter));
        assert!(!Rc::ptr_eq(parent_setter, merged_setter));
    }

    #[test]
    fn test_resolve_table_merges_nested_objects() {
        let mut base = IndexMap::new();
        base.insert(
            "size".to_string(),
            AttrSpec::value(obj! { "width": 100, "height": 100 }),
        );
        base.insert("color".to_string(), AttrSpec::value("#fff"));
        let base = resolve_table(None, &base);

        let mut own = IndexMap::new();
        own.insert("size".to_string(), AttrSpec::value(obj! { "width": 200 }));
        own.insert("extra".to_string(), AttrSpec::value(true));
        let table = resolve_table(Some(&base), &own);

        let keys: Vec<_> = table.keys().cloned().collect();
        assert_eq!(keys, vec!["size", "color", "extra"]);

        let size = table["size"].default_value();
        assert_eq!(size.field("width"), 200.0);
        assert_eq!(size.field("height"), 100.0);
    }

    #[test]
    fn test_store_seeded_with_copies() {
        let mut own = IndexMap::new();
        own.insert("list".to_string(), AttrSpec::value(crate::arr![1, 2, 3]));
        let table = resolve_table(None, &own);

        let a = AttrStore::from_table(&table);
        let b = AttrStore::from_table(&table);
        a.raw("list").push(4);

        assert_eq!(a.raw("list").len(), Some(4));
        assert_eq!(b.raw("list").len(), Some(3));
        assert_eq!(table["list"].default_value().len(), Some(3));
    }

    fn strict_with_failing_change(policy: FailurePolicy) -> (Instance, Rc<std::cell::Cell<u32>>) {
        let class = crate::Class::base().extend(
            crate::ClassDef::new("Strict")
                .attr("x", 1)
                .method("_onChangeX", |_, _| Err(crate::BaseError::failed("bad x")))
                .settings(crate::Settings::default().with_failure_policy(policy)),
        );
        let instance = class.create(Config::new()).expect("instance");

        let reached = Rc::new(std::cell::Cell::new(0));
        let r = Rc::clone(&reached);
        instance.on(
            "change:x",
            crate::Func::from_fn(move |_, _| {
                r.set(r.get() + 1);
                Value::Undefined
            }),
        );
        (instance, reached)
    }

    #[test]
    fn test_failing_change_method_halts_listeners() {
        let (instance, reached) = strict_with_failing_change(FailurePolicy::Halt);

        instance.set("x", 2);
        assert_eq!(instance.get("x"), 2.0);
        assert_eq!(reached.get(), 0);
    }

    #[test]
    fn test_failing_change_method_isolated_by_default() {
        let (instance, reached) = strict_with_failing_change(FailurePolicy::Isolate);

        instance.set("x", 2);
        assert_eq!(reached.get(), 1);
    }
}
