//! Class Builder.
//!
//! A [`Class`] is an immutable, reference-counted descriptor produced by
//! [`Class::extend`]. Everything derived from the hierarchy (merged attribute
//! specs, method table, declared-handler keys, settings) is resolved the first
//! time it is needed and then cached on the class.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;
use weft_core::alloc::HashMap;
use weft_core::config::Settings;

use crate::attrs::{AttrSpec, AttrTable, resolve_table};
use crate::config::Config;
use crate::error::BaseResult;
use crate::func::{Func, Initializer};
use crate::id::ClassId;
use crate::instance::Instance;
use crate::naming::{self, DeclaredHandler, HandlerKind};
use crate::value::Value;

/// Definition passed to [`Class::extend`].
///
/// ```
/// use weft_base::{Class, ClassDef, Config, Value};
///
/// let dialog = Class::base().extend(
///     ClassDef::new("Dialog")
///         .attr("title", "Untitled")
///         .method("show", |this, _| {
///             this.set("visible", true);
///             Ok(Value::Undefined)
///         }),
/// );
///
/// let d = dialog.create(Config::new()).unwrap();
/// d.call("show", &[]).unwrap();
/// assert_eq!(d.get("visible"), true);
/// ```
#[derive(Default)]
pub struct ClassDef {
    name: String,
    attrs: IndexMap<String, AttrSpec>,
    methods: IndexMap<String, Func>,
    initialize: Option<Initializer>,
    statics: IndexMap<String, Value>,
    settings: Option<Settings>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare an attribute with a default value.
    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attr_spec(name, AttrSpec::value(value))
    }

    /// Declare an attribute with a full spec.
    pub fn attr_spec(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.attrs.insert(name.into(), spec);
        self
    }

    pub fn method<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> BaseResult<Value> + 'static,
    {
        self.method_func(name, Func::new(f))
    }

    pub fn method_func(mut self, name: impl Into<String>, f: Func) -> Self {
        self.methods.insert(name.into(), f);
        self
    }

    /// Constructor body.
    ///
    /// Replaces the inherited one; delegate to the parent explicitly with
    /// `parent.initialize(this, config)` to keep attribute setup.
    pub fn initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance, &mut Config) -> BaseResult<()> + 'static,
    {
        self.initialize = Some(Rc::new(f));
        self
    }

    /// Mix in attributes and methods. Entries already in this definition win.
    pub fn implements(mut self, mixin: Mixin) -> Self {
        for (name, spec) in mixin.attrs {
            self.attrs.entry(name).or_insert(spec);
        }
        for (name, method) in mixin.methods {
            self.methods.entry(name).or_insert(method);
        }
        self
    }

    /// Class-level value. Statics are not inherited.
    pub fn statics(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.statics.insert(name.into(), value.into());
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// A reusable bundle of attributes and methods for [`ClassDef::implements`].
#[derive(Default, Clone)]
pub struct Mixin {
    attrs: IndexMap<String, AttrSpec>,
    methods: IndexMap<String, Func>,
}

impl Mixin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attr_spec(name, AttrSpec::value(value))
    }

    pub fn attr_spec(mut self, name: impl Into<String>, spec: AttrSpec) -> Self {
        self.attrs.insert(name.into(), spec);
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> BaseResult<Value> + 'static,
    {
        self.methods.insert(name.into(), Func::new(f));
        self
    }
}

/// Everything a class derives from its ancestors.
pub(crate) struct ClassLayout {
    pub(crate) attrs: AttrTable,
    pub(crate) methods: HashMap<String, Func>,
    /// `onChangeColor` -> `change:color`, `beforeShow` -> `show`, ...
    pub(crate) handler_keys: HashMap<String, DeclaredHandler>,
    pub(crate) settings: Settings,
}

impl ClassLayout {
    fn resolve(class: &Class) -> Self {
        let data = &class.0;
        let parent = data.parent.as_ref().map(Class::layout);

        let attrs = resolve_table(parent.as_ref().map(|p| &p.attrs), &data.attrs);

        let mut methods = parent
            .as_ref()
            .map(|p| p.methods.clone())
            .unwrap_or_default();
        for (name, method) in &data.methods {
            methods.insert(name.clone(), method.clone());
        }

        let mut handler_keys = HashMap::default();
        for attr in attrs.keys() {
            handler_keys.insert(
                naming::change_handler_key(HandlerKind::On, attr),
                DeclaredHandler {
                    kind: HandlerKind::On,
                    target: naming::change_event(attr),
                },
            );
        }
        for method in methods.keys() {
            for kind in [HandlerKind::Before, HandlerKind::After] {
                handler_keys.insert(
                    format!("{}{}", kind.prefix(), naming::ucfirst(method)),
                    DeclaredHandler {
                        kind,
                        target: method.clone(),
                    },
                );
            }
        }

        let settings = data
            .settings
            .or_else(|| parent.as_ref().map(|p| p.settings))
            .unwrap_or_default();

        debug!(
            class = %data.name,
            attrs = attrs.len(),
            methods = methods.len(),
            "resolved class layout"
        );

        Self {
            attrs,
            methods,
            handler_keys,
            settings,
        }
    }
}

struct ClassData {
    id: ClassId,
    name: String,
    parent: Option<Class>,
    attrs: IndexMap<String, AttrSpec>,
    methods: IndexMap<String, Func>,
    initialize: Option<Initializer>,
    statics: IndexMap<String, Value>,
    settings: Option<Settings>,
    layout: OnceCell<Rc<ClassLayout>>,
}

/// A component class. Cloning is cheap and yields the same class.
#[derive(Clone)]
pub struct Class(Rc<ClassData>);

thread_local! {
    static BASE: Class = Class::root();
}

impl Class {
    /// The root class every other class extends.
    ///
    /// Its `initialize` performs attribute setup from the construction config.
    pub fn base() -> Class {
        BASE.with(Class::clone)
    }

    fn root() -> Class {
        fn setup_attrs(this: &Instance, config: &mut Config) -> BaseResult<()> {
            this.init_attrs(config);
            Ok(())
        }
        let initialize: Initializer = Rc::new(setup_attrs);

        Class(Rc::new(ClassData {
            id: ClassId::next(),
            name: "Base".to_string(),
            parent: None,
            attrs: IndexMap::new(),
            methods: IndexMap::new(),
            initialize: Some(initialize),
            statics: IndexMap::new(),
            settings: None,
            layout: OnceCell::new(),
        }))
    }

    /// Derive a subclass.
    pub fn extend(&self, def: ClassDef) -> Class {
        let ClassDef {
            name,
            attrs,
            methods,
            initialize,
            statics,
            settings,
        } = def;

        let class = Class(Rc::new(ClassData {
            id: ClassId::next(),
            name,
            parent: Some(self.clone()),
            attrs,
            methods,
            initialize,
            statics,
            settings,
            layout: OnceCell::new(),
        }));
        debug!(class = %class.name(), parent = %self.name(), id = %class.id(), "extend");
        class
    }

    pub fn id(&self) -> ClassId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn superclass(&self) -> Option<&Class> {
        self.0.parent.as_ref()
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_subclass_of(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.superclass();
        }
        false
    }

    pub(crate) fn layout(&self) -> Rc<ClassLayout> {
        Rc::clone(self.0.layout.get_or_init(|| Rc::new(ClassLayout::resolve(self))))
    }

    /// Merged spec of an attribute.
    pub fn attr_spec(&self, name: &str) -> Option<AttrSpec> {
        self.layout().attrs.get(name).cloned()
    }

    /// Names of every declared attribute, ancestors first.
    pub fn attr_names(&self) -> Vec<String> {
        self.layout().attrs.keys().cloned().collect()
    }

    /// Independent copy of the merged default of an attribute.
    pub fn default_value(&self, name: &str) -> Value {
        self.layout()
            .attrs
            .get(name)
            .map(AttrSpec::default_value)
            .unwrap_or_default()
    }

    /// The class-level implementation of a method, own or inherited.
    ///
    /// Explicit super-calls go through the parent:
    /// `class.superclass().and_then(|p| p.method("show"))`.
    pub fn method(&self, name: &str) -> Option<Func> {
        self.layout().methods.get(name).cloned()
    }

    pub fn static_value(&self, name: &str) -> Option<Value> {
        self.0.statics.get(name).cloned()
    }

    pub fn settings(&self) -> Settings {
        self.layout().settings
    }

    /// Run this class's constructor body on `this`.
    ///
    /// Uses the nearest `initialize` along the chain; for the root that is
    /// attribute setup.
    pub fn initialize(&self, this: &Instance, config: &mut Config) -> BaseResult<()> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(initialize) = &class.0.initialize {
                return initialize(this, config);
            }
            current = class.superclass();
        }
        Ok(())
    }

    /// Construct an instance.
    ///
    /// Storage is seeded with the merged defaults, the `initialize` chain
    /// runs with the config, declared `on*` / `before*` / `after*` handlers are
    /// bound, and only then does the instance start emitting change events.
    pub fn create(&self, config: Config) -> BaseResult<Instance> {
        let mut config = config;
        let instance = Instance::allocate(self.clone());

        self.initialize(&instance, &mut config)?;
        instance.bind_declared_handlers(&config)?;
        instance.finish_construction();

        debug!(class = %self.name(), instance = %instance.id(), "created");
        Ok(instance)
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("parent", &self.superclass().map(Class::name))
            .finish()
    }
}
