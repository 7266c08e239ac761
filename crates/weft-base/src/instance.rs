//! Component instances and their lifecycle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::aspect::MethodSlots;
use crate::attrs::AttrStore;
use crate::class::Class;
use crate::config::Config;
use crate::error::BaseResult;
use crate::events::ListenerTable;
use crate::id::InstanceId;
use crate::naming::{self, DeclaredHandler, HandlerKind};

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside [`Class::create`]; change notifications are suppressed.
    Constructing,
    Ready,
    /// [`Instance::destroy`] has run.
    Destroyed,
}

type TeardownHook = Box<dyn FnOnce()>;

pub(crate) struct InstanceData {
    id: InstanceId,
    class: Class,
    pub(crate) attrs: RefCell<AttrStore>,
    pub(crate) events: RefCell<ListenerTable>,
    pub(crate) methods: RefCell<MethodSlots>,
    phase: Cell<Phase>,
    teardown: RefCell<Vec<TeardownHook>>,
}

/// An instance of a [`Class`].
///
/// A cheap handle: clones refer to the same instance. Handlers that capture
/// their own instance form a reference cycle that [`Instance::destroy`] breaks.
#[derive(Clone)]
pub struct Instance(Rc<InstanceData>);

static_assertions::assert_eq_size!(Instance, Option<Instance>);
static_assertions::assert_not_impl_any!(Instance: Send, Sync);

/// Non-owning reference to an [`Instance`].
#[derive(Clone)]
pub struct WeakInstance(Weak<InstanceData>);

impl WeakInstance {
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }
}

impl fmt::Debug for WeakInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(instance) => write!(f, "WeakInstance({})", instance.id()),
            None => write!(f, "WeakInstance(dropped)"),
        }
    }
}

impl Instance {
    /// A new instance with storage seeded from the class defaults.
    pub(crate) fn allocate(class: Class) -> Self {
        let attrs = AttrStore::from_table(&class.layout().attrs);
        Instance(Rc::new(InstanceData {
            id: InstanceId::next(),
            class,
            attrs: RefCell::new(attrs),
            events: RefCell::new(ListenerTable::default()),
            methods: RefCell::new(MethodSlots::default()),
            phase: Cell::new(Phase::Constructing),
            teardown: RefCell::new(Vec::new()),
        }))
    }

    pub fn id(&self) -> InstanceId {
        self.0.id
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    pub fn phase(&self) -> Phase {
        self.0.phase.get()
    }

    pub(crate) fn data(&self) -> &InstanceData {
        &self.0
    }

    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the instance's class is `class` or one of its subclasses.
    pub fn instance_of(&self, class: &Class) -> bool {
        self.class().is_subclass_of(class)
    }

    /// Bind function-valued `on*` / `before*` / `after*` entries.
    ///
    /// Stored entries (class defaults overlaid with config) come first, then
    /// config entries that never reached storage. Bound entries are removed
    /// from storage. Advice on a missing method fails the construction.
    pub(crate) fn bind_declared_handlers(&self, config: &Config) -> BaseResult<()> {
        let layout = self.class().layout();
        let resolve = |key: &str| -> Option<DeclaredHandler> {
            layout
                .handler_keys
                .get(key)
                .cloned()
                .or_else(|| naming::parse_handler_key(key))
        };

        let stored = self.data().attrs.borrow().snapshot();
        let mut pending = Vec::new();
        for (key, value) in stored {
            if let (Some(handler), Some(func)) = (resolve(key.as_str()), value.as_func()) {
                pending.push((key, handler, func.clone(), true));
            }
        }
        for (key, value) in config {
            if self.has_attr(key) {
                continue;
            }
            if let (Some(handler), Some(func)) = (resolve(key.as_str()), value.as_func()) {
                pending.push((key.clone(), handler, func.clone(), false));
            }
        }

        for (key, handler, func, stored) in pending {
            match handler.kind {
                HandlerKind::On => {
                    self.on(&handler.target, func);
                }
                HandlerKind::Before => {
                    self.before(&handler.target, func)?;
                }
                HandlerKind::After => {
                    self.after(&handler.target, func)?;
                }
            }
            if stored {
                self.take_attr(&key);
            }
            debug!(instance = %self.id(), key = %key, target = %handler.target, "bound declared handler");
        }
        Ok(())
    }

    pub(crate) fn finish_construction(&self) {
        self.0.phase.set(Phase::Ready);
    }

    /// Release everything the instance holds.
    ///
    /// Calls the `destroy` method if there is one, runs the registered
    /// teardown hooks newest first, then drops every listener and every
    /// advice. Calling it again does nothing.
    pub fn destroy(&self) {
        if self.phase() == Phase::Destroyed {
            return;
        }
        self.0.phase.set(Phase::Destroyed);

        if self.has_method("destroy") {
            if let Err(err) = self.call("destroy", &[]) {
                warn!(instance = %self.id(), "destroy method failed: {}", err);
            }
        }

        let hooks = std::mem::take(&mut *self.0.teardown.borrow_mut());
        for hook in hooks.into_iter().rev() {
            hook();
        }

        self.off_all();
        self.0.methods.borrow_mut().clear_advice();
        debug!(instance = %self.id(), class = %self.class().name(), "destroyed");
    }

    /// Run `hook` during [`destroy`](Self::destroy). On a destroyed instance
    /// the hook runs immediately.
    pub fn on_destroy<F>(&self, hook: F) -> &Self
    where
        F: FnOnce() + 'static,
    {
        if self.phase() == Phase::Destroyed {
            hook();
        } else {
            self.0.teardown.borrow_mut().push(Box::new(hook));
        }
        self
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id())
            .field("class", &self.class().name())
            .field("phase", &self.phase())
            .finish()
    }
}
