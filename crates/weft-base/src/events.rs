//! Per-instance publish/subscribe.
//!
//! Listeners are kept per event name in registration order. A dispatch works on
//! a snapshot taken when it starts, so listeners added or removed by a handler
//! take effect from the next `trigger`. Listeners on the special `all` event
//! see every trigger, with the event name prepended to the arguments.

use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::error::{BaseError, BaseResult};
use crate::func::Func;
use crate::instance::{Instance, WeakInstance};
use crate::value::Value;
use weft_core::config::FailurePolicy;

/// Event name that receives every trigger.
pub const ALL_EVENTS: &str = "all";

#[derive(Clone)]
enum ListenerContext {
    /// `this` is the emitting instance
    Owner,
    /// `this` is another instance, held weakly
    Other(WeakInstance),
}

#[derive(Clone)]
pub(crate) struct Listener {
    handler: Func,
    context: ListenerContext,
    once: bool,
}

#[derive(Default)]
pub(crate) struct ListenerTable {
    events: IndexMap<String, Vec<Listener>>,
}

impl ListenerTable {
    fn add(&mut self, event: &str, listener: Listener) {
        self.events
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove listeners matching the optional event and handler filters.
    fn remove(&mut self, event: Option<&str>, handler: Option<&Func>) {
        match (event, handler) {
            (None, None) => self.events.clear(),
            (Some(event), None) => {
                self.events.shift_remove(event);
            }
            (event, Some(handler)) => {
                for (name, listeners) in self.events.iter_mut() {
                    if event.is_none_or(|e| name.as_str() == e) {
                        listeners.retain(|l| !l.handler.ptr_eq(handler));
                    }
                }
                self.events.retain(|_, listeners| !listeners.is_empty());
            }
        }
    }

    /// Listeners for one dispatch. One-shot listeners leave the table here.
    fn take_snapshot(&mut self, event: &str) -> Vec<Listener> {
        let Some(listeners) = self.events.get_mut(event) else {
            return Vec::new();
        };
        let snapshot = listeners.clone();
        if snapshot.iter().any(|l| l.once) {
            listeners.retain(|l| !l.once);
            if listeners.is_empty() {
                self.events.shift_remove(event);
            }
        }
        snapshot
    }

    fn count(&self, event: &str) -> usize {
        self.events.get(event).map_or(0, Vec::len)
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

fn split_events(events: &str) -> impl Iterator<Item = &str> {
    events.split_whitespace()
}

impl Instance {
    /// Register `handler` for each space-separated event name.
    pub fn on(&self, events: &str, handler: Func) -> &Self {
        self.add_listener(events, handler, ListenerContext::Owner, false)
    }

    /// Like [`on`](Self::on), with `context` passed as `this` to the handler.
    ///
    /// The context is held weakly; once it is dropped the listener is skipped.
    pub fn on_with(&self, events: &str, handler: Func, context: &Instance) -> &Self {
        let context = if context.ptr_eq(self) {
            ListenerContext::Owner
        } else {
            ListenerContext::Other(context.downgrade())
        };
        self.add_listener(events, handler, context, false)
    }

    /// Register a listener that is removed after its first dispatch.
    pub fn once(&self, events: &str, handler: Func) -> &Self {
        self.add_listener(events, handler, ListenerContext::Owner, true)
    }

    /// Remove listeners.
    ///
    /// - `off(None, None)` removes everything
    /// - `off(Some(events), None)` removes every listener of those events
    /// - `off(Some(events), Some(h))` removes only `h` from those events
    /// - `off(None, Some(h))` removes `h` from every event
    ///
    /// Removing something that is not registered is a no-op.
    pub fn off(&self, events: Option<&str>, handler: Option<&Func>) -> &Self {
        let mut table = self.data().events.borrow_mut();
        match events {
            Some(events) => {
                for event in split_events(events) {
                    table.remove(Some(event), handler);
                }
            }
            None => table.remove(None, handler),
        }
        self
    }

    /// Remove every listener of every event.
    pub fn off_all(&self) -> &Self {
        self.off(None, None)
    }

    /// Invoke the listeners of each space-separated event, in registration order.
    ///
    /// A failing listener is logged and, under [`FailurePolicy::Isolate`], the
    /// remaining listeners still run. Use [`try_trigger`](Self::try_trigger) to
    /// observe failures.
    ///
    /// Under [`FailurePolicy::Halt`] the events after the first failing one are
    /// not dispatched.
    pub fn trigger(&self, events: &str, args: &[Value]) -> &Self {
        // Failures are already logged per listener.
        let _ = self.try_trigger(events, args);
        self
    }

    /// [`trigger`](Self::trigger), reporting listener failures to the caller.
    pub fn try_trigger(&self, events: &str, args: &[Value]) -> BaseResult<&Self> {
        let halt = self.class().settings().failure_policy == FailurePolicy::Halt;
        let mut failures = Vec::new();
        let mut failed_event = String::new();
        for event in split_events(events) {
            let errors = self.dispatch(event, args);
            if errors.is_empty() {
                continue;
            }
            if failures.is_empty() {
                failed_event = event.to_string();
            }
            failures.extend(errors);
            if halt {
                break;
            }
        }

        if failures.is_empty() {
            Ok(self)
        } else {
            Err(BaseError::HandlerFailures {
                event: failed_event,
                failures,
            })
        }
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.data().events.borrow().count(event)
    }

    fn add_listener(
        &self,
        events: &str,
        handler: Func,
        context: ListenerContext,
        once: bool,
    ) -> &Self {
        let mut table = self.data().events.borrow_mut();
        for event in split_events(events) {
            table.add(
                event,
                Listener {
                    handler: handler.clone(),
                    context: context.clone(),
                    once,
                },
            );
        }
        self
    }

    /// Dispatch one event; returns the failures, which have already been logged.
    pub(crate) fn dispatch(&self, event: &str, args: &[Value]) -> Vec<BaseError> {
        let settings = self.class().settings();
        let (listeners, catch_all) = {
            let mut table = self.data().events.borrow_mut();
            let listeners = table.take_snapshot(event);
            let catch_all = if event == ALL_EVENTS {
                Vec::new()
            } else {
                table.take_snapshot(ALL_EVENTS)
            };
            (listeners, catch_all)
        };

        if listeners.is_empty() && catch_all.is_empty() {
            return Vec::new();
        }

        let mut failures = Vec::new();
        let halt = settings.failure_policy == FailurePolicy::Halt;

        for listener in &listeners {
            if settings.trace_dispatch {
                trace!(instance = %self.id(), event, "dispatch {:?}", listener.handler);
            }
            if let Err(err) = self.invoke_listener(listener, args) {
                warn!(instance = %self.id(), event, "listener failed: {}", err);
                failures.push(err);
                if halt {
                    return failures;
                }
            }
        }

        if !catch_all.is_empty() {
            let mut all_args = Vec::with_capacity(args.len() + 1);
            all_args.push(Value::from(event));
            all_args.extend_from_slice(args);

            for listener in &catch_all {
                if let Err(err) = self.invoke_listener(listener, &all_args) {
                    warn!(instance = %self.id(), event, "'all' listener failed: {}", err);
                    failures.push(err);
                    if halt {
                        break;
                    }
                }
            }
        }

        failures
    }

    fn invoke_listener(&self, listener: &Listener, args: &[Value]) -> BaseResult<Value> {
        match &listener.context {
            ListenerContext::Owner => listener.handler.call(self, args),
            ListenerContext::Other(weak) => match weak.upgrade() {
                Some(context) => listener.handler.call(&context, args),
                None => {
                    trace!(instance = %self.id(), "listener context dropped; skipped");
                    Ok(Value::Undefined)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::{Class, ClassDef, Config, FailurePolicy, Func, Settings, Value};

    fn instance() -> crate::Instance {
        Class::base()
            .create(Config::new())
            .expect("bare instance")
    }

    fn counter() -> (Rc<Cell<u32>>, Func) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let handler = Func::from_fn(move |_, _| {
            c.set(c.get() + 1);
            Value::Undefined
        });
        (count, handler)
    }

    #[test]
    fn test_on_trigger_in_order() {
        let a = instance();
        let log = Rc::new(RefCell::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            a.on(
                "show",
                Func::from_fn(move |_, _| {
                    log.borrow_mut().push(tag);
                    Value::Undefined
                }),
            );
        }

        a.trigger("show", &[]);
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_multi_event_registration() {
        let a = instance();
        let (count, handler) = counter();

        a.on("show hide", handler);
        a.trigger("show", &[]).trigger("hide", &[]).trigger("other", &[]);
        assert_eq!(count.get(), 2);

        a.trigger("show hide", &[]);
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn test_arguments_forwarded() {
        let a = instance();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        a.on(
            "move",
            Func::from_fn(move |_, args| {
                s.borrow_mut().extend(args.iter().cloned());
                Value::Undefined
            }),
        );

        a.trigger("move", &[Value::from(1), Value::from("x")]);
        assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from("x")]);
    }

    #[test]
    fn test_off_variants() {
        let a = instance();
        let (count_a, handler_a) = counter();
        let (count_b, handler_b) = counter();

        a.on("e1 e2", handler_a.clone());
        a.on("e1", handler_b.clone());

        a.off(Some("e1"), Some(&handler_a));
        a.trigger("e1 e2", &[]);
        assert_eq!((count_a.get(), count_b.get()), (1, 1));

        a.off(Some("e1"), None);
        a.trigger("e1 e2", &[]);
        assert_eq!((count_a.get(), count_b.get()), (2, 1));

        // Removing what is not there is fine
        a.off(Some("missing"), Some(&handler_b));
        a.off(None, Some(&handler_b));

        a.off(None, None);
        a.trigger("e1 e2", &[]);
        assert_eq!((count_a.get(), count_b.get()), (2, 1));
        assert!(!a.has_listeners("e2"));
    }

    #[test]
    fn test_off_handler_everywhere() {
        let a = instance();
        let (count, handler) = counter();
        a.on("e1 e2 e3", handler.clone());
        assert_eq!(a.listener_count("e2"), 1);

        a.off(None, Some(&handler));
        a.trigger("e1 e2 e3", &[]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_once() {
        let a = instance();
        let (count, handler) = counter();
        a.once("ready", handler);

        a.trigger("ready", &[]).trigger("ready", &[]);
        assert_eq!(count.get(), 1);
        assert!(!a.has_listeners("ready"));
    }

    #[test]
    fn test_all_event() {
        let a = instance();
        let names = Rc::new(RefCell::new(Vec::new()));
        let n = Rc::clone(&names);
        a.on(
            "all",
            Func::from_fn(move |_, args| {
                n.borrow_mut().push(args[0].clone());
                Value::Undefined
            }),
        );

        a.trigger("show hide", &[Value::from(1)]);
        assert_eq!(*names.borrow(), vec![Value::from("show"), Value::from("hide")]);
    }

    #[test]
    fn test_failure_isolated() {
        let a = instance();
        let (count, handler) = counter();

        a.on("e", Func::new(|_, _| Err(crate::BaseError::failed("boom"))));
        a.on("e", handler);

        a.trigger("e", &[]);
        assert_eq!(count.get(), 1);

        let err = a.try_trigger("e", &[]).err();
        assert_eq!(count.get(), 2);
        match err {
            Some(crate::BaseError::HandlerFailures { event, failures }) => {
                assert_eq!(event, "e");
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failure_halts_when_configured() {
        let class = Class::base().extend(
            ClassDef::new("Strict").settings(Settings::default().with_failure_policy(FailurePolicy::Halt)),
        );
        let a = class.create(Config::new()).expect("instance");
        let (count, handler) = counter();

        a.on("e", Func::new(|_, _| Err(crate::BaseError::failed("boom"))));
        a.on("e", handler);

        assert!(a.try_trigger("e", &[]).is_err());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_halt_skips_remaining_events() {
        let class = Class::base().extend(
            ClassDef::new("Strict").settings(Settings::default().with_failure_policy(FailurePolicy::Halt)),
        );
        let a = class.create(Config::new()).expect("instance");
        let (count, handler) = counter();

        a.on("first", Func::new(|_, _| Err(crate::BaseError::failed("boom"))));
        a.on("second", handler);

        match a.try_trigger("first second", &[]) {
            Err(crate::BaseError::HandlerFailures { event, failures }) => {
                assert_eq!(event, "first");
                assert_eq!(failures.len(), 1);
            }
            other => panic!("unexpected {:?}", other.map(|_| ())),
        }
        a.trigger("first second", &[]);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_listener_added_during_dispatch_waits() {
        let a = instance();
        let (count, late) = counter();
        a.on(
            "e",
            Func::from_fn(move |this, _| {
                this.on("e", late.clone());
                Value::Undefined
            }),
        );

        a.trigger("e", &[]);
        assert_eq!(count.get(), 0);
        a.trigger("e", &[]);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_on_with_context() {
        let emitter = instance();
        let receiver = instance();
        let receiver_id = receiver.id();
        let seen = Rc::new(Cell::new(None));
        let s = Rc::clone(&seen);

        emitter.on_with(
            "ping",
            Func::from_fn(move |this, _| {
                s.set(Some(this.id()));
                Value::Undefined
            }),
            &receiver,
        );

        emitter.trigger("ping", &[]);
        assert_eq!(seen.get(), Some(receiver_id));

        seen.set(None);
        drop(receiver);
        emitter.trigger("ping", &[]);
        assert_eq!(seen.get(), None);
    }
}
