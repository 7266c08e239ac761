//! Method resolution and before/after advice.
//!
//! Methods resolve in this order: the woven wrapper installed by
//! [`Instance::before`] / [`Instance::after`], a per-instance method from
//! [`Instance::define_method`], then the class method table. Weaving keeps the
//! original in a side table; nothing in the class is modified.

use tracing::warn;
use weft_core::alloc::HashMap;
use weft_core::config::FailurePolicy;

use crate::error::{BaseError, BaseResult};
use crate::func::Func;
use crate::instance::Instance;
use crate::value::Value;

#[derive(Clone)]
struct Woven {
    original: Func,
    before: Vec<Func>,
    after: Vec<Func>,
}

#[derive(Clone, Copy, Debug)]
enum Advice {
    Before,
    After,
}

#[derive(Default)]
pub(crate) struct MethodSlots {
    own: HashMap<String, Func>,
    woven: HashMap<String, Woven>,
}

impl MethodSlots {
    pub(crate) fn clear_advice(&mut self) {
        self.woven.clear();
    }
}

impl Instance {
    /// Run `advice` before each of the whitespace-separated `methods`.
    ///
    /// Advice receives the call's arguments. Fails with
    /// [`BaseError::UnknownMethodForAdvice`] if any name is not a method, in
    /// which case nothing is registered.
    pub fn before(&self, methods: &str, advice: Func) -> BaseResult<&Self> {
        self.weave(methods, advice, Advice::Before)
    }

    /// Run `advice` after each of the whitespace-separated `methods`.
    ///
    /// Advice receives the method's return value followed by the call's
    /// arguments.
    pub fn after(&self, methods: &str, advice: Func) -> BaseResult<&Self> {
        self.weave(methods, advice, Advice::After)
    }

    /// Invoke a method by name, advice included.
    pub fn call(&self, name: &str, args: &[Value]) -> BaseResult<Value> {
        let woven = self.data().methods.borrow().woven.get(name).cloned();
        if let Some(woven) = woven {
            return self.invoke_woven(name, &woven, args);
        }

        match self.unwoven_method(name) {
            Some(method) => method.call(self, args),
            None => Err(BaseError::MethodNotFound {
                method: name.to_string(),
            }),
        }
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.data().methods.borrow().woven.contains_key(name) || self.unwoven_method(name).is_some()
    }

    /// The callable `call(name, ..)` would run, advice included.
    pub fn method(&self, name: &str) -> Option<Func> {
        if self.data().methods.borrow().woven.contains_key(name) {
            let name = name.to_string();
            return Some(Func::new(move |this, args| this.call(&name, args)));
        }
        self.unwoven_method(name)
    }

    /// Give this instance its own implementation of a method.
    ///
    /// Shadows the class method and discards any advice on that name.
    pub fn define_method<F>(&self, name: &str, f: F) -> &Self
    where
        F: Fn(&Instance, &[Value]) -> BaseResult<Value> + 'static,
    {
        let mut slots = self.data().methods.borrow_mut();
        slots.woven.remove(name);
        slots.own.insert(name.to_string(), Func::new(f));
        self
    }

    fn unwoven_method(&self, name: &str) -> Option<Func> {
        let own = self.data().methods.borrow().own.get(name).cloned();
        own.or_else(|| self.class().method(name))
    }

    fn weave(&self, methods: &str, advice: Func, kind: Advice) -> BaseResult<&Self> {
        let mut targets = Vec::new();
        for name in methods.split_whitespace() {
            let existing = self
                .data()
                .methods
                .borrow()
                .woven
                .get(name)
                .map(|w| w.original.clone());
            let original = existing
                .or_else(|| self.unwoven_method(name))
                .ok_or_else(|| BaseError::UnknownMethodForAdvice {
                    method: name.to_string(),
                })?;
            targets.push((name, original));
        }

        let mut slots = self.data().methods.borrow_mut();
        for (name, original) in targets {
            let woven = slots
                .woven
                .entry(name.to_string())
                .or_insert_with(|| Woven {
                    original,
                    before: Vec::new(),
                    after: Vec::new(),
                });
            match kind {
                Advice::Before => woven.before.push(advice.clone()),
                Advice::After => woven.after.push(advice.clone()),
            }
        }
        Ok(self)
    }

    fn invoke_woven(&self, name: &str, woven: &Woven, args: &[Value]) -> BaseResult<Value> {
        let halt = self.class().settings().failure_policy == FailurePolicy::Halt;

        for advice in &woven.before {
            if let Err(err) = advice.call(self, args) {
                warn!(instance = %self.id(), method = name, "before advice failed: {}", err);
                if halt {
                    return Err(err);
                }
            }
        }

        let ret = woven.original.call(self, args)?;

        if !woven.after.is_empty() {
            let mut after_args = Vec::with_capacity(args.len() + 1);
            after_args.push(ret.clone());
            after_args.extend_from_slice(args);

            for advice in &woven.after {
                if let Err(err) = advice.call(self, &after_args) {
                    warn!(instance = %self.id(), method = name, "after advice failed: {}", err);
                    if halt {
                        return Err(err);
                    }
                }
            }
        }

        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::{BaseError, Class, ClassDef, Config, Func, Instance, Value};

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Func {
        let log = Rc::clone(log);
        Func::from_fn(move |_, args| {
            log.borrow_mut().push(format!("{}{:?}", tag, args));
            Value::Undefined
        })
    }

    fn widget(log: &Rc<RefCell<Vec<String>>>) -> Instance {
        let l = Rc::clone(log);
        Class::base()
            .extend(
                ClassDef::new("Widget")
                    .method("add", move |_, args| {
                        l.borrow_mut().push("add".to_string());
                        let sum = args.iter().filter_map(Value::as_f64).sum::<f64>();
                        Ok(Value::from(sum))
                    })
                    .method("fail", |_, _| Err(BaseError::failed("nope"))),
            )
            .create(Config::new())
            .unwrap()
    }

    #[test]
    fn test_advice_order_and_arguments() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);

        w.before("add", recorder(&log, "b1")).unwrap();
        w.after("add", recorder(&log, "a1")).unwrap();
        w.before("add", recorder(&log, "b2")).unwrap();

        let ret = w.call("add", &[Value::from(1), Value::from(2)]).unwrap();
        assert_eq!(ret, 3.0);
        assert_eq!(
            *log.borrow(),
            vec![
                "b1[1, 2]".to_string(),
                "b2[1, 2]".to_string(),
                "add".to_string(),
                "a1[3, 1, 2]".to_string(),
            ]
        );
    }

    #[test]
    fn test_unknown_method_registers_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);

        let err = w.before("add zzz", recorder(&log, "b")).unwrap_err();
        assert_eq!(
            err,
            BaseError::UnknownMethodForAdvice {
                method: "zzz".to_string()
            }
        );

        w.call("add", &[]).unwrap();
        assert_eq!(*log.borrow(), vec!["add".to_string()]);
    }

    #[test]
    fn test_original_failure_skips_after() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);
        w.after("fail", recorder(&log, "a")).unwrap();

        assert!(w.call("fail", &[]).is_err());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_failing_advice_is_isolated() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);
        w.before("add", Func::new(|_, _| Err(BaseError::failed("advice"))))
            .unwrap();

        assert_eq!(w.call("add", &[Value::from(5)]).unwrap(), 5.0);
    }

    #[test]
    fn test_method_accessor_includes_advice() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);
        w.before("add", recorder(&log, "b")).unwrap();

        let add = w.method("add").unwrap();
        add.call(&w, &[]).unwrap();
        assert_eq!(log.borrow().len(), 2);
        assert!(w.method("missing").is_none());
        assert!(matches!(
            w.call("missing", &[]),
            Err(BaseError::MethodNotFound { .. })
        ));
    }

    #[test]
    fn test_define_method_drops_advice() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let w = widget(&log);
        w.before("add", recorder(&log, "b")).unwrap();

        w.define_method("add", |_, _| Ok(Value::from("own")));
        assert_eq!(w.call("add", &[]).unwrap(), "own");
        assert!(log.borrow().is_empty());

        // Other instances keep the class method
        let other = widget(&log);
        assert_eq!(other.call("add", &[Value::from(2)]).unwrap(), 2.0);
    }
}
