//! Contracts for the host environment.
//!
//! The engine never touches a DOM or a timer itself. Widgets that need them
//! receive implementations of these traits and register what they acquire
//! with the instance, so that [`Instance::destroy`] releases it.

use std::rc::Rc;

use crate::instance::Instance;
use crate::value::Value;

/// Document position of an element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub top: f64,
    pub left: f64,
}

/// A pending timer or any other resource that can be stopped early.
pub trait Cancellable {
    fn cancel(&self);
}

/// Callback attached to an element event. Receives the host's event payload.
pub type DomHandler = Rc<dyn Fn(&Value)>;

/// Timer facility.
pub trait Scheduler {
    type Handle: Cancellable + 'static;

    /// Run `f` after `ms` milliseconds, and every `ms` after that if `repeat`.
    fn later(&self, f: Box<dyn FnMut()>, ms: u64, repeat: bool) -> Self::Handle;

    /// Debounce `f`: the returned function runs it once calls have paused for
    /// `ms` milliseconds.
    fn buffer(&self, f: Rc<dyn Fn()>, ms: u64) -> Rc<dyn Fn()>;
}

/// The result of a selection: zero or more elements handled as one.
pub trait ElementSet {
    fn on(&self, event: &str, handler: DomHandler);

    /// Detach `handler`, or every handler of `event` when `None`.
    fn off(&self, event: &str, handler: Option<&DomHandler>);

    fn offset(&self) -> Offset;

    fn height(&self) -> f64;

    fn scroll_top(&self) -> f64;
}

pub trait Dom {
    type Set: ElementSet + 'static;

    fn select(&self, selector: &str) -> Self::Set;
}

/// Whether `element` is vertically inside the visible part of `viewport`.
pub fn in_viewport(viewport: &impl ElementSet, element: &impl ElementSet) -> bool {
    let scroll_top = viewport.scroll_top();
    let top = element.offset().top;
    top > scroll_top && top + element.height() < scroll_top + viewport.height()
}

impl Instance {
    /// Cancel `handle` when the instance is destroyed.
    pub fn track_timer<H>(&self, handle: H) -> &Self
    where
        H: Cancellable + 'static,
    {
        self.on_destroy(move || handle.cancel())
    }

    /// Attach `handler` to `event` on `set`; detached when the instance is
    /// destroyed.
    pub fn bind_element<S>(&self, set: S, event: &str, handler: DomHandler) -> &Self
    where
        S: ElementSet + 'static,
    {
        set.on(event, Rc::clone(&handler));
        let event = event.to_string();
        self.on_destroy(move || set.off(&event, Some(&handler)))
    }
}
