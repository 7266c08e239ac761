//! Weft - a component object model for UI widgets
//!
//! Widgets built on Weft share one object model:
//!
//! - **Classes**: single inheritance through [`Class::extend`], with explicit
//!   super-calls via [`Class::superclass`]
//! - **Attributes**: declared defaults, getters, setters and validators merged
//!   across the hierarchy and copied per instance
//! - **Events**: `on` / `off` / `trigger`, plus `change:<attr>` notifications
//! - **Advice**: `before` / `after` hooks on named methods
//!
//! # Quick Start
//!
//! ```
//! use weft::prelude::*;
//!
//! weft::logging::init();
//!
//! let counter = Class::base().extend(
//!     ClassDef::new("Counter")
//!         .attr("count", 0)
//!         .method("increment", |this, _| {
//!             let count = this.get("count").as_f64().unwrap_or(0.0);
//!             this.set("count", count + 1.0);
//!             Ok(Value::Undefined)
//!         }),
//! );
//!
//! let c = counter.create(Config::new()).unwrap();
//! c.on("change:count", Func::from_fn(|_, args| {
//!     tracing::info!("count is now {:?}", args[0]);
//!     Value::Undefined
//! }));
//! c.call("increment", &[]).unwrap();
//! assert_eq!(c.get("count"), 1.0);
//! ```

pub use weft_base as base;
pub use weft_core as core;
pub use weft_core::logging;

pub use weft_base::{
    AttrSpec, BaseError, BaseResult, Class, ClassDef, Config, FailurePolicy, Func, Instance,
    Mixin, SetOptions, Settings, Value, arr, obj,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use weft_base::{
        AttrSpec, BaseError, BaseResult, Class, ClassDef, Config, Func, Instance, Mixin,
        SetOptions, Value, WeakInstance, arr, obj,
    };

    // Host collaborators
    pub use weft_base::{Cancellable, Dom, DomHandler, ElementSet, Offset, Scheduler};

    pub use weft_core::config::{FailurePolicy, Settings};
}
