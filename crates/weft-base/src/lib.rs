//! Weft Base - the object model every Weft widget is built on.
//!
//! A widget class is produced by extending [`Class::base`] with a [`ClassDef`].
//! Every instance of such a class carries:
//! - Declarative attributes with getter/setter/validator pipelines, merged
//!   across the class hierarchy
//! - Change notification (`_onChange<Attr>` methods and `change:<attr>` events)
//! - A per-instance event emitter (`on` / `off` / `trigger`)
//! - Before/after advice on named methods
//!
//! ## Quick Start
//!
//! ```
//! use weft_base::{obj, Class, ClassDef, Config, Func, Value};
//!
//! let widget = Class::base().extend(
//!     ClassDef::new("Widget")
//!         .attr("color", "#fff")
//!         .attr("size", obj! { "width": 100, "height": 100 }),
//! );
//!
//! let w = widget
//!     .create(Config::new().with("size", obj! { "width": 200 }))
//!     .unwrap();
//!
//! assert_eq!(w.get("color"), "#fff");
//! assert_eq!(w.get("size").field("width"), 200.0);
//! assert_eq!(w.get("size").field("height"), 100.0);
//!
//! w.on("change:color", Func::from_fn(|_, args| {
//!     assert_eq!(args[0], "#f00");
//!     Value::Undefined
//! }));
//! w.set("color", "#f00");
//! ```
//!
//! The engine is single-threaded: instances are reference counted with `Rc`
//! and every operation runs to completion before returning.

pub mod aspect;
pub mod attrs;
pub mod class;
pub mod config;
pub mod env;
pub mod error;
pub mod events;
pub mod func;
pub mod id;
pub mod instance;
mod naming;
pub mod value;

pub use attrs::{AttrSpec, SetOptions};
pub use class::{Class, ClassDef, Mixin};
pub use config::Config;
pub use env::{Cancellable, Dom, DomHandler, ElementSet, Offset, Scheduler, in_viewport};
pub use error::{BaseError, BaseResult};
pub use func::{ErrorCallback, Func, Getter, Initializer, Setter, Validator};
pub use id::{ClassId, InstanceId};
pub use instance::{Instance, Phase, WeakInstance};
pub use naming::{DeclaredHandler, HandlerKind};
pub use value::{ObjectMap, Value};

pub use weft_core::config::{FailurePolicy, Settings};
