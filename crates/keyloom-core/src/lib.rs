//! Core object model for Keyloom.
//!
//! This crate provides the host capabilities the binding engine in the
//! `keyloom` crate relies on:
//!
//! - **Object Model**: Arena of objects with parent/children, cascade destruction,
//!   and widget state (visible, sensitive, focusable)
//! - **Weak Handles**: [`WeakObject`] observers that read as empty once their target dies
//! - **Class Registry**: Single-inheritance classes, each declaring typed action signals
//! - **Typed Values**: [`Value`], [`ParamType`], and static [`EnumType`] descriptions
//! - **Signals**: [`Signal<Args>`] for observer-style notifications
//! - **Logging**: tracing targets and an object tree visualizer
//!
//! # Example
//!
//! ```
//! use keyloom_core::{ClassRegistry, ObjectRegistry, ParamType, SignalSignature};
//!
//! let mut classes = ClassRegistry::new();
//! let widget = classes.register("Widget", classes.object_class()).unwrap();
//! classes
//!     .add_signal(widget, SignalSignature::action("activate").param(ParamType::Bool))
//!     .unwrap();
//!
//! let mut objects = ObjectRegistry::new();
//! let button = objects.create(widget, "ok-button");
//! let class = objects.class_of(button).unwrap();
//! assert!(classes.find_signal(class, "activate").is_some());
//! ```

mod class;
mod error;
pub mod logging;
mod object;
mod signal;
mod value;

pub use class::{ClassId, ClassRegistry, OBJECT_CLASS};
pub use error::{ClassError, ClassResult, ObjectError, ObjectResult};
pub use logging::{ObjectTreeDebug, TreeFormatOptions, TreeStyle};
pub use object::{ObjectId, ObjectRegistry, WeakObject, WidgetState};
pub use signal::{ConnectionId, Signal};
pub use value::{EnumType, EnumValue, ParamType, ReturnType, SignalSignature, Value};
