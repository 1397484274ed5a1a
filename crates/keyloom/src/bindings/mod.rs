//! Keyboard binding engine.
//!
//! Maps keys, scoped by the target's class hierarchy, to named action-signal
//! emissions with typed arguments.
//!
//! # Key Types
//!
//! - [`KeySpec`] - Canonical (keyval, modifiers) key
//! - [`Arg`] / [`SignalSpec`] - A stored signal emission and its arguments
//! - [`BindingSet`] - Named, prioritized collection of entries
//! - [`BindingRegistry`] - Named sets and class attachments
//! - [`BindingEngine`] - Shared handle that activates keys on a [`SignalHost`]
//!
//! # Example
//!
//! ```ignore
//! let engine = BindingEngine::new();
//! let set = engine.new_set("my-app", BindingPriority::Application);
//! engine.attach(paned_class, set);
//! engine.add_signal_from_string(set, KeySpec::parse_accelerator("<Control>F6").unwrap(),
//!     "cycle-child-focus (false)");
//!
//! // Later, from the key event handler:
//! let consumed = engine.activate(&mut host, focus_widget, keyval, state);
//! ```

mod activate;
mod arg;
mod config;
mod dispatch;
mod engine;
mod entry;
pub mod grammar;
pub mod keys;
mod registry;

pub use arg::{Arg, EnumArg, SignalBuilder, SignalSpec};
pub use config::{BindingSetConfig, ConfigError, KeyloomConfig, PanedConfig};
pub use dispatch::{emit, DispatchError, SignalHost};
pub use engine::BindingEngine;
pub use entry::{BindingEntry, BindingPriority, BindingSet, Emission, EntryId, EntryState};
pub use grammar::{Expected, ParseError, Statement};
pub use keys::{keyval, KeySpec, ModifierType};
pub use registry::{BindingRegistry, BindingSetId, RegistryError};
