//! Keyloom - keyboard binding dispatch and paned focus navigation.
//!
//! Keys are mapped, per widget class, to named action-signal emissions with
//! typed arguments. Bindings come from code, from a small textual grammar,
//! or from a TOML configuration file, and are activated with class scoping
//! and priority ordering.
//!
//! - [`bindings`]: binding sets, the grammar, configuration, and activation
//! - [`widget`]: the widget host the engine dispatches into, and the
//!   [`Paned`](widget::Paned) keyboard navigator built on it
//!
//! # Example
//!
//! ```
//! use keyloom::bindings::keyval;
//! use keyloom::widget::{Orientation, Ui};
//!
//! let mut ui = Ui::new();
//! let window = ui.create_window("main");
//! let paned = ui.create_paned(window, Orientation::Horizontal, "split").unwrap();
//! let left = ui.create_widget(paned.id(), "left").unwrap();
//! ui.create_widget(paned.id(), "right").unwrap();
//! paned.allocate(&mut ui, 400);
//!
//! ui.grab_focus(left);
//! assert!(ui.dispatch_key(window, keyval::F8, 0));
//! assert!(ui.is_focus(paned.id()));
//!
//! ui.dispatch_key(window, keyval::END, 0);
//! assert_eq!(paned.position(&ui), paned.max_position(&ui));
//!
//! ui.dispatch_key(window, keyval::ESCAPE, 0);
//! assert_eq!(ui.focus_widget(window), Some(left));
//! ```

pub mod bindings;
pub mod widget;

pub use bindings::{BindingEngine, BindingPriority, KeySpec, KeyloomConfig, ModifierType};
pub use keyloom_core::{ObjectId, Value};
pub use widget::{Paned, Ui};
