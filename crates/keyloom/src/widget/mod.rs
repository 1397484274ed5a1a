//! Widget host and the paned focus navigator.
//!
//! This module provides what the binding engine dispatches into:
//!
//! - [`Ui`]: object tree, classes with action handlers, per-window focus, and
//!   key routing from the focus widget up through its ancestors
//! - [`FocusDirection`] and the tab chain on [`Ui`]
//! - [`Paned`]: a two-child container whose handle takes keyboard focus and
//!   is driven by bindings installed on the paned class
//! - [`ScrollType`]: the enum argument of `move-handle`
//!
//! # Overview
//!
//! Every [`Ui`] registers the `Widget`, `Container`, `Window`, and `Paned`
//! classes at construction and installs the paned action signals and their
//! default key bindings into its [`BindingEngine`](crate::bindings::BindingEngine).
//! Applications attach their own sets (or load them from configuration) to
//! override or extend those defaults.
//!
//! ```ignore
//! use keyloom::widget::{Orientation, Ui};
//!
//! let mut ui = Ui::new();
//! let window = ui.create_window("main");
//! let paned = ui.create_paned(window, Orientation::Vertical, "split")?;
//! let top = ui.create_widget(paned.id(), "top")?;
//! let bottom = ui.create_widget(paned.id(), "bottom")?;
//! paned.allocate(&mut ui, 600);
//! ```

mod focus;
mod paned;
pub mod paned_layout;
mod scroll;
mod ui;

pub use focus::{FocusDirection, FocusManager};
pub use paned::{
    ACCEPT_POSITION, CANCEL_POSITION, CYCLE_CHILD_FOCUS, CYCLE_HANDLE_FOCUS, MOVE_HANDLE,
    NavigationState, Orientation, Pane, Paned, PanedState, TOGGLE_HANDLE_FOCUS,
};
pub use scroll::{SCROLL_TYPE, ScrollStep, ScrollType};
pub use ui::{
    ActionHandler, BuiltinClasses, CONTAINER_CLASS, PANED_CLASS, TextDirection, Ui, WIDGET_CLASS,
    WINDOW_CLASS,
};
