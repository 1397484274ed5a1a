//! The shared binding engine handle.

use std::sync::Arc;

use keyloom_core::{ClassId, ClassRegistry};
use parking_lot::Mutex;

use super::arg::SignalSpec;
use super::entry::{BindingPriority, BindingSet};
use super::grammar::{self, Expected, ParseError, Statement};
use super::keys::KeySpec;
use super::registry::{BindingRegistry, BindingSetId};

/// A cloneable handle to one binding registry.
///
/// Widgets hold clones of the handle created by their host. The registry
/// lock is only taken for short bookkeeping sections and is never held while
/// a signal handler runs, so handlers may freely call back into the engine.
#[derive(Clone, Default)]
pub struct BindingEngine {
    registry: Arc<Mutex<BindingRegistry>>,
}

impl std::fmt::Debug for BindingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindingEngine")
            .field("sets", &self.registry.lock().allocated_sets())
            .finish()
    }
}

impl BindingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the registry.
    ///
    /// `f` must not call back into this engine.
    pub fn with<R>(&self, f: impl FnOnce(&mut BindingRegistry) -> R) -> R {
        f(&mut self.registry.lock())
    }

    /// Run `f` on one binding set; `None` if the set is not registered.
    pub fn with_set<R>(&self, set: BindingSetId, f: impl FnOnce(&mut BindingSet) -> R) -> Option<R> {
        self.registry.lock().get_mut(set).map(f)
    }

    /// Register a new set. Panics on a name collision.
    #[track_caller]
    pub fn new_set(&self, name: &str, priority: BindingPriority) -> BindingSetId {
        self.registry.lock().new_set(name, priority)
    }

    pub fn find(&self, name: &str) -> Option<BindingSetId> {
        self.registry.lock().find(name)
    }

    /// The default set of a class, creating and attaching it on first use.
    pub fn set_for_class(&self, classes: &ClassRegistry, class: ClassId) -> BindingSetId {
        self.registry.lock().set_for_class(class, classes.name(class))
    }

    /// Attach `set` to `class`; returns `false` for an unknown set.
    pub fn attach(&self, class: ClassId, set: BindingSetId) -> bool {
        self.registry.lock().attach(class, set).is_ok()
    }

    /// Append a signal to the entry for `key` in `set`.
    pub fn add_signal(&self, set: BindingSetId, key: KeySpec, signal: impl Into<SignalSpec>) {
        self.with_set(set, |s| s.add_signal(key, signal));
    }

    /// Parse a `name (args)` description and append it to the entry for `key`.
    ///
    /// Returns [`Expected::None`] on success, otherwise the token the parser
    /// wanted; nothing is added on failure.
    pub fn add_signal_from_string(&self, set: BindingSetId, key: KeySpec, text: &str) -> Expected {
        match grammar::parse_signal(text) {
            Ok(spec) => {
                self.add_signal(set, key, spec);
                Expected::None
            }
            Err(err) => {
                tracing::warn!(target: "keyloom::bindings::grammar", text, expected = %err.expected, offset = err.offset, "rejected binding signal");
                err.expected
            }
        }
    }

    /// Install a skip marker for `key` in `set`.
    pub fn mark_unbound(&self, set: BindingSetId, key: KeySpec) {
        self.with_set(set, |s| s.mark_unbound(key));
    }

    /// Remove the entry for `key` from `set`.
    pub fn remove(&self, set: BindingSetId, key: &KeySpec) -> bool {
        self.with_set(set, |s| s.remove(key)).unwrap_or(false)
    }

    /// Parse a statement source and apply it to `set`.
    ///
    /// `bind` replaces the entry for its key and `unbind` installs a skip
    /// marker. Malformed statements are skipped and returned.
    pub fn load_source(&self, set: BindingSetId, source: &str) -> Vec<ParseError> {
        let (statements, errors) = grammar::parse_statements(source);
        self.with_set(set, |s| {
            for statement in statements {
                apply_statement(s, statement);
            }
        });
        errors
    }
}

pub(crate) fn apply_statement(set: &mut BindingSet, statement: Statement) {
    match statement {
        Statement::Bind { key, signals } => {
            set.reset(key);
            for signal in signals {
                set.add_signal(key, signal);
            }
        }
        Statement::Unbind { key } => set.mark_unbound(key),
    }
}

static_assertions::assert_impl_all!(BindingEngine: Send, Sync, Clone);
