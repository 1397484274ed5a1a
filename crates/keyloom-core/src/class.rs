//! Class registry: single-inheritance class hierarchy with signal tables.
//!
//! Every object in the [`ObjectRegistry`](crate::ObjectRegistry) is an
//! instance of a class. Classes form a tree rooted at the universal base
//! class `Object`; each class declares the signals it adds, and signal lookup
//! walks from the most-derived class towards the base.

use std::collections::HashMap;

use slotmap::{new_key_type, SlotMap};

use crate::error::{ClassError, ClassResult};
use crate::value::SignalSignature;

/// Name of the universal base class.
pub const OBJECT_CLASS: &str = "Object";

new_key_type! {
    /// Identifier of a registered class.
    pub struct ClassId;
}

struct ClassInfo {
    name: String,
    parent: Option<ClassId>,
    signals: Vec<SignalSignature>,
}

/// Table of every class known to a host.
pub struct ClassRegistry {
    classes: SlotMap<ClassId, ClassInfo>,
    by_name: HashMap<String, ClassId>,
    object: ClassId,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassRegistry {
    /// Create a registry containing only the universal base class.
    pub fn new() -> Self {
        let mut classes = SlotMap::with_key();
        let object = classes.insert(ClassInfo {
            name: OBJECT_CLASS.to_string(),
            parent: None,
            signals: Vec::new(),
        });
        let mut by_name = HashMap::new();
        by_name.insert(OBJECT_CLASS.to_string(), object);
        Self {
            classes,
            by_name,
            object,
        }
    }

    /// The universal base class.
    pub fn object_class(&self) -> ClassId {
        self.object
    }

    /// Register a class deriving from `parent`.
    pub fn register(&mut self, name: impl Into<String>, parent: ClassId) -> ClassResult<ClassId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(ClassError::DuplicateClass(name));
        }
        if !self.classes.contains_key(parent) {
            return Err(ClassError::UnknownClass(format!("{parent:?}")));
        }
        let id = self.classes.insert(ClassInfo {
            name: name.clone(),
            parent: Some(parent),
            signals: Vec::new(),
        });
        tracing::debug!(target: "keyloom_core::class", class = %name, "registered class");
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Look `name` up, registering it under `parent` if it does not exist yet.
    ///
    /// An unknown `parent` falls back to the universal base class.
    pub fn ensure(&mut self, name: &str, parent: ClassId) -> ClassId {
        if let Some(id) = self.find(name) {
            return id;
        }
        let parent = if self.classes.contains_key(parent) {
            parent
        } else {
            self.object
        };
        let id = self.classes.insert(ClassInfo {
            name: name.to_string(),
            parent: Some(parent),
            signals: Vec::new(),
        });
        tracing::debug!(target: "keyloom_core::class", class = %name, "registered class");
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Look a class up by name.
    pub fn find(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// The name of a class. Unknown ids yield an empty string.
    pub fn name(&self, class: ClassId) -> &str {
        self.classes.get(class).map(|c| c.name.as_str()).unwrap_or("")
    }

    /// The direct parent class.
    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.classes.get(class).and_then(|c| c.parent)
    }

    /// The chain of classes from `class` up to the universal base, most-derived first.
    pub fn class_chain(&self, class: ClassId) -> Vec<ClassId> {
        let mut chain = Vec::new();
        let mut current = Some(class).filter(|c| self.classes.contains_key(*c));
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
    }

    /// Whether `class` is `ancestor` or derives from it.
    pub fn is_a(&self, class: ClassId, ancestor: ClassId) -> bool {
        self.class_chain(class).contains(&ancestor)
    }

    /// Declare a signal on a class.
    ///
    /// Redeclaring a name the class already declares is an error; shadowing a
    /// signal of an ancestor class is allowed and the derived one wins on lookup.
    pub fn add_signal(&mut self, class: ClassId, signature: SignalSignature) -> ClassResult<()> {
        let info = self
            .classes
            .get_mut(class)
            .ok_or_else(|| ClassError::UnknownClass(format!("{class:?}")))?;
        if info.signals.iter().any(|s| s.name() == signature.name()) {
            return Err(ClassError::DuplicateSignal {
                class: info.name.clone(),
                signal: signature.name().to_string(),
            });
        }
        tracing::trace!(target: "keyloom_core::class", class = %info.name, signal = signature.name(), "declared signal");
        info.signals.push(signature);
        Ok(())
    }

    /// Signals declared directly on `class`.
    pub fn signals(&self, class: ClassId) -> &[SignalSignature] {
        self.classes
            .get(class)
            .map(|c| c.signals.as_slice())
            .unwrap_or(&[])
    }

    /// Find a signal by name on `class` or its ancestors.
    ///
    /// Returns the declaring class together with the signature.
    pub fn find_signal(&self, class: ClassId, name: &str) -> Option<(ClassId, &SignalSignature)> {
        let mut current = Some(class);
        while let Some(id) = current {
            let info = self.classes.get(id)?;
            if let Some(sig) = info.signals.iter().find(|s| s.name() == name) {
                return Some((id, sig));
            }
            current = info.parent;
        }
        None
    }
}

static_assertions::assert_impl_all!(ClassRegistry: Send, Sync);
