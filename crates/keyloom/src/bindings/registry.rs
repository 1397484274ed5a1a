//! The binding set registry.
//!
//! Maps unique set names to [`BindingSet`]s and classes to the ordered list
//! of sets attached to them. One registry lives inside each
//! [`BindingEngine`](super::BindingEngine); there is no process-wide
//! singleton.

use std::collections::HashMap;

use keyloom_core::ClassId;
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use super::entry::{BindingPriority, BindingSet, EntryId};

new_key_type! {
    /// Identifier of a registered binding set.
    pub struct BindingSetId;
}

/// Errors raised by registry mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two binding sets were registered under one name.
    #[error("a binding set named '{0}' already exists")]
    NameCollision(String),
    /// The set id does not refer to a registered set.
    #[error("unknown binding set")]
    UnknownSet,
}

struct SetSlot {
    set: BindingSet,
    /// Unregistered, kept only until its doomed entries finish emitting.
    retired: bool,
}

/// Named binding sets and their class attachments.
#[derive(Default)]
pub struct BindingRegistry {
    sets: SlotMap<BindingSetId, SetSlot>,
    by_name: HashMap<String, BindingSetId>,
    attached: HashMap<ClassId, Vec<BindingSetId>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, empty binding set.
    pub fn try_new_set(
        &mut self,
        name: impl Into<String>,
        priority: BindingPriority,
    ) -> Result<BindingSetId, RegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::NameCollision(name));
        }
        let id = self.sets.insert(SetSlot {
            set: BindingSet::new(name.clone(), priority),
            retired: false,
        });
        tracing::debug!(target: "keyloom::bindings", set = %name, %priority, "registered binding set");
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Register a new, empty binding set.
    ///
    /// # Panics
    ///
    /// Panics if a set with the same name exists. Set names are chosen by the
    /// caller, so a collision is a programming error; use
    /// [`try_new_set`](Self::try_new_set) to handle it instead.
    #[track_caller]
    pub fn new_set(&mut self, name: impl Into<String>, priority: BindingPriority) -> BindingSetId {
        match self.try_new_set(name, priority) {
            Ok(id) => id,
            Err(err) => {
                tracing::error!(target: "keyloom::bindings", error = %err, "binding set name collision");
                panic!("{err}");
            }
        }
    }

    /// Find a set by name.
    pub fn find(&self, name: &str) -> Option<BindingSetId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: BindingSetId) -> Option<&BindingSet> {
        self.sets.get(id).map(|s| &s.set)
    }

    pub fn get_mut(&mut self, id: BindingSetId) -> Option<&mut BindingSet> {
        self.sets.get_mut(id).map(|s| &mut s.set)
    }

    /// Names of all registered sets.
    pub fn set_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_name.keys().map(String::as_str)
    }

    /// Attach a set to a class. Attaching twice has no further effect.
    pub fn attach(&mut self, class: ClassId, set: BindingSetId) -> Result<(), RegistryError> {
        match self.sets.get(set) {
            Some(slot) if !slot.retired => {}
            _ => return Err(RegistryError::UnknownSet),
        }
        let list = self.attached.entry(class).or_default();
        if !list.contains(&set) {
            list.push(set);
        }
        Ok(())
    }

    /// Sets attached directly to `class`, in attach order.
    pub fn attached(&self, class: ClassId) -> &[BindingSetId] {
        self.attached.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The set named after a class, created with toolkit priority and
    /// attached to the class on first use.
    pub fn set_for_class(&mut self, class: ClassId, class_name: &str) -> BindingSetId {
        if let Some(id) = self.find(class_name) {
            return id;
        }
        // The name is free, so registration cannot collide.
        let id = self.new_set(class_name, BindingPriority::Toolkit);
        let list = self.attached.entry(class).or_default();
        list.push(id);
        id
    }

    /// Sets attached to each class of a chain, most-derived class first.
    ///
    /// A set attached to several classes of the chain appears once, at its
    /// most-derived position.
    pub fn by_class(&self, chain: &[ClassId]) -> Vec<BindingSetId> {
        let mut result: Vec<BindingSetId> = Vec::new();
        for class in chain {
            for &set in self.attached(*class) {
                if !result.contains(&set) {
                    result.push(set);
                }
            }
        }
        result
    }

    /// Remove a set from the registry.
    ///
    /// Its name becomes free and it is detached from every class. Entries
    /// being emitted are doomed and the set's storage is released once they
    /// finish.
    pub fn unregister(&mut self, id: BindingSetId) -> Result<(), RegistryError> {
        let slot = match self.sets.get_mut(id) {
            Some(slot) if !slot.retired => slot,
            _ => return Err(RegistryError::UnknownSet),
        };
        slot.retired = true;
        slot.set.clear();
        let name = slot.set.name().to_string();
        let drained = slot.set.allocated_entries() == 0;

        self.by_name.remove(&name);
        for list in self.attached.values_mut() {
            list.retain(|&s| s != id);
        }
        if drained {
            self.sets.remove(id);
        }
        tracing::debug!(target: "keyloom::bindings", set = %name, deferred = !drained, "unregistered binding set");
        Ok(())
    }

    /// Finish an emission of `entry` in `set`, releasing a retired set once
    /// its last entry is gone.
    pub(crate) fn end_emission(&mut self, set: BindingSetId, entry: EntryId) {
        let Some(slot) = self.sets.get_mut(set) else {
            return;
        };
        slot.set.end_emission(entry);
        if slot.retired && slot.set.allocated_entries() == 0 {
            self.sets.remove(set);
        }
    }

    /// Number of sets held, including retired ones awaiting release.
    pub fn allocated_sets(&self) -> usize {
        self.sets.len()
    }
}

static_assertions::assert_impl_all!(BindingRegistry: Send, Sync);
