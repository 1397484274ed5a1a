//! Object model for Keyloom.
//!
//! Provides the arena that hosts every widget instance:
//! - Unique, generational object identifiers via arena-based storage
//! - Parent-child relationships with cascade destruction
//! - Per-object class, name, and widget state (visible, sensitive, focusable)
//! - Non-owning [`WeakObject`] handles that read as empty once the object dies
//!
//! # Key Types
//!
//! - [`ObjectId`] - Unique stable identifier for each object
//! - [`ObjectRegistry`] - Arena managing all objects and the tree between them
//! - [`WidgetState`] - Per-object state used for effective visibility and sensitivity
//! - [`WeakObject`] - Observer handle that clears itself when the object is destroyed
//!
//! There is no global registry: hosts own an `ObjectRegistry` and thread it
//! through the code that needs it.

use slotmap::{new_key_type, SlotMap};

use crate::class::ClassId;
use crate::error::{ObjectError, ObjectResult};

new_key_type! {
    /// A unique identifier for an object in the registry.
    ///
    /// `ObjectId`s are stable handles that remain valid even as the object tree changes.
    /// They become invalid when the object is destroyed, and a destroyed id is never
    /// handed out again (slot reuse bumps the generation).
    pub struct ObjectId;
}

impl ObjectId {
    /// Convert the ObjectId to a raw u64 value.
    ///
    /// The raw value can be converted back using [`ObjectId::from_raw`].
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Create an ObjectId from a raw u64 value.
    ///
    /// Note: This does not check if the ObjectId exists in the registry.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Widget state stored in the registry for state propagation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WidgetState {
    /// Whether the widget is visible (its own state, not considering ancestors).
    pub visible: bool,
    /// Whether the widget accepts input (its own state, not considering ancestors).
    pub sensitive: bool,
    /// Whether the widget can hold keyboard focus.
    pub can_focus: bool,
}

impl Default for WidgetState {
    fn default() -> Self {
        Self {
            visible: true,
            sensitive: true,
            can_focus: false,
        }
    }
}

/// Internal data stored in the registry for each object.
struct ObjectData {
    /// Human-readable name for debugging and lookup.
    name: String,
    /// The class this object was instantiated from.
    class: ClassId,
    /// Parent object (if any).
    parent: Option<ObjectId>,
    /// Child objects (owned), in insertion order.
    children: Vec<ObjectId>,
    state: WidgetState,
}

/// The central registry that manages all objects and their relationships.
///
/// Uses arena-based storage via SlotMap for stable object IDs and efficient
/// parent-child relationship management.
pub struct ObjectRegistry {
    objects: SlotMap<ObjectId, ObjectData>,
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRegistry {
    /// Create a new empty object registry.
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
        }
    }

    /// Register a new root object of the given class and return its ID.
    pub fn create(&mut self, class: ClassId, name: impl Into<String>) -> ObjectId {
        let name = name.into();
        let data = ObjectData {
            name,
            class,
            parent: None,
            children: Vec::new(),
            state: WidgetState::default(),
        };
        let id = self.objects.insert(data);
        tracing::trace!(target: "keyloom_core::object", ?id, ?class, "registered object");
        id
    }

    /// Remove an object and all its descendants from the registry.
    ///
    /// Returns the ids of every destroyed object, descendants first and the
    /// object itself last, so callers can release observers in that order.
    #[tracing::instrument(skip(self), target = "keyloom_core::object", level = "trace")]
    pub fn destroy(&mut self, id: ObjectId) -> ObjectResult<Vec<ObjectId>> {
        let mut destroyed = self.collect_descendants(id)?;
        tracing::trace!(target: "keyloom_core::object", ?id, descendant_count = destroyed.len(), "destroying object tree");

        if let Some(parent_id) = self.objects.get(id).and_then(|d| d.parent)
            && let Some(parent_data) = self.objects.get_mut(parent_id)
        {
            parent_data.children.retain(|&child| child != id);
        }

        for &child_id in &destroyed {
            self.objects.remove(child_id);
        }
        self.objects.remove(id);
        destroyed.push(id);

        Ok(destroyed)
    }

    /// Collect all descendant IDs in depth-first order (children before parents).
    fn collect_descendants(&self, id: ObjectId) -> ObjectResult<Vec<ObjectId>> {
        let mut result = Vec::new();
        self.collect_descendants_recursive(id, &mut result)?;
        Ok(result)
    }

    fn collect_descendants_recursive(
        &self,
        id: ObjectId,
        result: &mut Vec<ObjectId>,
    ) -> ObjectResult<()> {
        let data = self.objects.get(id).ok_or(ObjectError::InvalidObjectId)?;
        for &child_id in &data.children {
            self.collect_descendants_recursive(child_id, result)?;
            result.push(child_id);
        }
        Ok(())
    }

    /// Check if an object exists in the registry.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the registry holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects without a parent, in arena order.
    pub fn root_objects(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|(_, d)| d.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Set the parent of an object.
    ///
    /// This handles removing from the old parent and appending to the new parent.
    /// Passing `None` makes the object a root object.
    pub fn set_parent(&mut self, id: ObjectId, new_parent: Option<ObjectId>) -> ObjectResult<()> {
        if !self.objects.contains_key(id) {
            return Err(ObjectError::InvalidObjectId);
        }

        if let Some(parent_id) = new_parent {
            if !self.objects.contains_key(parent_id) {
                return Err(ObjectError::InvalidObjectId);
            }
            if self.is_ancestor(id, parent_id) {
                return Err(ObjectError::CircularParentage);
            }
        }

        let old_parent = self.objects.get(id).and_then(|d| d.parent);
        if let Some(old_parent_id) = old_parent
            && let Some(parent_data) = self.objects.get_mut(old_parent_id)
        {
            parent_data.children.retain(|&child| child != id);
        }

        if let Some(data) = self.objects.get_mut(id) {
            data.parent = new_parent;
        }

        if let Some(parent_id) = new_parent
            && let Some(parent_data) = self.objects.get_mut(parent_id)
        {
            parent_data.children.push(id);
        }

        Ok(())
    }

    /// Check if `ancestor` is `id` itself or one of its ancestors.
    pub fn is_ancestor(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == ancestor {
                return true;
            }
            current = self.objects.get(current_id).and_then(|d| d.parent);
        }
        false
    }

    /// Ancestors of an object, nearest first. The object itself is not included.
    pub fn ancestors(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        let mut current = self.objects.get(id).and_then(|d| d.parent);
        while let Some(current_id) = current {
            result.push(current_id);
            current = self.objects.get(current_id).and_then(|d| d.parent);
        }
        result
    }

    /// The outermost ancestor of an object, or the object itself if it is a root.
    pub fn toplevel(&self, id: ObjectId) -> ObjectId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Get the parent of an object.
    pub fn parent(&self, id: ObjectId) -> ObjectResult<Option<ObjectId>> {
        self.objects
            .get(id)
            .map(|d| d.parent)
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Get the children of an object.
    pub fn children(&self, id: ObjectId) -> ObjectResult<&[ObjectId]> {
        self.objects
            .get(id)
            .map(|d| d.children.as_slice())
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Get the object's name.
    pub fn name(&self, id: ObjectId) -> ObjectResult<&str> {
        self.objects
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Set the object's name.
    pub fn set_name(&mut self, id: ObjectId, name: impl Into<String>) -> ObjectResult<()> {
        self.objects
            .get_mut(id)
            .map(|d| d.name = name.into())
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Get the class of an object.
    pub fn class_of(&self, id: ObjectId) -> ObjectResult<ClassId> {
        self.objects
            .get(id)
            .map(|d| d.class)
            .ok_or(ObjectError::InvalidObjectId)
    }

    // =========================================================================
    // Widget State (for state propagation)
    // =========================================================================

    /// Get the widget state for an object.
    pub fn state(&self, id: ObjectId) -> ObjectResult<WidgetState> {
        self.objects
            .get(id)
            .map(|d| d.state)
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Set the visible state for a widget.
    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> ObjectResult<()> {
        let data = self.objects.get_mut(id).ok_or(ObjectError::InvalidObjectId)?;
        data.state.visible = visible;
        Ok(())
    }

    /// Set the sensitive state for a widget.
    pub fn set_sensitive(&mut self, id: ObjectId, sensitive: bool) -> ObjectResult<()> {
        let data = self.objects.get_mut(id).ok_or(ObjectError::InvalidObjectId)?;
        data.state.sensitive = sensitive;
        Ok(())
    }

    /// Set whether a widget can hold keyboard focus.
    pub fn set_can_focus(&mut self, id: ObjectId, can_focus: bool) -> ObjectResult<()> {
        let data = self.objects.get_mut(id).ok_or(ObjectError::InvalidObjectId)?;
        data.state.can_focus = can_focus;
        Ok(())
    }

    /// Check if a widget is effectively visible (itself and all ancestors are visible).
    ///
    /// Destroyed objects are never visible.
    pub fn is_effectively_visible(&self, id: ObjectId) -> bool {
        self.all_along_chain(id, |s| s.visible)
    }

    /// Check if a widget is effectively sensitive (itself and all ancestors are sensitive).
    ///
    /// Destroyed objects are never sensitive.
    pub fn is_effectively_sensitive(&self, id: ObjectId) -> bool {
        self.all_along_chain(id, |s| s.sensitive)
    }

    fn all_along_chain(&self, id: ObjectId, pred: impl Fn(&WidgetState) -> bool) -> bool {
        let mut current = Some(id);
        let mut seen_self = false;
        while let Some(current_id) = current {
            let Some(data) = self.objects.get(current_id) else {
                return seen_self;
            };
            if !pred(&data.state) {
                return false;
            }
            seen_self = true;
            current = data.parent;
        }
        seen_self
    }
}

static_assertions::assert_impl_all!(ObjectRegistry: Send, Sync);

/// A non-owning handle to an object.
///
/// The handle observes the object's lifetime: once the object is destroyed,
/// [`get`](Self::get) yields `None` and the handle nulls itself. Because
/// object ids are generational, a dead handle can never alias a newer object
/// that reuses the same slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeakObject {
    target: Option<ObjectId>,
}

impl WeakObject {
    /// Create a handle observing `id`.
    pub fn new(id: ObjectId) -> Self {
        Self { target: Some(id) }
    }

    /// An empty handle.
    pub const fn empty() -> Self {
        Self { target: None }
    }

    /// Create a handle from an optional id.
    pub fn from_option(id: Option<ObjectId>) -> Self {
        Self { target: id }
    }

    /// Resolve the handle, clearing it if the observed object has died.
    pub fn get(&mut self, registry: &ObjectRegistry) -> Option<ObjectId> {
        match self.target {
            Some(id) if registry.contains(id) => Some(id),
            Some(_) => {
                self.target = None;
                None
            }
            None => None,
        }
    }

    /// Resolve the handle without mutating it.
    pub fn upgrade(&self, registry: &ObjectRegistry) -> Option<ObjectId> {
        self.target.filter(|&id| registry.contains(id))
    }

    /// Whether the handle still points at a live object.
    pub fn is_alive(&self, registry: &ObjectRegistry) -> bool {
        self.upgrade(registry).is_some()
    }

    /// Point the handle at a different object (or nothing).
    pub fn set(&mut self, id: Option<ObjectId>) {
        self.target = id;
    }

    /// Drop the observed object.
    pub fn clear(&mut self) {
        self.target = None;
    }

    /// Release the handle if it observes `destroyed`.
    ///
    /// Hosts call this from their destroy notification so that handles never
    /// outlive the object they watch. Returns `true` if the handle was cleared.
    pub fn release(&mut self, destroyed: ObjectId) -> bool {
        if self.target == Some(destroyed) {
            self.target = None;
            true
        } else {
            false
        }
    }

    /// The raw id this handle was last pointed at, alive or not.
    pub fn raw(&self) -> Option<ObjectId> {
        self.target
    }
}
