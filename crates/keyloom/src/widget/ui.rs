//! The widget host.
//!
//! [`Ui`] owns the object tree, the class table, the action handlers of every
//! class, per-window focus, and the binding engine. It is the
//! [`SignalHost`] the engine emits into, and it routes key events from the
//! focus widget up through its ancestors.

use std::collections::HashMap;
use std::sync::Arc;

use keyloom_core::{
    ClassId, ClassRegistry, ClassResult, ObjectError, ObjectId, ObjectRegistry, ObjectResult,
    ObjectTreeDebug, ParamType, Signal, SignalSignature, Value,
};
use slotmap::SecondaryMap;

use super::focus::{FocusDirection, FocusManager};
use super::paned::{Orientation, Paned, PanedState};
use crate::bindings::{
    BindingEngine, ConfigError, DispatchError, KeySpec, KeyloomConfig, PanedConfig, SignalHost,
};

pub const WIDGET_CLASS: &str = "Widget";
pub const CONTAINER_CLASS: &str = "Container";
pub const WINDOW_CLASS: &str = "Window";
pub const PANED_CLASS: &str = "Paned";

/// Reading direction of the user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// The handler run when an action signal is emitted on an instance of a class.
///
/// Handlers receive the host mutably so they can move focus, resize
/// dividers, or emit further signals.
pub type ActionHandler = Arc<dyn Fn(&mut Ui, ObjectId, &[Value]) -> bool + Send + Sync>;

/// Classes every [`Ui`] registers at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinClasses {
    pub widget: ClassId,
    pub container: ClassId,
    pub window: ClassId,
    pub paned: ClassId,
}

/// Widget host: object tree, classes, handlers, focus, and key routing.
pub struct Ui {
    objects: ObjectRegistry,
    classes: ClassRegistry,
    builtin: BuiltinClasses,
    handlers: HashMap<ClassId, HashMap<String, ActionHandler>>,
    pub(crate) focus: FocusManager,
    text_direction: TextDirection,
    bindings: BindingEngine,
    pub(crate) paned: SecondaryMap<ObjectId, PanedState>,
    paned_config: PanedConfig,
    destroyed: Signal<ObjectId>,
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Ui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ui")
            .field("objects", &self.objects.len())
            .field("builtin", &self.builtin)
            .field("focus", &self.focus)
            .field("text_direction", &self.text_direction)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl Ui {
    /// Create a host with a fresh binding engine and the built-in classes.
    pub fn new() -> Self {
        Self::with_engine(BindingEngine::new())
    }

    /// Create a host that installs its class bindings into `engine`.
    pub fn with_engine(bindings: BindingEngine) -> Self {
        let mut classes = ClassRegistry::new();
        let widget = classes.ensure(WIDGET_CLASS, classes.object_class());
        let container = classes.ensure(CONTAINER_CLASS, widget);
        let window = classes.ensure(WINDOW_CLASS, container);
        let paned = classes.ensure(PANED_CLASS, container);

        let mut ui = Self {
            objects: ObjectRegistry::new(),
            classes,
            builtin: BuiltinClasses {
                widget,
                container,
                window,
                paned,
            },
            handlers: HashMap::new(),
            focus: FocusManager::new(),
            text_direction: TextDirection::default(),
            bindings,
            paned: SecondaryMap::new(),
            paned_config: PanedConfig::default(),
            destroyed: Signal::new(),
        };
        if let Err(err) = super::paned::install_class(&mut ui) {
            tracing::error!(target: "keyloom::paned", %err, "failed to install paned class");
        }
        ui
    }

    /// Create a host and apply `config` to it.
    ///
    /// Configuration problems are logged; use
    /// [`apply_config`](Self::apply_config) to inspect them.
    pub fn with_config(config: &KeyloomConfig) -> Self {
        let mut ui = Self::new();
        let errors = ui.apply_config(config);
        if !errors.is_empty() {
            tracing::warn!(target: "keyloom::bindings::config", count = errors.len(), "binding config applied with errors");
        }
        ui
    }

    /// Store the `[paned]` tuning and apply every `[[set]]` to the engine.
    pub fn apply_config(&mut self, config: &KeyloomConfig) -> Vec<ConfigError> {
        self.paned_config = config.paned;
        let (_, errors) = self.bindings.apply_config(config, &self.classes);
        errors
    }

    pub fn bindings(&self) -> &BindingEngine {
        &self.bindings
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub(crate) fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn builtin_classes(&self) -> BuiltinClasses {
        self.builtin
    }

    pub fn paned_config(&self) -> PanedConfig {
        self.paned_config
    }

    pub fn set_paned_config(&mut self, config: PanedConfig) {
        self.paned_config = config;
    }

    pub fn text_direction(&self) -> TextDirection {
        self.text_direction
    }

    pub fn set_text_direction(&mut self, direction: TextDirection) {
        self.text_direction = direction;
    }

    /// Emitted once for every destroyed object, descendants first.
    pub fn destroyed(&self) -> &Signal<ObjectId> {
        &self.destroyed
    }

    /// Render the object tree for debugging.
    pub fn format_tree(&self) -> String {
        ObjectTreeDebug::new(&self.objects, &self.classes).format_all()
    }

    // =========================================================================
    // Classes and Actions
    // =========================================================================

    /// Register a widget class deriving from `parent`.
    pub fn register_class(&mut self, name: &str, parent: ClassId) -> ClassResult<ClassId> {
        self.classes.register(name, parent)
    }

    /// Declare an action signal on `class` and install its handler.
    pub fn add_action<F>(
        &mut self,
        class: ClassId,
        signature: SignalSignature,
        handler: F,
    ) -> ClassResult<()>
    where
        F: Fn(&mut Ui, ObjectId, &[Value]) -> bool + Send + Sync + 'static,
    {
        let name = signature.name().to_string();
        self.classes.add_signal(class, signature)?;
        self.set_handler(class, &name, handler);
        Ok(())
    }

    /// Install or replace the handler of `name` on `class`.
    ///
    /// The signal may be declared on an ancestor; the handler of the most
    /// derived class wins.
    pub fn set_handler<F>(&mut self, class: ClassId, name: &str, handler: F)
    where
        F: Fn(&mut Ui, ObjectId, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.handlers
            .entry(class)
            .or_default()
            .insert(name.to_string(), Arc::new(handler));
    }

    fn find_handler(&self, target: ObjectId, name: &str) -> Option<ActionHandler> {
        let class = self.objects.class_of(target).ok()?;
        self.classes
            .class_chain(class)
            .into_iter()
            .find_map(|c| self.handlers.get(&c).and_then(|h| h.get(name)).cloned())
    }

    /// Emit a signal with already-typed arguments, bypassing key bindings.
    ///
    /// Unlike binding emission, non-action signals may be emitted here.
    pub fn emit_by_name(
        &mut self,
        target: ObjectId,
        name: &str,
        args: &[Value],
    ) -> Result<bool, DispatchError> {
        let signature = self
            .find_signal(target, name)
            .ok_or_else(|| DispatchError::UnknownSignal(name.to_string()))?;
        if signature.arity() != args.len() {
            return Err(DispatchError::ArgumentArity {
                signal: name.to_string(),
                expected: signature.arity(),
                got: args.len(),
            });
        }
        for (index, (value, &ty)) in args.iter().zip(signature.params()).enumerate() {
            if value.param_type() != ty {
                return Err(DispatchError::ArgumentType {
                    signal: name.to_string(),
                    index,
                    expected: ty,
                    got: type_label(value.param_type()),
                });
            }
        }
        Ok(self.emit_signal(target, name, args))
    }

    // =========================================================================
    // Object Tree
    // =========================================================================

    /// Create a top-level window.
    pub fn create_window(&mut self, name: &str) -> ObjectId {
        self.objects.create(self.builtin.window, name)
    }

    /// Create a focusable leaf widget inside `parent`.
    pub fn create_widget(&mut self, parent: ObjectId, name: &str) -> ObjectResult<ObjectId> {
        let id = self.create(self.builtin.widget, Some(parent), name)?;
        self.objects.set_can_focus(id, true)?;
        Ok(id)
    }

    /// Create a plain, non-focusable container inside `parent`.
    pub fn create_container(&mut self, parent: ObjectId, name: &str) -> ObjectResult<ObjectId> {
        self.create(self.builtin.container, Some(parent), name)
    }

    /// Create a paned container inside `parent`.
    pub fn create_paned(
        &mut self,
        parent: ObjectId,
        orientation: Orientation,
        name: &str,
    ) -> ObjectResult<Paned> {
        let id = self.create(self.builtin.paned, Some(parent), name)?;
        if let Some(state) = self.paned.get_mut(id) {
            state.set_orientation(orientation);
        }
        Ok(Paned::from_raw(id))
    }

    /// Create an instance of any class, optionally inside `parent`.
    ///
    /// Instances of the paned class get paned state and a focusable handle.
    pub fn create(
        &mut self,
        class: ClassId,
        parent: Option<ObjectId>,
        name: &str,
    ) -> ObjectResult<ObjectId> {
        if let Some(parent) = parent
            && !self.objects.contains(parent)
        {
            return Err(ObjectError::InvalidObjectId);
        }
        let id = self.objects.create(class, name);
        if self.classes.is_a(class, self.builtin.paned) {
            self.paned.insert(id, PanedState::new(Orientation::default()));
            self.objects.set_can_focus(id, true)?;
        }
        if let Some(parent) = parent {
            self.add_child(parent, id)?;
        }
        Ok(id)
    }

    /// Put `child` inside `parent`.
    ///
    /// A paned parent takes the child into its first free pane with the
    /// default packing; a full paned leaves the child where it was.
    pub fn add_child(&mut self, parent: ObjectId, child: ObjectId) -> ObjectResult<()> {
        if let Some(paned) = Paned::from_id(self, parent) {
            let packed = match (paned.child1(self), paned.child2(self)) {
                (None, _) => paned.add1(self, child)?,
                (Some(_), None) => paned.add2(self, child)?,
                (Some(_), Some(_)) => false,
            };
            if !packed {
                tracing::warn!(target: "keyloom::paned", ?parent, ?child, "paned already has two children");
            }
            return Ok(());
        }
        self.objects.set_parent(child, Some(parent))
    }

    /// Destroy an object and its descendants.
    ///
    /// Weak references held by paned state are released, slots of destroyed
    /// children are cleared, focus on destroyed widgets is dropped, and
    /// [`destroyed`](Self::destroyed) fires for each object.
    #[tracing::instrument(skip(self), target = "keyloom_core::object", level = "trace")]
    pub fn destroy(&mut self, id: ObjectId) -> ObjectResult<()> {
        let destroyed = self.objects.destroy(id)?;
        for &dead in &destroyed {
            self.paned.remove(dead);
        }
        for (_, state) in self.paned.iter_mut() {
            for &dead in &destroyed {
                state.release(dead);
            }
        }
        self.focus.release(&destroyed);
        for dead in destroyed {
            self.destroyed.emit(dead);
        }
        Ok(())
    }

    pub fn set_visible(&mut self, id: ObjectId, visible: bool) -> ObjectResult<()> {
        self.objects.set_visible(id, visible)
    }

    pub fn set_sensitive(&mut self, id: ObjectId, sensitive: bool) -> ObjectResult<()> {
        self.objects.set_sensitive(id, sensitive)
    }

    pub fn set_can_focus(&mut self, id: ObjectId, can_focus: bool) -> ObjectResult<()> {
        self.objects.set_can_focus(id, can_focus)
    }

    /// Whether `id` is an instance of `class` or a subclass.
    pub fn is_a(&self, id: ObjectId, class: ClassId) -> bool {
        self.objects
            .class_of(id)
            .is_ok_and(|c| self.classes.is_a(c, class))
    }

    /// The window `id` lives in, if its toplevel is a window.
    pub fn window_of(&self, id: ObjectId) -> Option<ObjectId> {
        if !self.objects.contains(id) {
            return None;
        }
        let top = self.objects.toplevel(id);
        self.is_a(top, self.builtin.window).then_some(top)
    }

    // =========================================================================
    // Key Routing
    // =========================================================================

    /// Route a raw key event to `window`.
    pub fn dispatch_key(&mut self, window: ObjectId, keyval: u32, raw_modifiers: u32) -> bool {
        self.dispatch_key_event(window, &KeySpec::from_raw(keyval, raw_modifiers))
    }

    /// Route a key to `window`.
    ///
    /// Bindings are activated on the focus widget (or the window itself when
    /// nothing has focus), then on each ancestor in turn until one consumes
    /// the key. An unconsumed Tab moves focus along the tab chain.
    ///
    /// Returns whether the key was consumed.
    #[tracing::instrument(skip(self), target = "keyloom::focus", level = "trace", fields(key = %key))]
    pub fn dispatch_key_event(&mut self, window: ObjectId, key: &KeySpec) -> bool {
        let engine = self.bindings.clone();
        let mut current = Some(self.focus_widget(window).unwrap_or(window));
        while let Some(widget) = current {
            if !self.objects.contains(widget) {
                break;
            }
            if engine.activate_event(self, widget, key) {
                return true;
            }
            current = self.objects.parent(widget).ok().flatten();
        }

        if !key.is_release()
            && let Some(direction) = FocusDirection::from_tab_key(key)
        {
            return self.move_focus(window, direction);
        }
        false
    }
}

impl SignalHost for Ui {
    fn class_chain(&self, target: ObjectId) -> Vec<ClassId> {
        self.objects
            .class_of(target)
            .map(|c| self.classes.class_chain(c))
            .unwrap_or_default()
    }

    fn find_signal(&self, target: ObjectId, name: &str) -> Option<&SignalSignature> {
        let class = self.objects.class_of(target).ok()?;
        self.classes.find_signal(class, name).map(|(_, sig)| sig)
    }

    fn emit_signal(&mut self, target: ObjectId, name: &str, args: &[Value]) -> bool {
        let Some(handler) = self.find_handler(target, name) else {
            tracing::trace!(target: "keyloom::bindings", ?target, signal = name, "no handler installed");
            return false;
        };
        handler(self, target, args)
    }
}

fn type_label(ty: ParamType) -> &'static str {
    match ty {
        ParamType::Bool => "bool",
        ParamType::Int => "int",
        ParamType::UInt => "uint",
        ParamType::Int64 => "int64",
        ParamType::Float => "float",
        ParamType::Double => "double",
        ParamType::String => "string",
        ParamType::Enum(_) => "enum",
    }
}

static_assertions::assert_impl_all!(Ui: Send, Sync);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::bindings::{keyval, BindingPriority, ModifierType, SignalSpec};

    fn setup() -> (Ui, ObjectId, ObjectId, ObjectId) {
        let mut ui = Ui::new();
        let window = ui.create_window("main");
        let box_ = ui.create_container(window, "box").unwrap();
        let entry = ui.create_widget(box_, "entry").unwrap();
        (ui, window, box_, entry)
    }

    #[test]
    fn test_builtin_class_chain() {
        let ui = Ui::new();
        let classes = ui.builtin_classes();
        assert!(ui.classes().is_a(classes.window, classes.container));
        assert!(ui.classes().is_a(classes.paned, classes.widget));
        assert!(ui.classes().find_signal(classes.paned, "move-handle").is_some());
    }

    #[test]
    fn test_key_bubbles_to_ancestor() {
        let (mut ui, window, _, entry) = setup();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();
        let container = ui.builtin_classes().container;
        ui.add_action(container, SignalSignature::action("activate-default"), move |_, _, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            true
        })
        .unwrap();
        let set = ui.bindings().new_set("box-keys", BindingPriority::Application);
        ui.bindings().attach(container, set);
        ui.bindings().add_signal(
            set,
            KeySpec::new(keyval::RETURN, ModifierType::empty()),
            SignalSpec::new("activate-default", vec![]),
        );

        assert!(ui.grab_focus(entry));
        assert!(ui.dispatch_key(window, keyval::RETURN, 0));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(ui.focus_widget(window), Some(entry));
    }

    #[test]
    fn test_unbound_key_not_consumed() {
        let (mut ui, window, _, entry) = setup();
        ui.grab_focus(entry);
        assert!(!ui.dispatch_key(window, keyval::F1, 0));
    }

    #[test]
    fn test_emit_by_name_checks_types() {
        let (mut ui, _, _, entry) = setup();
        let widget = ui.builtin_classes().widget;
        ui.add_action(
            widget,
            SignalSignature::action("scroll-by").param(ParamType::Int).returns_bool(),
            |_, _, args| args.first() == Some(&Value::Int(3)),
        )
        .unwrap();

        assert_eq!(ui.emit_by_name(entry, "scroll-by", &[Value::Int(3)]), Ok(true));
        assert_eq!(ui.emit_by_name(entry, "scroll-by", &[Value::Int(4)]), Ok(false));
        assert!(matches!(
            ui.emit_by_name(entry, "scroll-by", &[Value::Bool(true)]),
            Err(DispatchError::ArgumentType { index: 0, .. })
        ));
        assert!(matches!(
            ui.emit_by_name(entry, "nope", &[]),
            Err(DispatchError::UnknownSignal(_))
        ));
    }

    #[test]
    fn test_derived_handler_wins() {
        let (mut ui, _, _, entry) = setup();
        let classes = ui.builtin_classes();
        let button = ui.register_class("Button", classes.widget).unwrap();
        ui.add_action(classes.widget, SignalSignature::action("poke").returns_bool(), |_, _, _| false)
            .unwrap();
        ui.set_handler(button, "poke", |_, _, _| true);
        let window = ui.window_of(entry).unwrap();
        let ok = ui.create(button, Some(window), "ok").unwrap();

        assert_eq!(ui.emit_by_name(entry, "poke", &[]), Ok(false));
        assert_eq!(ui.emit_by_name(ok, "poke", &[]), Ok(true));
    }

    #[test]
    fn test_destroy_notifies_and_drops_focus() {
        let (mut ui, window, box_, entry) = setup();
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        ui.destroyed().connect(move |id| seen_clone.lock().push(*id));
        ui.grab_focus(entry);

        ui.destroy(box_).unwrap();
        assert_eq!(*seen.lock(), vec![entry, box_]);
        assert_eq!(ui.focus_widget(window), None);
        assert!(ui.destroy(box_).is_err());
    }

    #[test]
    fn test_format_tree_lists_classes() {
        let (ui, _, _, _) = setup();
        let tree = ui.format_tree();
        assert!(tree.contains("main"));
        assert!(tree.contains("entry"));
    }
}
