//! Paned container and its keyboard navigator.
//!
//! A paned holds two children separated by a divider (the handle). The
//! handle can take keyboard focus; while it has it, bindings installed on
//! the paned class move the divider, commit or revert the move, and cycle
//! the handle focus across every paned in the window.
//!
//! # Key Bindings
//!
//! | Keys | Action |
//! |---|---|
//! | F6, Shift+F6 | `cycle-child-focus (false/true)` |
//! | F8, Shift+F8 | `cycle-handle-focus (false/true)` |
//! | Tab, Shift+Tab (keypad, optionally with Control) | `toggle-handle-focus` |
//! | Arrows, Control+Arrows | `move-handle` by a step / a page |
//! | Page_Up, Page_Down, Home, End | `move-handle` by a page / to an end |
//! | Return, Enter, space | `accept-position` |
//! | Escape | `cancel-position` |
//!
//! # Navigation States
//!
//! - [`NavigationState::Idle`]: the handle does not have focus.
//! - [`NavigationState::HandleFocused`]: the handle has focus; the divider
//!   position at entry is remembered so that `cancel-position` can revert.
//! - [`NavigationState::CrossPanedCycle`]: the handle has focus because
//!   `cycle-handle-focus` moved it here from another paned's handle.
//!
//! # Example
//!
//! ```ignore
//! let paned = ui.create_paned(window, Orientation::Horizontal, "split")?;
//! let sidebar = ui.create_widget(paned.id(), "sidebar")?;
//! let editor = ui.create_widget(paned.id(), "editor")?;
//! paned.allocate(&mut ui, 400);
//!
//! ui.grab_focus(editor);
//! ui.dispatch_key(window, keyval::F8, 0); // handle focused
//! ui.dispatch_key(window, keyval::RIGHT, 0); // divider moves
//! ui.dispatch_key(window, keyval::RETURN, 0); // focus back on editor
//! ```

use keyloom_core::{
    ClassResult, ObjectError, ObjectId, ObjectResult, ParamType, Signal, SignalSignature, Value,
    WeakObject,
};

use super::focus::FocusDirection;
use super::paned_layout::{self, ChildPacking, DividerInput};
use super::scroll::{ScrollStep, ScrollType, SCROLL_TYPE};
use super::ui::{TextDirection, Ui};
use crate::bindings::{keyval, Arg, BindingEngine, BindingSetId, KeySpec, ModifierType, SignalSpec};

/// Axis along which a paned splits its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Children side by side, divider moves left and right.
    #[default]
    Horizontal,
    /// Children stacked, divider moves up and down.
    Vertical,
}

/// One of the two panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    First,
    Second,
}

/// Keyboard navigation state of a paned, derived from focus and cycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    Idle,
    HandleFocused,
    CrossPanedCycle,
}

/// Per-instance state of a paned.
///
/// Every widget reference is weak: the host releases it when the widget is
/// destroyed and it reads as `None` afterwards.
#[derive(Debug)]
pub struct PanedState {
    orientation: Orientation,
    child1: Option<ObjectId>,
    child2: Option<ObjectId>,
    packing1: ChildPacking,
    packing2: ChildPacking,
    position: i32,
    min_position: i32,
    max_position: i32,
    position_set: bool,
    last_allocation: i32,
    original_position: Option<i32>,
    saved_focus: WeakObject,
    first_paned: WeakObject,
    last_child1_focus: WeakObject,
    last_child2_focus: WeakObject,
    in_recursion: bool,
    handle_prelit: bool,
    drag_offset: Option<i32>,
    position_changed: Signal<i32>,
}

impl PanedState {
    pub(crate) fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            child1: None,
            child2: None,
            packing1: ChildPacking::new(false, true),
            packing2: ChildPacking::new(true, true),
            position: 0,
            min_position: 0,
            max_position: 0,
            position_set: false,
            last_allocation: 0,
            original_position: None,
            saved_focus: WeakObject::empty(),
            first_paned: WeakObject::empty(),
            last_child1_focus: WeakObject::empty(),
            last_child2_focus: WeakObject::empty(),
            in_recursion: false,
            handle_prelit: false,
            drag_offset: None,
            position_changed: Signal::new(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub(crate) fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn child1(&self) -> Option<ObjectId> {
        self.child1
    }

    pub fn child2(&self) -> Option<ObjectId> {
        self.child2
    }

    pub fn packing(&self, pane: Pane) -> ChildPacking {
        match pane {
            Pane::First => self.packing1,
            Pane::Second => self.packing2,
        }
    }

    /// Divider position: the size given to the first child.
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn min_position(&self) -> i32 {
        self.min_position
    }

    pub fn max_position(&self) -> i32 {
        self.max_position
    }

    /// Whether the position was pinned with `set_position`.
    pub fn position_set(&self) -> bool {
        self.position_set
    }

    /// Position captured when the handle took focus, for `cancel-position`.
    pub fn original_position(&self) -> Option<i32> {
        self.original_position
    }

    /// Widget that had focus before the handle did.
    pub fn saved_focus(&self) -> Option<ObjectId> {
        self.saved_focus.raw()
    }

    /// Paned whose handle a handle-focus cycle started from.
    pub fn first_paned(&self) -> Option<ObjectId> {
        self.first_paned.raw()
    }

    pub fn last_child1_focus(&self) -> Option<ObjectId> {
        self.last_child1_focus.raw()
    }

    pub fn last_child2_focus(&self) -> Option<ObjectId> {
        self.last_child2_focus.raw()
    }

    pub fn is_panning(&self) -> bool {
        self.drag_offset.is_some()
    }

    pub fn handle_prelit(&self) -> bool {
        self.handle_prelit
    }

    /// Fires with the new position whenever the divider moves.
    pub fn position_changed(&self) -> &Signal<i32> {
        &self.position_changed
    }

    pub(crate) fn pane_of_child(&self, child: ObjectId) -> Option<Pane> {
        if self.child1 == Some(child) {
            Some(Pane::First)
        } else if self.child2 == Some(child) {
            Some(Pane::Second)
        } else {
            None
        }
    }

    pub(crate) fn record_last_focus(&mut self, pane_root: ObjectId, widget: ObjectId) {
        match self.pane_of_child(pane_root) {
            Some(Pane::First) => self.last_child1_focus.set(Some(widget)),
            Some(Pane::Second) => self.last_child2_focus.set(Some(widget)),
            None => {}
        }
    }

    /// Drop every reference to a destroyed object.
    pub(crate) fn release(&mut self, destroyed: ObjectId) {
        self.saved_focus.release(destroyed);
        self.first_paned.release(destroyed);
        self.last_child1_focus.release(destroyed);
        self.last_child2_focus.release(destroyed);
        if self.child1 == Some(destroyed) {
            self.child1 = None;
        }
        if self.child2 == Some(destroyed) {
            self.child2 = None;
        }
    }

    fn clear_navigation(&mut self) {
        self.saved_focus.clear();
        self.first_paned.clear();
        self.original_position = None;
    }
}

// =============================================================================
// Paned handle
// =============================================================================

/// A paned instance living in a [`Ui`].
///
/// The handle is a plain id; every method takes the host it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Paned(ObjectId);

impl Paned {
    /// The paned with id `id`, if `id` is a live paned.
    pub fn from_id(ui: &Ui, id: ObjectId) -> Option<Self> {
        ui.paned.contains_key(id).then_some(Self(id))
    }

    pub(crate) fn from_raw(id: ObjectId) -> Self {
        Self(id)
    }

    #[inline]
    pub fn id(self) -> ObjectId {
        self.0
    }

    pub fn state(self, ui: &Ui) -> Option<&PanedState> {
        ui.paned.get(self.0)
    }

    pub fn orientation(self, ui: &Ui) -> Orientation {
        self.state(ui).map(PanedState::orientation).unwrap_or_default()
    }

    pub fn set_orientation(self, ui: &mut Ui, orientation: Orientation) {
        if let Some(state) = ui.paned.get_mut(self.0) {
            state.set_orientation(orientation);
        }
    }

    pub fn child1(self, ui: &Ui) -> Option<ObjectId> {
        self.state(ui).and_then(PanedState::child1)
    }

    pub fn child2(self, ui: &Ui) -> Option<ObjectId> {
        self.state(ui).and_then(PanedState::child2)
    }

    /// Put `child` in the first pane.
    ///
    /// `resize` lets the child grow with the paned; `shrink` lets it go
    /// below its requisition. Returns `false` if the pane is occupied.
    pub fn pack1(self, ui: &mut Ui, child: ObjectId, resize: bool, shrink: bool) -> ObjectResult<bool> {
        ui.paned_pack(self.0, Pane::First, child, ChildPacking::new(resize, shrink))
    }

    /// Put `child` in the second pane. See [`pack1`](Self::pack1).
    pub fn pack2(self, ui: &mut Ui, child: ObjectId, resize: bool, shrink: bool) -> ObjectResult<bool> {
        ui.paned_pack(self.0, Pane::Second, child, ChildPacking::new(resize, shrink))
    }

    /// [`pack1`](Self::pack1) with `resize = false`, `shrink = true`.
    pub fn add1(self, ui: &mut Ui, child: ObjectId) -> ObjectResult<bool> {
        self.pack1(ui, child, false, true)
    }

    /// [`pack2`](Self::pack2) with `resize = true`, `shrink = true`.
    pub fn add2(self, ui: &mut Ui, child: ObjectId) -> ObjectResult<bool> {
        self.pack2(ui, child, true, true)
    }

    pub fn position(self, ui: &Ui) -> i32 {
        self.state(ui).map_or(0, PanedState::position)
    }

    pub fn min_position(self, ui: &Ui) -> i32 {
        self.state(ui).map_or(0, PanedState::min_position)
    }

    pub fn max_position(self, ui: &Ui) -> i32 {
        self.state(ui).map_or(0, PanedState::max_position)
    }

    /// Pin the divider at `position`; a negative value unpins it.
    ///
    /// Once the paned has been allocated the position is clamped to
    /// `[min_position, max_position]` immediately.
    pub fn set_position(self, ui: &mut Ui, position: i32) {
        ui.paned_set_position(self.0, position);
    }

    /// Lay the paned out along `allocation` pixels.
    pub fn allocate(self, ui: &mut Ui, allocation: i32) {
        ui.paned_allocate(self.0, allocation);
    }

    /// Set the children's requested sizes along the paned axis.
    pub fn set_child_sizes(self, ui: &mut Ui, child1: i32, child2: i32) {
        if let Some(state) = ui.paned.get_mut(self.0) {
            state.packing1.requisition = child1.max(0);
            state.packing2.requisition = child2.max(0);
        }
        ui.paned_relayout(self.0);
    }

    pub fn navigation_state(self, ui: &Ui) -> NavigationState {
        if !ui.is_focus(self.0) {
            return NavigationState::Idle;
        }
        match self.state(ui).and_then(|s| s.first_paned.upgrade(ui.objects())) {
            Some(first) if first != self.0 => NavigationState::CrossPanedCycle,
            _ => NavigationState::HandleFocused,
        }
    }

    /// Start dragging the handle from `pointer` (paned coordinates).
    pub fn drag_begin(self, ui: &mut Ui, pointer: i32) {
        let rtl = ui.paned_is_rtl(self.0);
        if let Some(state) = ui.paned.get_mut(self.0) {
            let handle = if rtl {
                state.last_allocation - state.position
            } else {
                state.position
            };
            state.drag_offset = Some(pointer - handle);
            tracing::trace!(target: "keyloom::paned", paned = ?self.0, pointer, "drag started");
        }
    }

    /// Move the handle to follow `pointer`.
    pub fn drag_update(self, ui: &mut Ui, pointer: i32) {
        let rtl = ui.paned_is_rtl(self.0);
        let Some(state) = ui.paned.get(self.0) else {
            return;
        };
        let Some(offset) = state.drag_offset else {
            return;
        };
        let handle = pointer - offset;
        let position = if rtl {
            state.last_allocation - handle
        } else {
            handle
        };
        let position = position.clamp(state.min_position, state.max_position);
        ui.paned_set_position(self.0, position);
    }

    pub fn drag_end(self, ui: &mut Ui) {
        if let Some(state) = ui.paned.get_mut(self.0) {
            state.drag_offset = None;
        }
    }

    /// Track whether the pointer hovers over the handle.
    pub fn set_handle_prelit(self, ui: &mut Ui, prelit: bool) {
        if let Some(state) = ui.paned.get_mut(self.0) {
            state.handle_prelit = prelit;
        }
    }

    /// Every visible paned sharing a handle-focus cycle with this one, in
    /// document order.
    pub fn discover(self, ui: &Ui) -> Vec<Paned> {
        ui.paned_discover(self.0).into_iter().map(Paned).collect()
    }
}

// =============================================================================
// Class installation
// =============================================================================

pub const CYCLE_CHILD_FOCUS: &str = "cycle-child-focus";
pub const TOGGLE_HANDLE_FOCUS: &str = "toggle-handle-focus";
pub const MOVE_HANDLE: &str = "move-handle";
pub const CYCLE_HANDLE_FOCUS: &str = "cycle-handle-focus";
pub const ACCEPT_POSITION: &str = "accept-position";
pub const CANCEL_POSITION: &str = "cancel-position";

pub(crate) fn install_class(ui: &mut Ui) -> ClassResult<()> {
    let class = ui.builtin_classes().paned;

    ui.add_action(
        class,
        SignalSignature::action(CYCLE_CHILD_FOCUS).param(ParamType::Bool).returns_bool(),
        |ui, paned, args| ui.paned_cycle_child_focus(paned, reversed_arg(args)),
    )?;
    ui.add_action(
        class,
        SignalSignature::action(TOGGLE_HANDLE_FOCUS).returns_bool(),
        |ui, paned, _| ui.paned_toggle_handle_focus(paned),
    )?;
    ui.add_action(
        class,
        SignalSignature::action(MOVE_HANDLE).param(ScrollType::param_type()).returns_bool(),
        |ui, paned, args| match args.first().and_then(ScrollType::from_arg) {
            Some(scroll) => ui.paned_move_handle(paned, scroll),
            None => false,
        },
    )?;
    ui.add_action(
        class,
        SignalSignature::action(CYCLE_HANDLE_FOCUS).param(ParamType::Bool).returns_bool(),
        |ui, paned, args| ui.paned_cycle_handle_focus(paned, reversed_arg(args)),
    )?;
    ui.add_action(
        class,
        SignalSignature::action(ACCEPT_POSITION).returns_bool(),
        |ui, paned, _| ui.paned_accept_position(paned),
    )?;
    ui.add_action(
        class,
        SignalSignature::action(CANCEL_POSITION).returns_bool(),
        |ui, paned, _| ui.paned_cancel_position(paned),
    )?;

    let engine = ui.bindings().clone();
    let set = engine.set_for_class(ui.classes(), class);
    add_default_bindings(&engine, set);
    Ok(())
}

fn reversed_arg(args: &[Value]) -> bool {
    args.first().and_then(Value::as_bool).unwrap_or(false)
}

fn add_default_bindings(engine: &BindingEngine, set: BindingSetId) {
    let none = ModifierType::empty();
    let ctrl = ModifierType::CONTROL;
    let shift = ModifierType::SHIFT;
    let bind = |keyval: u32, modifiers: ModifierType, signal: SignalSpec| {
        engine.add_signal(set, KeySpec::new(keyval, modifiers), signal);
    };

    bind(keyval::F6, none, SignalSpec::builder(CYCLE_CHILD_FOCUS).bool(false).build());
    bind(keyval::F6, shift, SignalSpec::builder(CYCLE_CHILD_FOCUS).bool(true).build());
    bind(keyval::F8, none, SignalSpec::builder(CYCLE_HANDLE_FOCUS).bool(false).build());
    bind(keyval::F8, shift, SignalSpec::builder(CYCLE_HANDLE_FOCUS).bool(true).build());

    for tab in [keyval::TAB, keyval::KP_TAB] {
        for modifiers in [none, ctrl, shift, ctrl | shift] {
            bind(tab, modifiers, SignalSpec::new(TOGGLE_HANDLE_FOCUS, vec![]));
        }
    }

    bind(keyval::ESCAPE, none, SignalSpec::new(CANCEL_POSITION, vec![]));
    for key in [
        keyval::RETURN,
        keyval::ISO_ENTER,
        keyval::KP_ENTER,
        keyval::SPACE,
        keyval::KP_SPACE,
    ] {
        bind(key, none, SignalSpec::new(ACCEPT_POSITION, vec![]));
    }

    let scroll = |s: ScrollType| SignalSpec::new(MOVE_HANDLE, vec![Arg::enum_value(&SCROLL_TYPE, s.value())]);
    let arrows = [
        ([keyval::LEFT, keyval::KP_LEFT], ScrollType::StepLeft, ScrollType::PageLeft),
        ([keyval::RIGHT, keyval::KP_RIGHT], ScrollType::StepRight, ScrollType::PageRight),
        ([keyval::UP, keyval::KP_UP], ScrollType::StepUp, ScrollType::PageUp),
        ([keyval::DOWN, keyval::KP_DOWN], ScrollType::StepDown, ScrollType::PageDown),
    ];
    for (keys, step, page) in arrows {
        for key in keys {
            bind(key, none, scroll(step));
            bind(key, ctrl, scroll(page));
        }
    }
    let jumps = [
        ([keyval::PAGE_UP, keyval::KP_PAGE_UP], ScrollType::PageUp),
        ([keyval::PAGE_DOWN, keyval::KP_PAGE_DOWN], ScrollType::PageRight),
        ([keyval::HOME, keyval::KP_HOME], ScrollType::Start),
        ([keyval::END, keyval::KP_END], ScrollType::End),
    ];
    for (keys, jump) in jumps {
        for key in keys {
            bind(key, none, scroll(jump));
        }
    }
}

// =============================================================================
// Navigator
// =============================================================================

impl Ui {
    pub(crate) fn paned_pack(
        &mut self,
        paned: ObjectId,
        pane: Pane,
        child: ObjectId,
        packing: ChildPacking,
    ) -> ObjectResult<bool> {
        if !self.objects().contains(child) {
            return Err(ObjectError::InvalidObjectId);
        }
        let state = self.paned.get(paned).ok_or(ObjectError::InvalidObjectId)?;
        let slot = match pane {
            Pane::First => state.child1,
            Pane::Second => state.child2,
        };
        if slot.is_some() {
            return Ok(false);
        }
        self.reparent(child, paned)?;
        if let Some(state) = self.paned.get_mut(paned) {
            let requisition = state.packing(pane).requisition;
            let packing = ChildPacking { requisition, ..packing };
            match pane {
                Pane::First => {
                    state.child1 = Some(child);
                    state.packing1 = packing;
                }
                Pane::Second => {
                    state.child2 = Some(child);
                    state.packing2 = packing;
                }
            }
        }
        tracing::debug!(target: "keyloom::paned", ?paned, ?child, ?pane, "packed child");
        self.paned_relayout(paned);
        Ok(true)
    }

    fn reparent(&mut self, child: ObjectId, paned: ObjectId) -> ObjectResult<()> {
        // A child moving between panes of two paneds leaves the old slot.
        if let Some(old) = self.objects().parent(child)?
            && let Some(state) = self.paned.get_mut(old)
        {
            state.release(child);
        }
        self.objects_mut().set_parent(child, Some(paned))
    }

    pub(crate) fn paned_is_rtl(&self, paned: ObjectId) -> bool {
        self.text_direction() == TextDirection::Rtl
            && self
                .paned
                .get(paned)
                .is_some_and(|s| s.orientation == Orientation::Horizontal)
    }

    pub(crate) fn paned_allocate(&mut self, paned: ObjectId, allocation: i32) {
        if let Some(previous) = self.paned.get(paned).map(|s| s.position) {
            self.paned_layout(paned, allocation.max(0), previous);
        }
    }

    /// Re-run layout against the last allocation.
    pub(crate) fn paned_relayout(&mut self, paned: ObjectId) {
        if let Some(state) = self.paned.get(paned)
            && state.last_allocation > 0
        {
            let (allocation, previous) = (state.last_allocation, state.position);
            self.paned_layout(paned, allocation, previous);
        }
    }

    /// Lay out along `allocation`, notifying if the divider ends up away
    /// from `previous`.
    fn paned_layout(&mut self, paned: ObjectId, allocation: i32, previous: i32) {
        let Some(state) = self.paned.get_mut(paned) else {
            return;
        };
        let layout = paned_layout::compute(
            DividerInput {
                allocation,
                last_allocation: state.last_allocation,
                child1_size: state.position,
                position_set: state.position_set,
            },
            state.packing1,
            state.packing2,
        );
        state.position = layout.position;
        state.min_position = layout.min_position;
        state.max_position = layout.max_position;
        state.last_allocation = allocation;
        if previous != layout.position {
            tracing::trace!(target: "keyloom::paned", ?paned, from = previous, to = layout.position, "divider moved");
            state.position_changed.emit(layout.position);
        }
    }

    pub(crate) fn paned_set_position(&mut self, paned: ObjectId, position: i32) {
        let Some(state) = self.paned.get_mut(paned) else {
            return;
        };
        let previous = state.position;
        state.position_set = position >= 0;
        if position >= 0 {
            state.position = position;
        }
        let allocation = state.last_allocation;
        if allocation > 0 {
            self.paned_layout(paned, allocation, previous);
        } else if state.position != previous {
            state.position_changed.emit(state.position);
        }
    }

    /// Focus-in hook of a paned handle.
    pub(crate) fn paned_focus_in(&mut self, paned: ObjectId, previous: Option<ObjectId>) {
        let previous = previous.filter(|&p| p != paned && !self.paned.contains_key(p));
        let objects = self.objects();
        let Some(state) = self.paned.get(paned) else {
            return;
        };
        let keep_saved = state.saved_focus.is_alive(objects);
        let keep_first = state.first_paned.is_alive(objects);

        if let Some(state) = self.paned.get_mut(paned) {
            if !keep_saved {
                state.saved_focus.set(previous);
            }
            if !keep_first {
                state.first_paned.set(Some(paned));
            }
            if state.original_position.is_none() {
                state.original_position = Some(state.position);
            }
            tracing::debug!(target: "keyloom::paned", ?paned, saved = ?state.saved_focus.raw(), original = ?state.original_position, "handle focused");
        }
    }

    /// Focus-out hook of a paned handle.
    pub(crate) fn paned_focus_out(&mut self, paned: ObjectId) {
        if let Some(state) = self.paned.get_mut(paned) {
            state.clear_navigation();
            tracing::trace!(target: "keyloom::paned", ?paned, "handle lost focus");
        }
    }

    /// The pane of `paned` whose subtree holds `widget`.
    fn pane_containing(&self, paned: ObjectId, widget: ObjectId) -> Option<Pane> {
        let state = self.paned.get(paned)?;
        let inside = |child: Option<ObjectId>| child.is_some_and(|c| self.objects().is_ancestor(c, widget));
        if inside(state.child1) {
            Some(Pane::First)
        } else if inside(state.child2) {
            Some(Pane::Second)
        } else {
            None
        }
    }

    /// The pane holding the window focus, if any.
    fn focused_pane(&self, paned: ObjectId) -> Option<Pane> {
        let window = self.window_of(paned)?;
        let focus = self.focus_widget(window)?;
        self.pane_containing(paned, focus)
    }

    fn nearest_paned_ancestor(&self, widget: ObjectId) -> Option<ObjectId> {
        self.objects()
            .ancestors(widget)
            .into_iter()
            .find(|id| self.paned.contains_key(*id))
    }

    // -------------------------------------------------------------------------
    // cycle-child-focus
    // -------------------------------------------------------------------------

    #[tracing::instrument(skip(self), target = "keyloom::paned", level = "trace")]
    pub(crate) fn paned_cycle_child_focus(&mut self, paned: ObjectId, reversed: bool) -> bool {
        if self.is_focus(paned) {
            return true;
        }
        let direction = FocusDirection::from_reversed(reversed);
        let mut chain = Vec::new();
        self.paned_cycle_chain(paned, direction, &mut chain);
        for widget in chain {
            if self.child_focus(widget, direction) {
                break;
            }
        }
        true
    }

    /// Widgets to try, in order, when cycling focus between panes.
    ///
    /// The last focus of a pane is preferred over the pane itself, and nested
    /// paneds are expanded into their own chains.
    fn paned_cycle_chain(&mut self, paned: ObjectId, direction: FocusDirection, out: &mut Vec<ObjectId>) {
        let Some(state) = self.paned.get(paned) else {
            return;
        };
        if state.in_recursion {
            return;
        }
        let objects = self.objects();
        let valid = |w: Option<ObjectId>| w.filter(|&w| objects.contains(w) && w != paned && objects.is_ancestor(paned, w));
        let last1 = valid(state.last_child1_focus.raw());
        let last2 = valid(state.last_child2_focus.raw());
        let (child1, child2) = (state.child1, state.child2);

        if let Some(state) = self.paned.get_mut(paned) {
            if last1.is_none() {
                state.last_child1_focus.clear();
            }
            if last2.is_none() {
                state.last_child2_focus.clear();
            }
        }

        let ancestor = self.nearest_paned_ancestor(paned);
        let focused = self.focused_pane(paned);
        let candidates = match (direction, focused) {
            (FocusDirection::Forward, Some(Pane::First)) => vec![last2, child2, ancestor],
            (FocusDirection::Forward, Some(Pane::Second)) => vec![ancestor, last1, child1],
            (FocusDirection::Forward, None) => vec![last1, child1, last2, child2, ancestor],
            (FocusDirection::Backward, Some(Pane::First)) => vec![ancestor, last2, child2],
            (FocusDirection::Backward, Some(Pane::Second)) => vec![last1, child1, ancestor],
            (FocusDirection::Backward, None) => vec![last2, child2, last1, child1, ancestor],
        };

        for widget in candidates.into_iter().flatten() {
            if self.paned.contains_key(widget) {
                self.set_in_recursion(paned, true);
                self.paned_cycle_chain(widget, direction, out);
                self.set_in_recursion(paned, false);
            } else {
                out.push(widget);
            }
        }
    }

    fn set_in_recursion(&mut self, paned: ObjectId, value: bool) {
        if let Some(state) = self.paned.get_mut(paned) {
            state.in_recursion = value;
        }
    }

    // -------------------------------------------------------------------------
    // cycle-handle-focus
    // -------------------------------------------------------------------------

    /// Visible paneds in document order under the outermost paned ancestor
    /// of `paned`, or under its toplevel when it has none.
    pub(crate) fn paned_discover(&self, paned: ObjectId) -> Vec<ObjectId> {
        if !self.paned.contains_key(paned) {
            return Vec::new();
        }
        let root = self
            .objects()
            .ancestors(paned)
            .into_iter()
            .rev()
            .find(|id| self.paned.contains_key(*id))
            .unwrap_or_else(|| self.objects().toplevel(paned));
        let mut out = Vec::new();
        self.collect_paneds(root, &mut out);
        out
    }

    fn collect_paneds(&self, widget: ObjectId, out: &mut Vec<ObjectId>) {
        if !self.objects().state(widget).is_ok_and(|s| s.visible) {
            return;
        }
        if let Some(state) = self.paned.get(widget) {
            let (child1, child2) = (state.child1, state.child2);
            if let Some(child) = child1 {
                self.collect_paneds(child, out);
            }
            out.push(widget);
            if let Some(child) = child2 {
                self.collect_paneds(child, out);
            }
        } else if let Ok(children) = self.objects().children(widget) {
            for &child in children {
                self.collect_paneds(child, out);
            }
        }
    }

    /// The next and previous paned in the discovery order, wrapping.
    fn paned_neighbours(&self, paned: ObjectId) -> (ObjectId, ObjectId) {
        let all = self.paned_discover(paned);
        match all.iter().position(|&id| id == paned) {
            Some(index) => {
                let len = all.len();
                (all[(index + 1) % len], all[(index + len - 1) % len])
            }
            None => (paned, paned),
        }
    }

    #[tracing::instrument(skip(self), target = "keyloom::paned", level = "trace")]
    pub(crate) fn paned_cycle_handle_focus(&mut self, paned: ObjectId, reversed: bool) -> bool {
        if self.is_focus(paned) {
            self.cycle_from_handle(paned, reversed);
        } else {
            self.cycle_into_handle(paned, reversed);
        }
        true
    }

    /// Pass handle focus to the neighbouring paned, carrying the saved focus.
    fn cycle_from_handle(&mut self, paned: ObjectId, reversed: bool) {
        let objects = self.objects();
        let Some(state) = self.paned.get(paned) else {
            return;
        };
        let saved = state.saved_focus.upgrade(objects);
        let first = state.first_paned.upgrade(objects).unwrap_or(paned);

        let (next, prev) = self.paned_neighbours(paned);
        let target = if reversed { prev } else { next };
        if target == paned {
            self.paned_accept_position(paned);
            return;
        }

        if let Some(target_state) = self.paned.get_mut(target) {
            target_state.saved_focus.set(saved);
            target_state.first_paned.set(Some(first));
        }
        if let Some(state) = self.paned.get_mut(paned) {
            state.saved_focus.clear();
            state.first_paned.clear();
        }

        if self.grab_focus(target) {
            if let Some(target_state) = self.paned.get_mut(target) {
                target_state.original_position = Some(target_state.position);
            }
            tracing::debug!(target: "keyloom::paned", from = ?paned, to = ?target, ?first, "handle focus cycled");
        } else {
            // Target refused focus; keep the cycle on this handle.
            if let Some(target_state) = self.paned.get_mut(target) {
                target_state.saved_focus.clear();
                target_state.first_paned.clear();
            }
            if let Some(state) = self.paned.get_mut(paned) {
                state.saved_focus.set(saved);
                state.first_paned.set(Some(first));
            }
        }
    }

    /// Start handle navigation from a focus widget inside a pane.
    fn cycle_into_handle(&mut self, paned: ObjectId, reversed: bool) {
        let (next, prev) = self.paned_neighbours(paned);
        let (focus, first) = match (self.focused_pane(paned), reversed) {
            (Some(Pane::First), true) => (prev, paned),
            (Some(Pane::First), false) => (paned, paned),
            (Some(Pane::Second), true) => (paned, next),
            (Some(Pane::Second), false) => (next, next),
            (None, true) => (paned, paned),
            (None, false) => (paned, next),
        };

        let saved = self
            .window_of(paned)
            .and_then(|window| self.focus_widget(window));
        if let Some(state) = self.paned.get_mut(focus) {
            state.saved_focus.set(saved);
            state.first_paned.set(Some(first));
            state.original_position = Some(state.position);
        }
        if !self.grab_focus(focus)
            && let Some(state) = self.paned.get_mut(focus)
        {
            state.clear_navigation();
        }
    }

    // -------------------------------------------------------------------------
    // move-handle, accept-position, cancel-position, toggle-handle-focus
    // -------------------------------------------------------------------------

    #[tracing::instrument(skip(self), target = "keyloom::paned", level = "trace")]
    pub(crate) fn paned_move_handle(&mut self, paned: ObjectId, scroll: ScrollType) -> bool {
        if !self.is_focus(paned) {
            return false;
        }
        let rtl = self.paned_is_rtl(paned);
        let config = self.paned_config();
        let Some(state) = self.paned.get(paned) else {
            return false;
        };
        let old = state.position;
        let (min, max) = (state.min_position, state.max_position);
        // Widened so oversized steps clamp instead of overflowing.
        let offset = |count: i32, step: i32| {
            let increment = i64::from(count) * i64::from(step);
            let moved = i64::from(old) + if rtl { -increment } else { increment };
            moved.clamp(i64::from(min), i64::from(max)) as i32
        };
        let new = match scroll.step() {
            ScrollStep::Step(n) => offset(n, config.single_step),
            ScrollStep::Page(n) => offset(n, config.page_step),
            ScrollStep::Start => min,
            ScrollStep::End => max,
        };
        let new = new.clamp(min, max);
        if new != old {
            self.paned_set_position(paned, new);
        }
        true
    }

    /// Give focus back to the saved widget, or to the first pane,
    /// or to nothing.
    fn paned_restore_focus(&mut self, paned: ObjectId) {
        if !self.is_focus(paned) {
            return;
        }
        let saved = self
            .paned
            .get(paned)
            .and_then(|s| s.saved_focus.upgrade(self.objects()))
            .filter(|&w| self.objects().is_effectively_sensitive(w));

        let restored = saved.is_some_and(|w| self.grab_focus(w));
        if !restored
            && !self.child_focus(paned, FocusDirection::Forward)
            && let Some(window) = self.window_of(paned)
        {
            self.set_window_focus(window, None);
        }
        if let Some(state) = self.paned.get_mut(paned) {
            state.saved_focus.clear();
            state.first_paned.clear();
        }
        tracing::debug!(target: "keyloom::paned", ?paned, ?saved, restored, "focus restored");
    }

    pub(crate) fn paned_accept_position(&mut self, paned: ObjectId) -> bool {
        if !self.is_focus(paned) {
            return false;
        }
        if let Some(state) = self.paned.get_mut(paned) {
            state.original_position = None;
        }
        self.paned_restore_focus(paned);
        true
    }

    pub(crate) fn paned_cancel_position(&mut self, paned: ObjectId) -> bool {
        if !self.is_focus(paned) {
            return false;
        }
        if let Some(original) = self.paned.get_mut(paned).and_then(|s| s.original_position.take()) {
            self.paned_set_position(paned, original);
        }
        self.paned_restore_focus(paned);
        true
    }

    /// Tab on a focused handle commits the position and lets the Tab move
    /// focus on from the restored widget.
    pub(crate) fn paned_toggle_handle_focus(&mut self, paned: ObjectId) -> bool {
        if self.is_focus(paned) {
            self.paned_accept_position(paned);
        }
        false
    }
}
