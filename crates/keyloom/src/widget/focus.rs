//! Focus management for widget trees.
//!
//! Every window has at most one focus widget. [`FocusManager`] stores that
//! mapping; the focus operations themselves live on [`Ui`] because moving
//! focus runs paned hooks and pane bookkeeping.
//!
//! # Tab Order
//!
//! Tab order is a depth-first pre-order traversal of the visible, sensitive
//! part of the tree. A paned contributes its first pane before its second,
//! whatever order the panes were packed in. Only leaf widgets that can hold
//! focus participate; paned handles are reachable only through
//! [`Ui::grab_focus`] and the handle-cycling bindings.
//!
//! ```ignore
//! ui.grab_focus(entry);
//! ui.move_focus(window, FocusDirection::Forward); // Tab
//! ui.child_focus(sidebar, FocusDirection::Backward); // last widget in sidebar
//! ```

use std::collections::HashMap;

use keyloom_core::ObjectId;

use super::ui::Ui;
use crate::bindings::{keyval, KeySpec, ModifierType};

/// Direction of a focus move along the tab chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDirection {
    Forward,
    Backward,
}

impl FocusDirection {
    /// `Backward` when `reversed`, as passed by the cycling signals.
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed { Self::Backward } else { Self::Forward }
    }

    /// The direction a Tab key moves focus in, if `key` is a Tab.
    ///
    /// Shift reverses the direction; Control is accepted and ignored.
    pub fn from_tab_key(key: &KeySpec) -> Option<Self> {
        if !matches!(key.keyval(), keyval::TAB | keyval::KP_TAB) {
            return None;
        }
        let extra = key.modifiers() - (ModifierType::SHIFT | ModifierType::CONTROL);
        if !extra.is_empty() {
            return None;
        }
        Some(Self::from_reversed(key.modifiers().contains(ModifierType::SHIFT)))
    }
}

/// Per-window focus widgets.
#[derive(Debug, Default)]
pub struct FocusManager {
    focused: HashMap<ObjectId, ObjectId>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self {
            focused: HashMap::new(),
        }
    }

    /// The focus widget of `window`.
    #[inline]
    pub fn focused_widget(&self, window: ObjectId) -> Option<ObjectId> {
        self.focused.get(&window).copied()
    }

    /// Replace the focus widget of `window`, returning the previous one.
    pub(crate) fn replace(&mut self, window: ObjectId, widget: Option<ObjectId>) -> Option<ObjectId> {
        match widget {
            Some(widget) => self.focused.insert(window, widget),
            None => self.focused.remove(&window),
        }
    }

    /// Forget destroyed windows and destroyed focus widgets.
    pub(crate) fn release(&mut self, destroyed: &[ObjectId]) {
        self.focused
            .retain(|window, widget| !destroyed.contains(window) && !destroyed.contains(widget));
    }
}

impl Ui {
    /// The focus widget of `window`.
    pub fn focus_widget(&self, window: ObjectId) -> Option<ObjectId> {
        self.focus.focused_widget(window)
    }

    /// Whether `widget` is the focus widget of its window.
    pub fn is_focus(&self, widget: ObjectId) -> bool {
        self.window_of(widget)
            .is_some_and(|window| self.focus_widget(window) == Some(widget))
    }

    /// Whether `widget` can take focus right now.
    pub fn is_focusable(&self, widget: ObjectId) -> bool {
        self.objects().state(widget).is_ok_and(|s| s.can_focus)
            && self.objects().is_effectively_visible(widget)
            && self.objects().is_effectively_sensitive(widget)
    }

    /// Give `widget` the focus of its window.
    ///
    /// Returns `false`, leaving focus unchanged, if the widget cannot hold
    /// focus or does not live in a window. Grabbing focus on a paned focuses
    /// its handle.
    pub fn grab_focus(&mut self, widget: ObjectId) -> bool {
        if !self.is_focusable(widget) {
            return false;
        }
        let Some(window) = self.window_of(widget) else {
            tracing::trace!(target: "keyloom::focus", ?widget, "grab outside a window ignored");
            return false;
        };
        self.set_window_focus(window, Some(widget));
        true
    }

    /// Set the focus widget of `window` without checking focusability.
    ///
    /// Paned handles that lose focus run their focus-out hook, a paned
    /// gaining focus runs its focus-in hook, and every paned the new focus
    /// widget lives in records it as the last focus of that pane.
    #[tracing::instrument(skip(self), target = "keyloom::focus", level = "trace")]
    pub fn set_window_focus(&mut self, window: ObjectId, widget: Option<ObjectId>) {
        let old = self.focus_widget(window);
        if old == widget {
            return;
        }
        if let Some(new) = widget {
            self.record_pane_focus(new);
        }
        self.focus.replace(window, widget);

        if let Some(old) = old
            && self.paned.contains_key(old)
        {
            self.paned_focus_out(old);
        }
        if let Some(new) = widget
            && self.paned.contains_key(new)
        {
            self.paned_focus_in(new, old);
        }
        tracing::debug!(target: "keyloom::focus", ?window, from = ?old, to = ?widget, "focus changed");
    }

    /// Move focus inside `widget` one step in `direction`.
    ///
    /// With focus outside `widget` this focuses its first (or last)
    /// focusable descendant; with focus inside, the next (or previous) one.
    /// Returns `false` when there is nowhere further to go, in which case
    /// focus is unchanged.
    pub fn child_focus(&mut self, widget: ObjectId, direction: FocusDirection) -> bool {
        let Some(window) = self.window_of(widget) else {
            return false;
        };
        let mut walk = Vec::new();
        self.collect_focus_walk(widget, &mut walk);
        let current = self
            .focus_widget(window)
            .and_then(|focus| walk.iter().position(|&id| id == focus));

        let candidate = match (direction, current) {
            (FocusDirection::Forward, Some(pos)) => {
                walk[pos + 1..].iter().copied().find(|&id| self.is_tab_stop(id))
            }
            (FocusDirection::Forward, None) => walk.iter().copied().find(|&id| self.is_tab_stop(id)),
            (FocusDirection::Backward, Some(pos)) => {
                walk[..pos].iter().rev().copied().find(|&id| self.is_tab_stop(id))
            }
            (FocusDirection::Backward, None) => {
                walk.iter().rev().copied().find(|&id| self.is_tab_stop(id))
            }
        };

        match candidate {
            Some(next) => self.grab_focus(next),
            None => false,
        }
    }

    /// Move the focus of `window` along its tab chain, wrapping at the ends.
    pub fn move_focus(&mut self, window: ObjectId, direction: FocusDirection) -> bool {
        if self.child_focus(window, direction) {
            return true;
        }
        let order = self.tab_order(window);
        let wrapped = match direction {
            FocusDirection::Forward => order.first().copied(),
            FocusDirection::Backward => order.last().copied(),
        };
        match wrapped {
            Some(target) if self.focus_widget(window) != Some(target) => self.grab_focus(target),
            _ => false,
        }
    }

    /// Focusable widgets under `root` in tab order.
    pub fn tab_order(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut walk = Vec::new();
        self.collect_focus_walk(root, &mut walk);
        walk.retain(|&id| self.is_tab_stop(id));
        walk
    }

    /// Children of `widget` in focus order.
    pub fn focus_children(&self, widget: ObjectId) -> Vec<ObjectId> {
        if let Some(state) = self.paned.get(widget) {
            return [state.child1(), state.child2()].into_iter().flatten().collect();
        }
        self.objects()
            .children(widget)
            .map(<[ObjectId]>::to_vec)
            .unwrap_or_default()
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn is_tab_stop(&self, widget: ObjectId) -> bool {
        !self.paned.contains_key(widget) && self.is_focusable(widget)
    }

    /// Visible, sensitive nodes under `widget` (inclusive) in pre-order.
    fn collect_focus_walk(&self, widget: ObjectId, out: &mut Vec<ObjectId>) {
        let Ok(state) = self.objects().state(widget) else {
            return;
        };
        if !state.visible || !state.sensitive {
            return;
        }
        out.push(widget);
        for child in self.focus_children(widget) {
            self.collect_focus_walk(child, out);
        }
    }

    /// Record `widget` as the last focus of every pane it lives in.
    ///
    /// When another paned sits between a paned and `widget`, the outermost
    /// such paned is recorded instead.
    fn record_pane_focus(&mut self, widget: ObjectId) {
        let ancestors = self.objects().ancestors(widget);
        for (index, &paned) in ancestors.iter().enumerate() {
            if !self.paned.contains_key(paned) {
                continue;
            }
            let pane_root = if index == 0 { widget } else { ancestors[index - 1] };
            let last = ancestors[..index]
                .iter()
                .rev()
                .copied()
                .find(|id| self.paned.contains_key(*id))
                .unwrap_or(widget);
            if let Some(state) = self.paned.get_mut(paned) {
                state.record_last_focus(pane_root, last);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::Orientation;

    fn setup() -> (Ui, ObjectId, Vec<ObjectId>) {
        let mut ui = Ui::new();
        let window = ui.create_window("main");
        let left = ui.create_container(window, "left").unwrap();
        let a = ui.create_widget(left, "a").unwrap();
        let b = ui.create_widget(left, "b").unwrap();
        let c = ui.create_widget(window, "c").unwrap();
        (ui, window, vec![a, b, c])
    }

    #[test]
    fn test_tab_order_is_preorder() {
        let (ui, window, widgets) = setup();
        assert_eq!(ui.tab_order(window), widgets);
    }

    #[test]
    fn test_move_focus_wraps() {
        let (mut ui, window, w) = setup();
        assert!(ui.move_focus(window, FocusDirection::Forward));
        assert_eq!(ui.focus_widget(window), Some(w[0]));
        ui.move_focus(window, FocusDirection::Forward);
        ui.move_focus(window, FocusDirection::Forward);
        assert_eq!(ui.focus_widget(window), Some(w[2]));
        ui.move_focus(window, FocusDirection::Forward);
        assert_eq!(ui.focus_widget(window), Some(w[0]));
        ui.move_focus(window, FocusDirection::Backward);
        assert_eq!(ui.focus_widget(window), Some(w[2]));
    }

    #[test]
    fn test_tab_key_moves_focus() {
        let (mut ui, window, w) = setup();
        ui.grab_focus(w[0]);
        assert!(ui.dispatch_key(window, keyval::TAB, 0));
        assert_eq!(ui.focus_widget(window), Some(w[1]));
        assert!(ui.dispatch_key(window, keyval::ISO_LEFT_TAB, ModifierType::SHIFT.bits()));
        assert_eq!(ui.focus_widget(window), Some(w[0]));
    }

    #[test]
    fn test_insensitive_and_hidden_are_skipped() {
        let (mut ui, window, w) = setup();
        ui.set_sensitive(w[1], false).unwrap();
        ui.set_visible(w[2], false).unwrap();
        assert_eq!(ui.tab_order(window), vec![w[0]]);
        assert!(!ui.grab_focus(w[1]));
        assert!(ui.move_focus(window, FocusDirection::Forward));
        assert_eq!(ui.focus_widget(window), Some(w[0]));
        assert!(!ui.move_focus(window, FocusDirection::Forward));
    }

    #[test]
    fn test_child_focus_stops_at_end() {
        let (mut ui, window, w) = setup();
        let left = ui.objects().parent(w[0]).unwrap().unwrap();
        assert!(ui.child_focus(left, FocusDirection::Forward));
        assert_eq!(ui.focus_widget(window), Some(w[0]));
        assert!(ui.child_focus(left, FocusDirection::Forward));
        assert_eq!(ui.focus_widget(window), Some(w[1]));
        assert!(!ui.child_focus(left, FocusDirection::Forward));
        assert_eq!(ui.focus_widget(window), Some(w[1]));
        assert!(ui.child_focus(left, FocusDirection::Backward));
        assert_eq!(ui.focus_widget(window), Some(w[0]));
    }

    #[test]
    fn test_paned_handle_not_in_tab_order() {
        let mut ui = Ui::new();
        let window = ui.create_window("main");
        let paned = ui.create_paned(window, Orientation::Horizontal, "split").unwrap();
        let right = ui.create_widget(paned.id(), "right").unwrap();
        let left = ui.create_widget(window, "left").unwrap();
        ui.add_child(paned.id(), left).unwrap();

        assert_eq!(paned.child1(&ui), Some(right));
        assert_eq!(ui.tab_order(window), vec![right, left]);
        assert!(ui.grab_focus(paned.id()));
        assert!(ui.is_focus(paned.id()));
    }

    #[test]
    fn test_focus_outside_window_is_refused() {
        let mut ui = Ui::new();
        let widget = ui.builtin_classes().widget;
        let loose = ui.create(widget, None, "loose").unwrap();
        ui.set_can_focus(loose, true).unwrap();
        assert!(!ui.grab_focus(loose));
        assert!(!ui.is_focus(loose));
    }
}
