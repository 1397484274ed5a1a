//! Keyboard navigation of paned handles.

use keyloom::bindings::{keyval, KeyloomConfig, ModifierType, PanedConfig};
use keyloom::widget::{NavigationState, Orientation, Paned, ScrollType, TextDirection, Ui};
use keyloom::ObjectId;
use tracing_subscriber::EnvFilter;

/// A horizontal paned with two resizable, shrinkable children, laid out at
/// 400 pixels so the divider starts at 200.
fn split(ui: &mut Ui, parent: ObjectId, name: &str) -> (Paned, ObjectId, ObjectId) {
    let paned = ui.create_paned(parent, Orientation::Horizontal, name).unwrap();
    let left = ui.create_widget(parent, &format!("{name}-left")).unwrap();
    let right = ui.create_widget(parent, &format!("{name}-right")).unwrap();
    assert!(paned.pack1(ui, left, true, true).unwrap());
    assert!(paned.pack2(ui, right, true, true).unwrap());
    paned.allocate(ui, 400);
    (paned, left, right)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("keyloom::paned=debug,keyloom::focus=debug"))
        .try_init();
}

fn setup() -> (Ui, ObjectId, Paned, ObjectId, ObjectId) {
    init_tracing();
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let (paned, left, right) = split(&mut ui, window, "split");
    (ui, window, paned, left, right)
}

fn move_handle(ui: &mut Ui, paned: Paned, scroll: ScrollType, times: usize) {
    for _ in 0..times {
        assert_eq!(ui.emit_by_name(paned.id(), "move-handle", &[scroll.into()]), Ok(true));
    }
}

const CTRL: u32 = ModifierType::CONTROL.bits();
const SHIFT: u32 = ModifierType::SHIFT.bits();

#[test]
fn test_cancel_position_restores_divider_and_focus() {
    let (mut ui, window, paned, left, _) = setup();
    ui.grab_focus(left);
    assert!(ui.grab_focus(paned.id()));
    assert_eq!(paned.position(&ui), 200);
    assert_eq!(paned.state(&ui).unwrap().original_position(), Some(200));

    move_handle(&mut ui, paned, ScrollType::StepRight, 50);
    assert_eq!(paned.position(&ui), 250);

    assert_eq!(ui.emit_by_name(paned.id(), "cancel-position", &[]), Ok(true));
    assert_eq!(paned.position(&ui), 200);
    assert_eq!(ui.focus_widget(window), Some(left));
    assert_eq!(paned.navigation_state(&ui), NavigationState::Idle);
}

#[test]
fn test_rtl_inverts_horizontal_steps() {
    let (mut ui, _, paned, _, _) = setup();
    ui.set_text_direction(TextDirection::Rtl);
    ui.grab_focus(paned.id());
    move_handle(&mut ui, paned, ScrollType::StepLeft, 10);
    assert_eq!(paned.position(&ui), 210);
}

#[test]
fn test_rtl_leaves_vertical_steps_alone() {
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let paned = ui.create_paned(window, Orientation::Vertical, "stack").unwrap();
    ui.create_widget(paned.id(), "top").unwrap();
    ui.create_widget(paned.id(), "bottom").unwrap();
    paned.set_position(&mut ui, 100);
    paned.allocate(&mut ui, 300);
    ui.set_text_direction(TextDirection::Rtl);

    ui.grab_focus(paned.id());
    move_handle(&mut ui, paned, ScrollType::StepUp, 10);
    assert_eq!(paned.position(&ui), 90);
}

#[test]
fn test_f8_cycles_sibling_handles() {
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let (p1, _, _) = split(&mut ui, window, "p1");
    let (p2, p2_left, _) = split(&mut ui, window, "p2");
    let (p3, _, _) = split(&mut ui, window, "p3");
    assert_eq!(p2.discover(&ui), vec![p1, p2, p3]);

    ui.grab_focus(p2_left);
    ui.grab_focus(p2.id());

    assert!(ui.dispatch_key(window, keyval::F8, 0));
    assert!(ui.is_focus(p3.id()));
    assert_eq!(p3.navigation_state(&ui), NavigationState::CrossPanedCycle);

    assert!(ui.dispatch_key(window, keyval::F8, 0));
    assert!(ui.is_focus(p1.id()));

    assert!(ui.dispatch_key(window, keyval::F8, SHIFT));
    assert!(ui.is_focus(p3.id()));
}

#[test]
fn test_full_handle_cycle_returns_with_saved_focus() {
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let panes: Vec<_> = (0..3).map(|i| split(&mut ui, window, &format!("p{i}"))).collect();
    let (start, _, saved) = panes[1];
    ui.grab_focus(saved);
    ui.grab_focus(start.id());

    for step in 1..=panes.len() {
        assert!(ui.dispatch_key(window, keyval::F8, 0));
        let focused = ui.focus_widget(window).unwrap();
        let paned = Paned::from_id(&ui, focused).unwrap();
        assert_eq!(paned.state(&ui).unwrap().saved_focus(), Some(saved));
        assert_eq!(paned == start, step == panes.len());
    }

    assert!(ui.is_focus(start.id()));
    let state = start.state(&ui).unwrap();
    assert_eq!(state.saved_focus(), Some(saved));
    assert_eq!(state.first_paned(), Some(start.id()));
    assert_eq!(start.navigation_state(&ui), NavigationState::HandleFocused);

    assert!(ui.dispatch_key(window, keyval::RETURN, 0));
    assert_eq!(ui.focus_widget(window), Some(saved));
}

#[test]
fn test_cancel_after_arbitrary_moves() {
    let (mut ui, window, paned, _, right) = setup();
    ui.grab_focus(right);
    ui.grab_focus(paned.id());

    for (key, modifiers) in [
        (keyval::RIGHT, 0),
        (keyval::RIGHT, 0),
        (keyval::LEFT, CTRL),
        (keyval::END, 0),
        (keyval::KP_UP, 0),
        (keyval::HOME, 0),
        (keyval::PAGE_DOWN, 0),
        (keyval::KP_RIGHT, CTRL),
    ] {
        assert!(ui.dispatch_key(window, key, modifiers));
    }
    assert_eq!(paned.position(&ui), 150);

    assert!(ui.dispatch_key(window, keyval::ESCAPE, 0));
    assert_eq!(paned.position(&ui), 200);
    assert_eq!(ui.focus_widget(window), Some(right));
}

#[test]
fn test_cancel_in_cycled_paned_uses_its_own_entry_position() {
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let (p1, left, _) = split(&mut ui, window, "p1");
    let (p2, _, _) = split(&mut ui, window, "p2");
    p2.set_position(&mut ui, 120);

    ui.grab_focus(left);
    ui.grab_focus(p1.id());
    ui.dispatch_key(window, keyval::F8, 0);
    assert!(ui.is_focus(p2.id()));
    assert_eq!(p2.state(&ui).unwrap().original_position(), Some(120));

    ui.dispatch_key(window, keyval::END, 0);
    ui.dispatch_key(window, keyval::ESCAPE, 0);
    assert_eq!(p2.position(&ui), 120);
    assert_eq!(p1.position(&ui), 200);
    assert_eq!(ui.focus_widget(window), Some(left));
}

#[test]
fn test_f6_walks_nested_panes() {
    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let outer = ui.create_paned(window, Orientation::Horizontal, "outer").unwrap();
    let inner = ui.create_paned(outer.id(), Orientation::Vertical, "inner").unwrap();
    let a = ui.create_widget(inner.id(), "a").unwrap();
    let b = ui.create_widget(inner.id(), "b").unwrap();
    let c = ui.create_widget(outer.id(), "c").unwrap();
    assert_eq!(outer.child1(&ui), Some(inner.id()));

    ui.grab_focus(a);
    ui.dispatch_key(window, keyval::F6, 0);
    assert_eq!(ui.focus_widget(window), Some(b));
    ui.dispatch_key(window, keyval::F6, 0);
    assert_eq!(ui.focus_widget(window), Some(c));
    assert_eq!(outer.state(&ui).unwrap().last_child1_focus(), Some(inner.id()));
    ui.dispatch_key(window, keyval::F6, 0);
    assert_eq!(ui.focus_widget(window), Some(a));
}

#[test]
fn test_f6_on_focused_handle_is_swallowed() {
    let (mut ui, window, paned, _, _) = setup();
    ui.grab_focus(paned.id());
    assert!(ui.dispatch_key(window, keyval::F6, 0));
    assert!(ui.is_focus(paned.id()));
}

#[test]
fn test_destroyed_saved_focus_falls_back_to_first_child() {
    let (mut ui, window, paned, left, right) = setup();
    ui.grab_focus(right);
    ui.grab_focus(paned.id());
    ui.destroy(right).unwrap();
    assert_eq!(paned.state(&ui).unwrap().saved_focus(), None);

    assert!(ui.dispatch_key(window, keyval::KP_ENTER, 0));
    assert_eq!(ui.focus_widget(window), Some(left));
}

#[test]
fn test_tab_leaves_handle_through_saved_focus() {
    let (mut ui, window, paned, left, right) = setup();
    ui.grab_focus(right);
    ui.grab_focus(paned.id());
    ui.dispatch_key(window, keyval::RIGHT, 0);

    assert!(ui.dispatch_key(window, keyval::TAB, SHIFT));
    assert_eq!(ui.focus_widget(window), Some(left));
    assert_eq!(paned.position(&ui), 201);
    assert!(paned.state(&ui).unwrap().original_position().is_none());
}

#[test]
fn test_configured_page_step() {
    let config = KeyloomConfig::from_toml_str("[paned]\npage_step = 40\n").unwrap();
    let mut ui = Ui::with_config(&config);
    let window = ui.create_window("main");
    let (paned, _, _) = split(&mut ui, window, "split");

    ui.grab_focus(paned.id());
    ui.dispatch_key(window, keyval::RIGHT, CTRL);
    assert_eq!(paned.position(&ui), 240);
}

#[test]
fn test_oversized_steps_clamp_to_bounds() {
    let config = KeyloomConfig {
        paned: PanedConfig {
            single_step: i32::MAX,
            page_step: i32::MAX,
        },
        ..KeyloomConfig::default()
    };
    let mut ui = Ui::with_config(&config);
    let window = ui.create_window("main");
    let (paned, _, _) = split(&mut ui, window, "split");
    ui.grab_focus(paned.id());

    move_handle(&mut ui, paned, ScrollType::PageRight, 1);
    assert_eq!(paned.position(&ui), 400);
    assert!(ui.dispatch_key(window, keyval::LEFT, CTRL));
    assert_eq!(paned.position(&ui), 0);
    move_handle(&mut ui, paned, ScrollType::StepLeft, 1);
    assert_eq!(paned.position(&ui), 0);

    ui.set_text_direction(TextDirection::Rtl);
    move_handle(&mut ui, paned, ScrollType::PageLeft, 1);
    assert_eq!(paned.position(&ui), 400);
}

#[test]
fn test_configured_unbind_overrides_defaults() {
    let config = KeyloomConfig::from_toml_str(
        r#"
[[set]]
name = "user-paned"
priority = "application"
classes = ["Paned"]
bindings = ['unbind "F6"', 'bind "<Control>Return" { accept-position () }']
"#,
    )
    .unwrap();
    let mut ui = Ui::new();
    assert!(ui.apply_config(&config).is_empty());
    let window = ui.create_window("main");
    let (paned, left, _) = split(&mut ui, window, "split");

    ui.grab_focus(left);
    assert!(ui.dispatch_key(window, keyval::F6, 0));
    assert_eq!(ui.focus_widget(window), Some(left));

    ui.grab_focus(paned.id());
    assert!(ui.dispatch_key(window, keyval::RETURN, CTRL));
    assert_eq!(ui.focus_widget(window), Some(left));
}

#[test]
fn test_position_changed_reports_keyboard_moves() {
    let (mut ui, window, paned, _, _) = setup();
    let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    paned
        .state(&ui)
        .unwrap()
        .position_changed()
        .connect(move |pos| seen_clone.lock().push(*pos));

    ui.grab_focus(paned.id());
    ui.dispatch_key(window, keyval::LEFT, 0);
    ui.dispatch_key(window, keyval::HOME, 0);
    ui.dispatch_key(window, keyval::HOME, 0);
    assert_eq!(*seen.lock(), vec![199, 0]);
}
