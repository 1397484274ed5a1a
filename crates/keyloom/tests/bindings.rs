//! Binding activation through a real widget host.

use std::sync::Arc;

use keyloom::bindings::{keyval, BindingPriority, BindingSetId, KeySpec, ModifierType, SignalSpec};
use keyloom::widget::Ui;
use keyloom_core::{ClassId, ObjectId, SignalSignature};
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Fixture {
    ui: Ui,
    window: ObjectId,
    console: ClassId,
    terminal: ClassId,
    target: ObjectId,
    log: Log,
}

/// A `Console` widget class with `foo`/`bar`/`baz` actions, a derived
/// `Terminal` class, and one focused terminal in a window.
fn setup() -> Fixture {
    let mut ui = Ui::new();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let widget = ui.builtin_classes().widget;
    let console = ui.register_class("Console", widget).unwrap();
    let terminal = ui.register_class("Terminal", console).unwrap();
    for name in ["foo", "bar", "baz"] {
        let log = log.clone();
        ui.add_action(console, SignalSignature::action(name), move |_, _, _| {
            log.lock().push(name);
            true
        })
        .unwrap();
    }

    let window = ui.create_window("main");
    let target = ui.create(terminal, Some(window), "term").unwrap();
    ui.set_can_focus(target, true).unwrap();
    assert!(ui.grab_focus(target));

    Fixture {
        ui,
        window,
        console,
        terminal,
        target,
        log,
    }
}

fn f1() -> KeySpec {
    KeySpec::new(keyval::F1, ModifierType::empty())
}

fn attached_set(ui: &Ui, class: ClassId, name: &str, priority: BindingPriority) -> BindingSetId {
    let set = ui.bindings().new_set(name, priority);
    assert!(ui.bindings().attach(class, set));
    set
}

#[test]
fn test_higher_priority_set_wins() {
    let mut f = setup();
    let a = attached_set(&f.ui, f.console, "a", BindingPriority::Application);
    let b = attached_set(&f.ui, f.console, "b", BindingPriority::Toolkit);
    f.ui.bindings().add_signal(a, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().add_signal(b, f1(), SignalSpec::new("bar", vec![]));

    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert_eq!(*f.log.lock(), vec!["foo"]);
}

#[test]
fn test_skip_marker_suppresses_lower_priority() {
    let mut f = setup();
    let a = attached_set(&f.ui, f.console, "a", BindingPriority::Theme);
    let b = attached_set(&f.ui, f.console, "b", BindingPriority::Application);
    f.ui.bindings().add_signal(a, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().mark_unbound(b, f1());

    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert!(f.log.lock().is_empty());
}

#[test]
fn test_equal_priority_prefers_derived_class() {
    let mut f = setup();
    let base = attached_set(&f.ui, f.console, "console-keys", BindingPriority::Application);
    let derived = attached_set(&f.ui, f.terminal, "terminal-keys", BindingPriority::Application);
    f.ui.bindings().add_signal(base, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().add_signal(derived, f1(), SignalSpec::new("bar", vec![]));

    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert_eq!(*f.log.lock(), vec!["bar"]);
}

#[test]
fn test_highest_priority_across_class_chain() {
    let mut f = setup();
    let derived = attached_set(&f.ui, f.terminal, "terminal", BindingPriority::Theme);
    let base = attached_set(&f.ui, f.console, "console", BindingPriority::Highest);
    let object = f.ui.classes().object_class();
    let root = attached_set(&f.ui, object, "root", BindingPriority::Rc);
    f.ui.bindings().add_signal(derived, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().add_signal(base, f1(), SignalSpec::new("bar", vec![]));
    f.ui.bindings().add_signal(root, f1(), SignalSpec::new("baz", vec![]));

    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert_eq!(*f.log.lock(), vec!["bar"]);
}

#[test]
fn test_duplicate_signal_fires_twice_and_unbind_is_idempotent() {
    let mut f = setup();
    let set = attached_set(&f.ui, f.console, "s", BindingPriority::Application);
    f.ui.bindings().add_signal(set, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().add_signal(set, f1(), SignalSpec::new("foo", vec![]));
    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert_eq!(*f.log.lock(), vec!["foo", "foo"]);

    f.ui.bindings().mark_unbound(set, f1());
    f.ui.bindings().mark_unbound(set, f1());
    let entries = f.ui.bindings().with_set(set, |s| {
        let entry = s.entry_for(&f1()).unwrap();
        (s.len(), entry.marks_unbound(), entry.signals().len())
    });
    assert_eq!(entries, Some((1, true, 0)));
}

#[test]
fn test_entry_removed_by_its_own_handler() {
    let mut f = setup();
    let set = attached_set(&f.ui, f.console, "s", BindingPriority::Application);
    let remover = f.ui.builtin_classes().widget;
    f.ui.add_action(remover, SignalSignature::action("forget"), move |ui, _, _| {
        assert!(ui.bindings().remove(set, &f1()));
        true
    })
    .unwrap();
    f.ui.bindings().add_signal(set, f1(), SignalSpec::new("foo", vec![]));
    f.ui.bindings().add_signal(set, f1(), SignalSpec::new("forget", vec![]));
    f.ui.bindings().add_signal(set, f1(), SignalSpec::new("bar", vec![]));

    assert!(f.ui.dispatch_key(f.window, keyval::F1, 0));
    assert_eq!(*f.log.lock(), vec!["foo"]);

    let allocated = f.ui.bindings().with_set(set, |s| (s.len(), s.allocated_entries()));
    assert_eq!(allocated, Some((0, 0)));
    assert!(!f.ui.dispatch_key(f.window, keyval::F1, 0));
}

#[test]
fn test_parsed_binding_reaches_handler() {
    let mut f = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    f.ui.add_action(
        f.terminal,
        SignalSignature::action("scroll-lines").param(keyloom_core::ParamType::Int),
        move |_, _, args| {
            seen_clone.lock().extend_from_slice(args);
            true
        },
    )
    .unwrap();
    let set = f.ui.bindings().set_for_class(f.ui.classes(), f.terminal);
    let key = KeySpec::parse_accelerator("<Control>Down").unwrap();
    f.ui.bindings().add_signal_from_string(set, key, "scroll-lines (3)");

    assert!(f.ui.dispatch_key(f.window, keyval::DOWN, ModifierType::CONTROL.bits()));
    assert_eq!(*seen.lock(), vec![keyloom::Value::Int(3)]);
    assert_eq!(f.ui.focus_widget(f.window), Some(f.target));
}
