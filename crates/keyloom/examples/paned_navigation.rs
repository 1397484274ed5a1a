//! Drive the paned keyboard navigator from a scripted key sequence.
//!
//! Run with `RUST_LOG=keyloom=debug` to watch focus and divider changes.

use keyloom::bindings::{keyval, ModifierType};
use keyloom::widget::{Orientation, Ui};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut ui = Ui::new();
    let window = ui.create_window("main");
    let outer = ui.create_paned(window, Orientation::Horizontal, "outer")?;
    let sidebar = ui.create_widget(outer.id(), "sidebar")?;
    let inner = ui.create_paned(outer.id(), Orientation::Vertical, "inner")?;
    ui.create_widget(inner.id(), "editor")?;
    ui.create_widget(inner.id(), "terminal")?;
    outer.allocate(&mut ui, 800);
    inner.allocate(&mut ui, 600);

    outer
        .state(&ui)
        .ok_or("outer paned has no state")?
        .position_changed()
        .connect(|pos| println!("  outer divider -> {pos}"));

    ui.grab_focus(sidebar);
    let script = [
        ("F6", keyval::F6, ModifierType::empty()),
        ("F6", keyval::F6, ModifierType::empty()),
        ("F8", keyval::F8, ModifierType::empty()),
        ("F8", keyval::F8, ModifierType::empty()),
        ("Ctrl+Right", keyval::RIGHT, ModifierType::CONTROL),
        ("Right", keyval::RIGHT, ModifierType::empty()),
        ("Return", keyval::RETURN, ModifierType::empty()),
    ];
    for (label, key, modifiers) in script {
        let consumed = ui.dispatch_key(window, key, modifiers.bits());
        let focus = ui
            .focus_widget(window)
            .map(|id| ui.objects().name(id).unwrap_or("?").to_string());
        println!("{label:<12} consumed={consumed:<5} focus={focus:?}");
    }

    println!("\n{}", ui.format_tree());
    Ok(())
}
