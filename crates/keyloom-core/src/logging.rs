//! Logging and debugging facilities for Keyloom.
//!
//! Keyloom uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("keyloom::bindings=debug,keyloom::paned=trace")
//!     .init();
//! ```
//!
//! Use [`ObjectTreeDebug`] to render the widget hierarchy while debugging
//! focus problems:
//!
//! ```ignore
//! let debug = ObjectTreeDebug::new(&objects, &classes);
//! println!("{debug}");
//! ```

use std::fmt::{self, Write as FmtWrite};

use crate::class::ClassRegistry;
use crate::object::{ObjectId, ObjectRegistry};

/// Span names used throughout Keyloom for tracing.
pub mod span_names {
    /// Key activation span.
    pub const ACTIVATE: &str = "keyloom::activate";
    /// Action signal emission span.
    pub const EMIT: &str = "keyloom::emit";
    /// Focus transfer span.
    pub const FOCUS: &str = "keyloom::focus";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Object model target.
    pub const OBJECT: &str = "keyloom_core::object";
    /// Class registry target.
    pub const CLASS: &str = "keyloom_core::class";
    /// Observer signal target.
    pub const SIGNAL: &str = "keyloom_core::signal";
    /// Binding engine target.
    pub const BINDINGS: &str = "keyloom::bindings";
    /// Binding grammar target.
    pub const GRAMMAR: &str = "keyloom::bindings::grammar";
    /// Binding configuration loader target.
    pub const CONFIG: &str = "keyloom::bindings::config";
    /// Focus management target.
    pub const FOCUS: &str = "keyloom::focus";
    /// Paned navigator target.
    pub const PANED: &str = "keyloom::paned";
}

/// Style options for object tree visualization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact dash-prefixed lines.
    Compact,
}

/// Configuration for object tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    pub style: TreeStyle,
    pub show_ids: bool,
    pub show_classes: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_classes: true,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Names only.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            show_classes: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing object trees.
#[derive(Clone)]
pub struct ObjectTreeDebug<'a> {
    objects: &'a ObjectRegistry,
    classes: &'a ClassRegistry,
    options: TreeFormatOptions,
}

impl<'a> ObjectTreeDebug<'a> {
    /// Create a new debug visualizer with default options.
    pub fn new(objects: &'a ObjectRegistry, classes: &'a ClassRegistry) -> Self {
        Self::with_options(objects, classes, TreeFormatOptions::default())
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(
        objects: &'a ObjectRegistry,
        classes: &'a ClassRegistry,
        options: TreeFormatOptions,
    ) -> Self {
        Self {
            objects,
            classes,
            options,
        }
    }

    /// Format every root object and its subtree.
    pub fn format_all(&self) -> String {
        let roots = self.objects.root_objects();
        let mut output = String::new();
        let _ = writeln!(output, "Object Tree ({} total objects):", self.objects.len());
        if roots.is_empty() {
            let _ = writeln!(output, "  (empty)");
        }
        for root in roots {
            self.format_subtree_into(root, 0, true, &mut output);
        }
        output
    }

    /// Format the subtree rooted at `root`.
    pub fn format_subtree(&self, root: ObjectId) -> String {
        let mut output = String::new();
        self.format_subtree_into(root, 0, true, &mut output);
        output
    }

    fn format_subtree_into(&self, id: ObjectId, depth: usize, is_last: bool, output: &mut String) {
        if self.options.max_depth.is_some_and(|max| depth > max) {
            return;
        }
        let Ok(name) = self.objects.name(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        output.push_str(if name.is_empty() { "(unnamed)" } else { name });

        if self.options.show_ids {
            let _ = write!(output, " [{id:?}]");
        }
        if self.options.show_classes
            && let Ok(class) = self.objects.class_of(id)
        {
            let _ = write!(output, " ({})", self.classes.name(class));
        }
        output.push('\n');

        let children = self.objects.children(id).unwrap_or(&[]);
        let count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(child, depth + 1, i + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, tee, corner) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            prefix.extend(std::iter::repeat_n(' ', self.options.indent_size));
        }
        prefix.push_str(if is_last { corner } else { tee });
        prefix
    }
}

impl fmt::Display for ObjectTreeDebug<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ObjectRegistry, ClassRegistry, ObjectId) {
        let mut classes = ClassRegistry::new();
        let window = classes.register("Window", classes.object_class()).unwrap();
        let button = classes.register("Button", classes.object_class()).unwrap();
        let mut objects = ObjectRegistry::new();
        let root = objects.create(window, "window");
        let b1 = objects.create(button, "button1");
        let b2 = objects.create(button, "");
        objects.set_parent(b1, Some(root)).unwrap();
        objects.set_parent(b2, Some(root)).unwrap();
        (objects, classes, root)
    }

    #[test]
    fn test_tree_format_empty() {
        let objects = ObjectRegistry::new();
        let classes = ClassRegistry::new();
        let output = ObjectTreeDebug::new(&objects, &classes).format_all();
        assert!(output.contains("Object Tree"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (objects, classes, root) = setup();
        let output = ObjectTreeDebug::new(&objects, &classes).format_subtree(root);

        assert!(output.contains("window"));
        assert!(output.contains("button1 ["));
        assert!(output.contains("(Button)"));
        assert!(output.contains("(unnamed)"));
    }

    #[test]
    fn test_tree_format_minimal() {
        let (objects, classes, root) = setup();
        let debug = ObjectTreeDebug::with_options(&objects, &classes, TreeFormatOptions::minimal());
        let output = debug.format_subtree(root);

        assert!(output.contains("button1"));
        assert!(!output.contains("Button"));
        assert!(!output.contains('['));
    }

    #[test]
    fn test_tree_max_depth() {
        let (objects, classes, root) = setup();
        let options = TreeFormatOptions {
            max_depth: Some(0),
            ..TreeFormatOptions::minimal()
        };
        let output = ObjectTreeDebug::with_options(&objects, &classes, options).format_subtree(root);
        assert_eq!(output, "window\n");
    }
}
