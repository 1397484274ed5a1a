//! The activation pipeline: from a key on a target to action emissions.

use keyloom_core::ObjectId;

use super::dispatch::{self, SignalHost};
use super::engine::BindingEngine;
use super::entry::{BindingPriority, Emission, EntryId};
use super::keys::KeySpec;
use super::registry::BindingSetId;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    set: BindingSetId,
    entry: EntryId,
    priority: BindingPriority,
}

impl BindingEngine {
    /// Activate `key` on `target`.
    ///
    /// Every set attached to the target's class chain is asked for an entry
    /// matching the key. Candidates are tried from the highest priority down,
    /// most-derived class first within a priority and attach order within a
    /// class. The first candidate that consumes the key stops the walk; a
    /// skip marker consumes it without emitting anything.
    ///
    /// Returns whether the key was consumed.
    #[tracing::instrument(skip(self, host), target = "keyloom::bindings", level = "trace", fields(key = %key))]
    pub fn activate_event<H: SignalHost + ?Sized>(
        &self,
        host: &mut H,
        target: ObjectId,
        key: &KeySpec,
    ) -> bool {
        let chain = host.class_chain(target);
        let mut candidates: Vec<Candidate> = self.with(|reg| {
            reg.by_class(&chain)
                .into_iter()
                .filter_map(|set_id| {
                    let set = reg.get(set_id)?;
                    set.lookup(key).map(|entry| Candidate {
                        set: set_id,
                        entry,
                        priority: set.priority(),
                    })
                })
                .collect()
        });
        // Stable, so ties keep class-chain then attach order.
        candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

        for candidate in candidates {
            if self.activate_entry(host, target, candidate, key) {
                tracing::debug!(target: "keyloom::bindings", %key, ?target, priority = %candidate.priority, "key consumed");
                return true;
            }
        }
        false
    }

    /// Canonicalize raw event state and [`activate_event`](Self::activate_event).
    pub fn activate<H: SignalHost + ?Sized>(
        &self,
        host: &mut H,
        target: ObjectId,
        keyval: u32,
        raw_modifiers: u32,
    ) -> bool {
        self.activate_event(host, target, &KeySpec::from_raw(keyval, raw_modifiers))
    }

    /// Activate `key` from a single set, regardless of class attachment.
    pub fn activate_set<H: SignalHost + ?Sized>(
        &self,
        host: &mut H,
        set: BindingSetId,
        target: ObjectId,
        key: &KeySpec,
    ) -> bool {
        let candidate = self.with(|reg| {
            let s = reg.get(set)?;
            s.lookup(key).map(|entry| Candidate {
                set,
                entry,
                priority: s.priority(),
            })
        });
        candidate.is_some_and(|c| self.activate_entry(host, target, c, key))
    }

    fn activate_entry<H: SignalHost + ?Sized>(
        &self,
        host: &mut H,
        target: ObjectId,
        candidate: Candidate,
        key: &KeySpec,
    ) -> bool {
        let Candidate { set, entry, .. } = candidate;
        let Some((set_name, emission)) = self.with(|reg| {
            let s = reg.get_mut(set)?;
            let emission = s.begin_emission(entry)?;
            Some((s.name().to_string(), emission))
        }) else {
            return false;
        };

        let handled = match emission {
            Emission::Skip => {
                tracing::trace!(target: "keyloom::bindings", set = %set_name, %key, "skip marker consumed key");
                true
            }
            Emission::Signals(signals) => {
                let mut handled = false;
                for spec in &signals {
                    match dispatch::emit(host, target, spec) {
                        Ok(result) => handled |= result,
                        Err(err) => {
                            tracing::warn!(
                                target: "keyloom::bindings",
                                set = %set_name,
                                %key,
                                signal = spec.signal_name(),
                                reason = %err,
                                "binding signal not emitted"
                            );
                        }
                    }
                    if self.with(|reg| reg.get(set).is_none_or(|s| s.is_doomed(entry))) {
                        break;
                    }
                }
                handled
            }
        };

        self.with(|reg| reg.end_emission(set, entry));
        handled
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use keyloom_core::{ClassId, ClassRegistry, ObjectRegistry, ParamType, SignalSignature, Value};

    use super::*;
    use crate::bindings::arg::SignalSpec;
    use crate::bindings::keys::{keyval, ModifierType};

    type Handler = Box<dyn FnMut(&[Value]) -> bool>;

    struct MockHost {
        classes: ClassRegistry,
        objects: ObjectRegistry,
        handlers: HashMap<String, Handler>,
        log: Vec<String>,
    }

    impl SignalHost for MockHost {
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

        fn emit_signal(&mut self, _target: ObjectId, name: &str, args: &[Value]) -> bool {
            self.log.push(name.to_string());
            match self.handlers.get_mut(name) {
                Some(handler) => handler(args),
                None => true,
            }
        }
    }

    fn setup() -> (MockHost, ClassId, ObjectId) {
        let mut classes = ClassRegistry::new();
        let class = classes.register("Thing", classes.object_class()).unwrap();
        for name in ["foo", "bar", "baz"] {
            classes.add_signal(class, SignalSignature::action(name)).unwrap();
        }
        classes
            .add_signal(class, SignalSignature::action("maybe").returns_bool())
            .unwrap();
        classes
            .add_signal(class, SignalSignature::action("scroll").param(ParamType::Int))
            .unwrap();
        classes.add_signal(class, SignalSignature::new("changed")).unwrap();
        let mut objects = ObjectRegistry::new();
        let target = objects.create(class, "thing");
        let host = MockHost {
            classes,
            objects,
            handlers: HashMap::new(),
            log: Vec::new(),
        };
        (host, class, target)
    }

    fn f1() -> KeySpec {
        KeySpec::new(keyval::F1, ModifierType::empty())
    }

    #[test]
    fn test_no_binding_not_consumed() {
        let (mut host, _, target) = setup();
        let engine = BindingEngine::new();
        assert!(!engine.activate_event(&mut host, target, &f1()));
    }

    #[test]
    fn test_signals_fire_in_order() {
        let (mut host, class, target) = setup();
        let engine = BindingEngine::new();
        let set = engine.new_set("s", BindingPriority::Application);
        engine.attach(class, set);
        engine.add_signal(set, f1(), SignalSpec::new("foo", vec![]));
        engine.add_signal(set, f1(), SignalSpec::new("bar", vec![]));
        engine.add_signal(set, f1(), SignalSpec::new("foo", vec![]));

        assert!(engine.activate(&mut host, target, keyval::F1, 0));
        assert_eq!(host.log, vec!["foo", "bar", "foo"]);
    }

    #[test]
    fn test_bad_entry_falls_through_to_lower_priority() {
        let (mut host, class, target) = setup();
        let engine = BindingEngine::new();
        let high = engine.new_set("high", BindingPriority::Highest);
        let low = engine.new_set("low", BindingPriority::Lowest);
        engine.attach(class, high);
        engine.attach(class, low);
        engine.add_signal(high, f1(), SignalSpec::builder("scroll").string("x"));
        engine.add_signal(low, f1(), SignalSpec::new("bar", vec![]));

        assert!(engine.activate_event(&mut host, target, &f1()));
        assert_eq!(host.log, vec!["bar"]);
    }

    #[test]
    fn test_dispatch_errors_are_not_fatal() {
        let (mut host, class, target) = setup();
        let engine = BindingEngine::new();
        let set = engine.new_set("s", BindingPriority::Application);
        engine.attach(class, set);
        engine.add_signal(set, f1(), SignalSpec::new("missing", vec![]));
        engine.add_signal(set, f1(), SignalSpec::new("changed", vec![]));
        engine.add_signal(set, f1(), SignalSpec::builder("scroll").int(1).int(2));

        assert!(!engine.activate_event(&mut host, target, &f1()));
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_bool_handler_false_is_not_consumed() {
        let (mut host, class, target) = setup();
        host.handlers.insert("maybe".into(), Box::new(|_| false));
        let engine = BindingEngine::new();
        let high = engine.new_set("high", BindingPriority::Application);
        let low = engine.new_set("low", BindingPriority::Toolkit);
        engine.attach(class, high);
        engine.attach(class, low);
        engine.add_signal(high, f1(), SignalSpec::new("maybe", vec![]));
        engine.add_signal(low, f1(), SignalSpec::new("foo", vec![]));

        assert!(engine.activate_event(&mut host, target, &f1()));
        assert_eq!(host.log, vec!["maybe", "foo"]);
    }

    #[test]
    fn test_argument_coercion_reaches_handler() {
        let (mut host, class, target) = setup();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        host.handlers.insert(
            "scroll".into(),
            Box::new(move |args| {
                seen_clone.lock().extend_from_slice(args);
                true
            }),
        );
        let engine = BindingEngine::new();
        let set = engine.set_for_class(&host.classes, class);
        engine.add_signal(set, f1(), SignalSpec::builder("scroll").int(-4));

        assert!(engine.activate_event(&mut host, target, &f1()));
        assert_eq!(*seen.lock(), vec![Value::Int(-4)]);
    }

    #[test]
    fn test_release_bindings_match_only_release() {
        let (mut host, class, target) = setup();
        let engine = BindingEngine::new();
        let set = engine.new_set("s", BindingPriority::Application);
        engine.attach(class, set);
        engine.add_signal(
            set,
            KeySpec::new(keyval::F1, ModifierType::RELEASE),
            SignalSpec::new("foo", vec![]),
        );

        assert!(!engine.activate(&mut host, target, keyval::F1, 0));
        assert!(engine.activate(&mut host, target, keyval::F1, ModifierType::RELEASE.bits()));
    }

    #[test]
    fn test_activate_set_ignores_attachment() {
        let (mut host, _, target) = setup();
        let engine = BindingEngine::new();
        let set = engine.new_set("loose", BindingPriority::Application);
        engine.add_signal(set, f1(), SignalSpec::new("baz", vec![]));

        assert!(!engine.activate_event(&mut host, target, &f1()));
        assert!(engine.activate_set(&mut host, set, target, &f1()));
        assert_eq!(host.log, vec!["baz"]);
    }
}
