//! Binding sets and the entries they own.
//!
//! A [`BindingSet`] keeps its entries in insertion order alongside a
//! `KeySpec -> entry` index. Each key appears at most once among a set's
//! live entries.
//!
//! Entries that are removed while one of their signals is being emitted are
//! not freed immediately. They are taken out of the index (so lookups stop
//! seeing them) and marked doomed; the activation that is emitting them frees
//! them once its outermost emission returns.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use super::arg::{Arg, SignalSpec};
use super::keys::KeySpec;

new_key_type! {
    /// Identifier of an entry within its binding set.
    pub struct EntryId;
}

/// Priority of a binding set.
///
/// Candidates for a key are tried from the highest priority down. The order
/// is total: `Lowest < Toolkit < Theme < Application < Rc < Highest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingPriority {
    Lowest,
    /// Default bindings installed by widget classes.
    #[default]
    #[serde(alias = "gtk")]
    Toolkit,
    /// Bindings supplied by a theme.
    Theme,
    /// Bindings installed by the application.
    Application,
    /// Bindings loaded from user resource files.
    Rc,
    Highest,
}

impl BindingPriority {
    pub const ALL: [Self; 6] = [
        Self::Lowest,
        Self::Toolkit,
        Self::Theme,
        Self::Application,
        Self::Rc,
        Self::Highest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Toolkit => "toolkit",
            Self::Theme => "theme",
            Self::Application => "application",
            Self::Rc => "rc",
            Self::Highest => "highest",
        }
    }
}

impl fmt::Display for BindingPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingPriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower == "gtk" {
            return Ok(Self::Toolkit);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == lower)
            .ok_or_else(|| s.to_string())
    }
}

/// Emission state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Not being emitted.
    Live,
    /// Being emitted `depth` times (re-entrant activations nest).
    EmittingLive { depth: u32 },
    /// Removed while being emitted; freed when `depth` reaches zero.
    EmittingDoomed { depth: u32 },
}

/// One key and the signals it emits.
#[derive(Debug, Clone)]
pub struct BindingEntry {
    key: KeySpec,
    signals: Vec<SignalSpec>,
    marks_unbound: bool,
    state: EntryState,
}

impl BindingEntry {
    fn new(key: KeySpec) -> Self {
        Self {
            key,
            signals: Vec::new(),
            marks_unbound: false,
            state: EntryState::Live,
        }
    }

    pub fn key(&self) -> KeySpec {
        self.key
    }

    /// Signals emitted in order when the entry is activated.
    pub fn signals(&self) -> &[SignalSpec] {
        &self.signals
    }

    /// Whether this entry is a skip marker.
    pub fn marks_unbound(&self) -> bool {
        self.marks_unbound
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn in_emission(&self) -> bool {
        !matches!(self.state, EntryState::Live)
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, EntryState::EmittingDoomed { .. })
    }

    /// Append a signal, lifting a skip marker.
    pub fn push_signal(&mut self, signal: SignalSpec) {
        self.marks_unbound = false;
        self.signals.push(signal);
    }
}

impl fmt::Display for BindingEntry {
    /// Formats the entry as a `bind`/`unbind` statement.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.marks_unbound {
            return write!(f, "unbind \"{}\"", self.key);
        }
        write!(f, "bind \"{}\" {{", self.key)?;
        for signal in &self.signals {
            write!(f, " {signal}")?;
        }
        f.write_str(" }")
    }
}

/// What activating an entry should do, captured when its emission begins.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// The entry is a skip marker; the key is consumed without emitting.
    Skip,
    /// Emit these signals in order.
    Signals(Vec<SignalSpec>),
}

/// A named, prioritized collection of key bindings.
#[derive(Debug)]
pub struct BindingSet {
    name: String,
    priority: BindingPriority,
    entries: SlotMap<EntryId, BindingEntry>,
    order: Vec<EntryId>,
    index: HashMap<KeySpec, EntryId>,
    parsed_from_stylesheet: bool,
}

impl BindingSet {
    pub(crate) fn new(name: impl Into<String>, priority: BindingPriority) -> Self {
        Self {
            name: name.into(),
            priority,
            entries: SlotMap::with_key(),
            order: Vec::new(),
            index: HashMap::new(),
            parsed_from_stylesheet: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> BindingPriority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: BindingPriority) {
        self.priority = priority;
    }

    /// Whether the set was loaded from a binding configuration source.
    pub fn parsed_from_stylesheet(&self) -> bool {
        self.parsed_from_stylesheet
    }

    pub fn set_parsed_from_stylesheet(&mut self, parsed: bool) {
        self.parsed_from_stylesheet = parsed;
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Live entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &BindingEntry> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(*id))
            .filter(|e| !e.is_destroyed())
    }

    /// The live entry for `key`.
    pub fn lookup(&self, key: &KeySpec) -> Option<EntryId> {
        self.index.get(key).copied()
    }

    /// Look at an entry by id, including a doomed one still being emitted.
    pub fn entry(&self, id: EntryId) -> Option<&BindingEntry> {
        self.entries.get(id)
    }

    /// The live entry for `key`, by reference.
    pub fn entry_for(&self, key: &KeySpec) -> Option<&BindingEntry> {
        self.lookup(key).and_then(|id| self.entries.get(id))
    }

    fn insert(&mut self, key: KeySpec) -> EntryId {
        let id = self.entries.insert(BindingEntry::new(key));
        self.order.push(id);
        self.index.insert(key, id);
        id
    }

    /// Return the entry for `key`, appending a new one if needed.
    ///
    /// Any skip marker on an existing entry is cleared.
    pub fn get_or_create(&mut self, key: KeySpec) -> &mut BindingEntry {
        let id = match self.lookup(&key) {
            Some(id) => id,
            None => self.insert(key),
        };
        let entry = &mut self.entries[id];
        entry.marks_unbound = false;
        entry
    }

    /// Append a signal to the entry for `key`.
    pub fn add_signal(&mut self, key: KeySpec, signal: impl Into<SignalSpec>) {
        let signal = signal.into();
        tracing::trace!(target: "keyloom::bindings", set = %self.name, %key, signal = signal.signal_name(), "added binding signal");
        self.get_or_create(key).push_signal(signal);
    }

    /// Append a signal built from a name and an argument slice.
    pub fn add_signal_spec(&mut self, key: KeySpec, signal_name: &str, args: &[Arg]) {
        self.add_signal(key, SignalSpec::new(signal_name, args.to_vec()));
    }

    /// Install a skip marker for `key`.
    ///
    /// A key that is already a skip marker is left untouched.
    pub fn mark_unbound(&mut self, key: KeySpec) {
        if self.entry_for(&key).is_some_and(|e| e.marks_unbound) {
            return;
        }
        let id = self.clear_internal(key);
        self.entries[id].marks_unbound = true;
        tracing::trace!(target: "keyloom::bindings", set = %self.name, %key, "marked key unbound");
    }

    /// Replace any entry for `key` with an empty live entry.
    pub fn reset(&mut self, key: KeySpec) {
        self.clear_internal(key);
    }

    /// Ensure the entry for `key` exists with no signals, reusing it unless
    /// it is being emitted.
    fn clear_internal(&mut self, key: KeySpec) -> EntryId {
        match self.lookup(&key) {
            Some(id) if !self.entries[id].in_emission() => {
                let entry = &mut self.entries[id];
                entry.signals.clear();
                entry.marks_unbound = false;
                id
            }
            Some(_) => {
                self.remove(&key);
                self.insert(key)
            }
            None => self.insert(key),
        }
    }

    /// Remove the entry for `key`.
    ///
    /// An entry that is being emitted is unlinked from lookup now and freed
    /// when its emission completes. Returns `false` if there was no entry.
    pub fn remove(&mut self, key: &KeySpec) -> bool {
        let Some(id) = self.index.remove(key) else {
            return false;
        };
        match self.entries[id].state {
            EntryState::Live => self.free(id),
            EntryState::EmittingLive { depth } => {
                tracing::trace!(target: "keyloom::bindings", set = %self.name, %key, depth, "deferring removal of emitting entry");
                self.entries[id].state = EntryState::EmittingDoomed { depth };
            }
            EntryState::EmittingDoomed { .. } => {}
        }
        true
    }

    /// Remove every entry, deferring those being emitted.
    pub(crate) fn clear(&mut self) {
        let keys: Vec<KeySpec> = self.index.keys().copied().collect();
        for key in keys {
            self.remove(&key);
        }
    }

    fn free(&mut self, id: EntryId) {
        self.entries.remove(id);
        self.order.retain(|&e| e != id);
    }

    /// Mark the start of an emission of entry `id`.
    ///
    /// Returns what the activation should do, or `None` if the entry no
    /// longer exists or is doomed.
    pub fn begin_emission(&mut self, id: EntryId) -> Option<Emission> {
        let entry = self.entries.get_mut(id)?;
        entry.state = match entry.state {
            EntryState::Live => EntryState::EmittingLive { depth: 1 },
            EntryState::EmittingLive { depth } => EntryState::EmittingLive { depth: depth + 1 },
            EntryState::EmittingDoomed { .. } => return None,
        };
        if entry.marks_unbound {
            Some(Emission::Skip)
        } else {
            Some(Emission::Signals(entry.signals.clone()))
        }
    }

    /// Whether entry `id` has been removed (or freed) since lookup.
    pub fn is_doomed(&self, id: EntryId) -> bool {
        self.entries.get(id).is_none_or(|e| e.is_destroyed())
    }

    /// Mark the end of an emission, freeing the entry if it was removed
    /// meanwhile and this was the outermost emission.
    pub fn end_emission(&mut self, id: EntryId) {
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };
        match entry.state {
            EntryState::Live => {}
            EntryState::EmittingLive { depth } => {
                entry.state = if depth > 1 {
                    EntryState::EmittingLive { depth: depth - 1 }
                } else {
                    EntryState::Live
                };
            }
            EntryState::EmittingDoomed { depth } => {
                if depth > 1 {
                    entry.state = EntryState::EmittingDoomed { depth: depth - 1 };
                } else {
                    tracing::trace!(target: "keyloom::bindings", set = %self.name, key = %entry.key, "freeing doomed entry");
                    self.free(id);
                }
            }
        }
    }

    /// Physical slot count, including doomed entries awaiting release.
    pub fn allocated_entries(&self) -> usize {
        self.entries.len()
    }
}
