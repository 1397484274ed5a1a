//! Observer signals.
//!
//! [`Signal<Args>`] is a typed notification list: widgets expose signals such
//! as `position_changed` or `destroyed`, and observers connect closures to
//! them. Emission is direct and synchronous.
//!
//! Slots are snapshotted before they run and the connection lock is released
//! first, so a slot may connect, disconnect, or emit on the same signal.
//!
//! # Example
//!
//! ```
//! use keyloom_core::Signal;
//!
//! let position_changed = Signal::<i32>::new();
//! let id = position_changed.connect(|pos| println!("divider at {pos}"));
//! position_changed.emit(120);
//! position_changed.disconnect(id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// `Args` is the argument type passed to connected slots. Use `()` for
/// signals with no arguments, or a tuple for several.
pub struct Signal<Args> {
    connections: Mutex<Connections<Args>>,
    blocked: AtomicBool,
}

/// Slots keyed by id. Freed slot-map entries are reused, so each slot also
/// carries a sequence number that fixes its place in emission order.
struct Connections<Args> {
    slots: SlotMap<ConnectionId, (u64, Slot<Args>)>,
    next_seq: u64,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .field("blocked", &self.is_blocked())
            .finish()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                next_seq: 0,
            }),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let slot: Slot<Args> = Arc::new(slot);
        let mut connections = self.connections.lock();
        let seq = connections.next_seq;
        connections.next_seq += 1;
        connections.slots.insert((seq, slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().slots.remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().slots.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(skip_all, target = "keyloom_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: "keyloom_core::signal", "signal blocked, skipping emit");
            return;
        }

        let mut ordered: Vec<(u64, Slot<Args>)> = self.connections.lock().slots.values().cloned().collect();
        ordered.sort_unstable_by_key(|(seq, _)| *seq);
        let slots: Vec<Slot<Args>> = ordered.into_iter().map(|(_, slot)| slot).collect();
        tracing::trace!(target: "keyloom_core::signal", connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<i32>: Send, Sync);
