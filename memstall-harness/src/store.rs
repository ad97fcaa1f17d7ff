use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Opaque heap object whose reachability bounds the lifetime of its
/// ephemeral companion. The payload is its creation sequence number.
pub struct Anchor(#[allow(dead_code)] u64);

/// Identity key for an anchor: its heap address. Addresses identify anchors
/// only while they are alive; the registry retains every anchor for the
/// run's duration, so ids never alias within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(usize);

impl AnchorId {
    fn of(anchor: &Rc<Anchor>) -> Self {
        Self(Rc::as_ptr(anchor) as usize)
    }
}

/// Durability-owning collection: keeps anchors reachable for the run.
#[derive(Default)]
pub struct AnchorRegistry {
    anchors: Vec<Rc<Anchor>>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, anchor: Rc<Anchor>) {
        self.anchors.push(anchor);
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

struct EphemeralEntry {
    anchor: Weak<Anchor>,
    _companion: Box<[u64; 4]>,
}

/// Identity-keyed association from live anchors to heap companions.
///
/// The store holds each anchor weakly: an association never keeps its
/// anchor alive on its own, and the companion dies with the anchor.
/// Insertion only during a run; the map exists to be walked and rehashed
/// with cost proportional to its entry count.
#[derive(Default)]
pub struct EphemeralStore {
    entries: HashMap<AnchorId, EphemeralEntry>,
    created: u64,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `n` fresh anchors, hand ownership of each to `registry`, and
    /// associate each with a freshly allocated companion.
    pub fn grow(&mut self, registry: &mut AnchorRegistry, n: usize) {
        for _ in 0..n {
            self.created += 1;
            let anchor = Rc::new(Anchor(self.created));
            let entry = EphemeralEntry {
                anchor: Rc::downgrade(&anchor),
                _companion: Box::new([0u64; 4]),
            };
            self.entries.insert(AnchorId::of(&anchor), entry);
            registry.register(anchor);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every association whose anchor is no longer alive, returning
    /// the number reclaimed. The stress loop never calls this; it exists to
    /// make the lifetime contract observable.
    pub fn sweep(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.anchor.strong_count() > 0);
        before - self.entries.len()
    }
}
