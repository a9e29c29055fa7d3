use std::collections::VecDeque;

/// Identifies one map instance's enforcement loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(u64);

/// What one enforcement tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not an enforced page; nothing touched.
    Skipped,
    InSync,
    /// The full desired configuration was written back.
    Reapplied,
    /// Drift was found but writing the configuration back failed.
    ApplyFailed,
    /// The map's mount element left the document; the loop should stop.
    Detached,
}

/// Owns the running enforcement loops, bounded by `cap`.
///
/// `H` is the timer handle; dropping it must cancel the loop.
#[derive(Debug)]
pub struct LoopRegistry<H> {
    cap: usize,
    next_id: u64,
    loops: VecDeque<(LoopId, H)>,
}

impl<H> LoopRegistry<H> {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            next_id: 0,
            loops: VecDeque::new(),
        }
    }

    /// Reserve an id before the loop's timer exists, so the tick closure can
    /// refer to its own loop.
    pub fn next_id(&mut self) -> LoopId {
        self.next_id += 1;
        LoopId(self.next_id)
    }

    /// Track a started loop. Returns the handle evicted to stay under the cap,
    /// which the caller drops to cancel it.
    pub fn insert(&mut self, id: LoopId, handle: H) -> Option<(LoopId, H)> {
        let evicted = if self.loops.len() >= self.cap {
            self.loops.pop_front()
        } else {
            None
        };
        if let Some((evicted_id, _)) = evicted.as_ref() {
            tracing::warn!(
                cap = self.cap,
                loop_id = evicted_id.0,
                "enforcement loop cap reached, cancelling the oldest loop"
            );
        }
        self.loops.push_back((id, handle));
        evicted
    }

    pub fn cancel(&mut self, id: LoopId) -> Option<H> {
        let index = self.loops.iter().position(|(loop_id, _)| *loop_id == id)?;
        self.loops.remove(index).map(|(_, handle)| handle)
    }

    pub fn cancel_all(&mut self) -> Vec<H> {
        self.loops.drain(..).map(|(_, handle)| handle).collect()
    }

    pub fn contains(&self, id: LoopId) -> bool {
        self.loops.iter().any(|(loop_id, _)| *loop_id == id)
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let mut registry: LoopRegistry<()> = LoopRegistry::new(4);
        let a = registry.next_id();
        let b = registry.next_id();
        assert_ne!(a, b);
    }

    #[test]
    fn insert_past_cap_evicts_oldest() {
        let mut registry = LoopRegistry::new(2);
        let ids: Vec<_> = (0..3).map(|_| registry.next_id()).collect();
        assert!(registry.insert(ids[0], "first").is_none());
        assert!(registry.insert(ids[1], "second").is_none());
        let evicted = registry.insert(ids[2], "third");
        assert_eq!(evicted, Some((ids[0], "first")));
        assert_eq!(registry.len(), 2);
        assert!(!registry.contains(ids[0]));
        assert!(registry.contains(ids[2]));
    }

    #[test]
    fn cancel_removes_only_the_named_loop() {
        let mut registry = LoopRegistry::new(8);
        let a = registry.next_id();
        let b = registry.next_id();
        registry.insert(a, 'a');
        registry.insert(b, 'b');
        assert_eq!(registry.cancel(a), Some('a'));
        assert_eq!(registry.cancel(a), None);
        assert!(registry.contains(b));
    }

    #[test]
    fn cancel_all_drains_everything() {
        let mut registry = LoopRegistry::new(8);
        for n in 0..3 {
            let id = registry.next_id();
            registry.insert(id, n);
        }
        assert_eq!(registry.cancel_all(), vec![0, 1, 2]);
        assert!(registry.is_empty());
    }

    #[test]
    fn zero_cap_still_holds_one_loop() {
        let mut registry = LoopRegistry::new(0);
        let id = registry.next_id();
        assert!(registry.insert(id, ()).is_none());
        assert_eq!(registry.len(), 1);
    }
}
