/*
Audio-Clock Timers
==================

Deferred work (reclaiming a released voice, applying a staggered option
update) is a deadline on the engine's audio clock, not a wall-clock timer.
The engine services due timers at the start of every rendered block:

    schedule(t=1.25, Reclaim(3)) ──→ handle #7
    ...
    render_block @ t=1.20   nothing due
    render_block @ t=1.26   pop_due → (#7, Reclaim(3))

Every scheduled event gets a fresh `TimerHandle`. The owner keeps the handle
next to the state the event will touch; when the event fires, it is applied
only if the stored handle still matches. Cancelling removes the entry, and
the handle check catches anything that slipped through, so a stale timer can
never act on state that has since been reused.
*/

/// Identifies one scheduled event. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug)]
struct Entry<E> {
    deadline: f64,
    handle: TimerHandle,
    event: E,
}

/// Deadline queue keyed on audio-clock seconds.
///
/// Due events pop earliest deadline first; equal deadlines pop in scheduling
/// order.
#[derive(Debug)]
pub struct Scheduler<E> {
    entries: Vec<Entry<E>>,
    next_handle: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Reserve room for `capacity` pending events so scheduling on the audio
    /// thread does not allocate.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            next_handle: 0,
        }
    }

    pub fn schedule(&mut self, deadline: f64, event: E) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(Entry {
            deadline,
            handle,
            event,
        });
        handle
    }

    /// Remove a pending event. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.entries.iter().position(|e| e.handle == handle) {
            Some(idx) => {
                self.entries.swap_remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self, handle: TimerHandle) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| e.deadline)
    }

    /// Remove and return the earliest event whose deadline is at or before
    /// `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerHandle, E)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.deadline <= now)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then(a.handle.cmp(&b.handle))
            })
            .map(|(idx, _)| idx)?;

        let entry = self.entries.swap_remove(idx);
        Some((entry.handle, entry.event))
    }

    /// Drop every pending event.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_only_due_events_in_deadline_order() {
        let mut timers = Scheduler::new();
        timers.schedule(0.3, "c");
        timers.schedule(0.1, "a");
        timers.schedule(0.2, "b");

        assert_eq!(timers.pop_due(0.05), None);
        assert_eq!(timers.pop_due(0.25).map(|(_, e)| e), Some("a"));
        assert_eq!(timers.pop_due(0.25).map(|(_, e)| e), Some("b"));
        assert_eq!(timers.pop_due(0.25), None);
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn equal_deadlines_fire_in_scheduling_order() {
        let mut timers = Scheduler::new();
        for event in 0..5 {
            timers.schedule(1.0, event);
        }
        let fired: Vec<i32> = std::iter::from_fn(|| timers.pop_due(1.0).map(|(_, e)| e)).collect();
        assert_eq!(fired, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn cancelled_events_never_fire() {
        let mut timers = Scheduler::new();
        let keep = timers.schedule(0.1, 1);
        let drop = timers.schedule(0.1, 2);

        assert!(timers.cancel(drop));
        assert!(!timers.cancel(drop));
        assert_eq!(timers.deadline(keep), Some(0.1));
        assert_eq!(timers.deadline(drop), None);

        assert_eq!(timers.pop_due(1.0), Some((keep, 1)));
        assert!(timers.is_empty());
    }

    #[test]
    fn handles_are_unique() {
        let mut timers = Scheduler::new();
        let a = timers.schedule(0.0, ());
        timers.pop_due(0.0);
        let b = timers.schedule(0.0, ());
        assert_ne!(a, b);
        assert_eq!(timers.deadline(b), Some(0.0));
    }
}
