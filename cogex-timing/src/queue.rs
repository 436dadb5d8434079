//! Cancellable one-shot timers keyed by absolute deadline.
//!
//! The queue never fires anything by itself: the owner polls
//! [`TimerQueue::pop_due`] with the current time. Timers due at the same
//! instant fire in the order they were scheduled.

use crate::delay::ms_to_ns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<E> {
    id: u64,
    due: u64,
    event: E,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E> Default for TimerQueue<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }
}

impl<E> TimerQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at(&mut self, due: u64, event: E) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Entry { id, due, event });
        TimerHandle(id)
    }

    pub fn schedule_after_ms(&mut self, now: u64, delay_ms: u64, event: E) -> TimerHandle {
        self.schedule_at(now.saturating_add(ms_to_ns(delay_ms)), event)
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != handle.0);
        self.entries.len() != before
    }

    pub fn cancel_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due).min()
    }

    /// Removes and returns the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<E> {
        self.pop_due_at(now).map(|(_, event)| event)
    }

    /// Like [`TimerQueue::pop_due`], also returning the timer's deadline.
    pub fn pop_due_at(&mut self, now: u64) -> Option<(u64, E)> {
        let pos = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.id))
            .map(|(i, _)| i)?;
        let entry = self.entries.remove(pos);
        Some((entry.due, entry.event))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
