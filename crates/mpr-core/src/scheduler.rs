use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<T> {
    deadline: Duration,
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

/// Single-threaded timer queue on a virtual clock.
///
/// Tasks run in deadline order; tasks sharing a deadline run in the order
/// they were scheduled. Nothing runs until the owner pops it, so deferred
/// work interleaves with event handling exactly as a UI runtime's timers do.
pub struct Scheduler<T> {
    now: Duration,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn schedule(&mut self, delay: Duration, task: T) {
        let entry = Entry {
            deadline: self.now + delay,
            seq: self.seq,
            task,
        };
        self.seq += 1;
        self.queue.push(Reverse(entry));
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.deadline)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to its deadline.
    pub fn pop_due(&mut self, until: Duration) -> Option<T> {
        if self.next_deadline()? > until {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.deadline);
        Some(entry.task)
    }

    /// Pop the earliest task regardless of its deadline.
    pub fn pop_next(&mut self) -> Option<T> {
        let deadline = self.next_deadline()?;
        self.pop_due(deadline)
    }

    /// Move the clock forward without running anything.
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}
