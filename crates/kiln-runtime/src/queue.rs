//! Command queues.

use std::fmt;

/// Identifies one in-order queue of one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueId {
    pub device: usize,
    pub index: usize,
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device{}/queue{}", self.device, self.index)
    }
}

/// Bookkeeping for an in-order queue.
///
/// Simulated work completes on submission, so a queue only counts what was
/// submitted since the last synchronization.
#[derive(Debug, Default)]
pub(crate) struct Queue {
    pending: usize,
    completed: usize,
}

impl Queue {
    pub(crate) fn submit(&mut self) {
        self.pending += 1;
    }

    /// Waits for every pending command; returns how many there were.
    pub(crate) fn wait(&mut self) -> usize {
        let drained = self.pending;
        self.completed += drained;
        self.pending = 0;
        drained
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed
    }
}
