use crate::reading::Reading;
use parking_lot::Mutex;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 180;

/// Bounded, thread-safe history of readings, oldest first.
///
/// Every operation goes through one mutex, so nobody ever sees a half-applied
/// append or eviction. Reads hand out copies; the live deque never escapes.
#[derive(Debug)]
pub struct SampleBuffer {
    capacity: usize,
    history: Mutex<VecDeque<Reading>>,
}

impl SampleBuffer {
    /// A capacity of zero is treated as one. Storage grows on demand, so a
    /// large capacity costs nothing until it fills.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn append(&self, reading: Reading) {
        self.append_with(|| reading);
    }

    /// Build the reading inside the critical section and append it.
    ///
    /// Stamping under the lock keeps append order and timestamp order identical
    /// even with several producers. `make` holds the lock for as long as it
    /// runs, so it should do no more than read the clock; a single producer
    /// should build the reading first and call [`SampleBuffer::append`].
    pub fn append_with<F>(&self, make: F) -> Reading
    where
        F: FnOnce() -> Reading,
    {
        let mut history = self.history.lock();
        let reading = make();
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(reading);
        reading
    }

    pub fn latest(&self) -> Option<Reading> {
        self.history.lock().back().copied()
    }

    pub fn snapshot(&self) -> Vec<Reading> {
        self.history.lock().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
