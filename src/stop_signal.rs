use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

// Upper bound on how long a waiter can miss a flag raised by a signal handler,
// which cannot notify the condvar itself.
const SIGNAL_POLL_SLICE: Duration = Duration::from_millis(100);

/// Cooperative shutdown request shared by every task.
///
/// Clones share the same flag. Setting it is idempotent and wakes all
/// waiters at once.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: Arc<AtomicBool>,
    lock: Mutex<()>,
    wake: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        if !self.inner.flag.swap(true, Ordering::SeqCst) {
            info!("stop requested");
        }
        let _guard = self.inner.lock.lock();
        self.inner.wake.notify_all();
    }

    pub fn is_set(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Block idle for up to `timeout`.
    ///
    /// Returns `true` as soon as the signal is set, `false` if the whole
    /// period elapsed without a stop request. A timeout too large to put on
    /// the clock waits until the signal is set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut guard = self.inner.lock.lock();
        loop {
            if self.is_set() {
                return true;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    (deadline - now).min(SIGNAL_POLL_SLICE)
                }
                None => SIGNAL_POLL_SLICE,
            };
            self.inner.wake.wait_for(&mut guard, slice);
        }
    }

    /// Raise the signal on SIGINT or SIGTERM.
    pub fn listen_for_termination(&self) -> io::Result<()> {
        signal_hook::flag::register(signal_hook::consts::SIGTERM, self.inner.flag.clone())?;
        signal_hook::flag::register(signal_hook::consts::SIGINT, self.inner.flag.clone())?;
        Ok(())
    }

    #[cfg(test)]
    fn raw_flag(&self) -> Arc<AtomicBool> {
        self.inner.flag.clone()
    }
}
