//! # Frame Schedulers
//!
//! Cooperative ingestion hands control back between batches by asking a
//! [`FrameScheduler`] to run a callback later. The scheduler is injected, so
//! tests drive it by hand with [`ManualScheduler`] while binaries use
//! [`TokioScheduler`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;
use tokio::runtime::Handle;

pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

pub trait FrameScheduler {
    /// Whether [`schedule_idle`](Self::schedule_idle) is available
    fn supports_idle(&self) -> bool {
        false
    }

    /// Run `callback` when the host is idle
    fn schedule_idle(&self, callback: FrameCallback);

    /// Run `callback` on the next frame
    fn schedule_frame(&self, callback: FrameCallback);

    /// Idle when supported, otherwise the next frame
    fn schedule(&self, callback: FrameCallback) {
        if self.supports_idle() {
            self.schedule_idle(callback);
        } else {
            self.schedule_frame(callback);
        }
    }
}

/// Tokio-backed scheduler. Idle callbacks run after one `yield_now`, frame
/// callbacks after `frame_interval`. Outside a runtime both run inline.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    pub frame_interval: Duration,
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(16),
        }
    }
}

impl FrameScheduler for TokioScheduler {
    fn supports_idle(&self) -> bool {
        true
    }

    fn schedule_idle(&self, callback: FrameCallback) {
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::task::yield_now().await;
                    callback();
                });
            }
            Err(_) => callback(),
        }
    }

    fn schedule_frame(&self, callback: FrameCallback) {
        let interval = self.frame_interval;
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(interval).await;
                    callback();
                });
            }
            Err(_) => callback(),
        }
    }
}

#[derive(Default)]
struct ManualQueue {
    idle: bool,
    pending: VecDeque<FrameCallback>,
    idle_requests: usize,
    frame_requests: usize,
}

/// Queues callbacks until the owner runs them. Clones share one queue.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualQueue>>,
}

impl ManualScheduler {
    /// A scheduler that reports idle support
    pub fn with_idle() -> Self {
        let scheduler = Self::default();
        scheduler.inner.borrow_mut().idle = true;
        scheduler
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Run everything queued so far, returning how many callbacks ran
    pub fn run_pending(&self) -> usize {
        let queued = std::mem::take(&mut self.inner.borrow_mut().pending);
        let count = queued.len();
        for callback in queued {
            callback();
        }
        count
    }

    /// Discard queued callbacks without running them
    pub fn drop_pending(&self) -> usize {
        let queued = std::mem::take(&mut self.inner.borrow_mut().pending);
        queued.len()
    }

    /// (idle, frame) requests received so far
    pub fn requests(&self) -> (usize, usize) {
        let queue = self.inner.borrow();
        (queue.idle_requests, queue.frame_requests)
    }
}

impl FrameScheduler for ManualScheduler {
    fn supports_idle(&self) -> bool {
        self.inner.borrow().idle
    }

    fn schedule_idle(&self, callback: FrameCallback) {
        let mut queue = self.inner.borrow_mut();
        queue.idle_requests += 1;
        queue.pending.push_back(callback);
    }

    fn schedule_frame(&self, callback: FrameCallback) {
        let mut queue = self.inner.borrow_mut();
        queue.frame_requests += 1;
        queue.pending.push_back(callback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() -> FrameCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let shared = count.clone();
        let make = move || -> FrameCallback {
            let shared = shared.clone();
            Box::new(move || {
                shared.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[test]
    fn test_schedule_prefers_idle_when_supported() {
        let frames = ManualScheduler::default();
        frames.schedule(Box::new(|| {}));
        assert_eq!(frames.requests(), (0, 1));

        let idle = ManualScheduler::with_idle();
        idle.schedule(Box::new(|| {}));
        assert_eq!(idle.requests(), (1, 0));
    }

    #[test]
    fn test_manual_queue_runs_on_demand() {
        let (count, make) = counter();
        let frames = ManualScheduler::default();
        frames.schedule(make());
        frames.schedule(make());

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(frames.pending(), 2);
        assert_eq!(frames.run_pending(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(frames.pending(), 0);
    }

    #[test]
    fn test_dropped_callbacks_never_run() {
        let (count, make) = counter();
        let frames = ManualScheduler::default();
        frames.schedule(make());

        assert_eq!(frames.drop_pending(), 1);
        assert_eq!(frames.run_pending(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_tokio_scheduler_runs_inline_without_runtime() {
        let (count, make) = counter();
        let scheduler = TokioScheduler::default();
        scheduler.schedule_idle(make());
        scheduler.schedule_frame(make());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_defers_inside_runtime() {
        let scheduler = TokioScheduler {
            frame_interval: Duration::from_millis(1),
        };
        let (tx, rx) = tokio::sync::oneshot::channel();
        scheduler.schedule_frame(Box::new(move || {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await, Ok(7));
    }
}
