//! Scheduling of target writes and render-slot reconciles.
//!
//! Reactive state (values, subscriptions, bound views) is always updated
//! synchronously; only the final write to a target and the slot reconcile go
//! through a [`TaskQueue`]. Queued tasks read the latest state when they run,
//! so running them late or more than once converges on the same result.

use crate::runner::ds::error::BindingError;
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::{trace, warn};

pub type WriteTask = Box<dyn FnOnce() -> Result<(), BindingError>>;

pub trait TaskQueue {
    /// Runs the task now or later. An immediate queue reports the task's
    /// failure to the caller.
    fn queue_write(&self, task: WriteTask) -> Result<(), BindingError>;
}

/// Runs every task inline.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateQueue;

impl TaskQueue for ImmediateQueue {
    fn queue_write(&self, task: WriteTask) -> Result<(), BindingError> {
        task()
    }
}

/// Buffers tasks until [`flush`](DeferredQueue::flush).
#[derive(Default)]
pub struct DeferredQueue {
    pending: RefCell<VecDeque<WriteTask>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        DeferredQueue {
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Runs queued tasks, including ones queued while flushing, and returns
    /// how many ran. Failures are logged and the first is returned after the
    /// queue drains.
    pub fn flush(&self) -> Result<usize, BindingError> {
        let mut ran = 0;
        let mut first_error = None;
        loop {
            let task = self.pending.borrow_mut().pop_front();
            let task = match task {
                Some(t) => t,
                None => break,
            };
            ran += 1;
            if let Err(e) = task() {
                warn!(error = %e, "queued write failed");
                first_error.get_or_insert(e);
            }
        }
        trace!(ran, "flushed write queue");
        match first_error {
            Some(e) => Err(e),
            None => Ok(ran),
        }
    }
}

impl TaskQueue for DeferredQueue {
    fn queue_write(&self, task: WriteTask) -> Result<(), BindingError> {
        self.pending.borrow_mut().push_back(task);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_deferred_queue_runs_on_flush() {
        let queue = DeferredQueue::new();
        let hits = Rc::new(Cell::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            queue
                .queue_write(Box::new(move || {
                    hits.set(hits.get() + 1);
                    Ok(())
                }))
                .unwrap();
        }
        assert_eq!(hits.get(), 0);
        assert_eq!(queue.flush().unwrap(), 3);
        assert_eq!(hits.get(), 3);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_flush_reports_first_failure_after_draining() {
        let queue = DeferredQueue::new();
        queue
            .queue_write(Box::new(|| Err(BindingError::evaluation("first"))))
            .unwrap();
        queue
            .queue_write(Box::new(|| Err(BindingError::evaluation("second"))))
            .unwrap();
        assert_eq!(queue.flush(), Err(BindingError::evaluation("first")));
        assert!(queue.is_empty());
    }
}
