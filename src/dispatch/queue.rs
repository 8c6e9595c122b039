//! Thread-safe hand-off from any thread to the host's execution thread.
//!
//! Any thread may [`enqueue`](MainThreadQueue::enqueue); only the host thread
//! calls [`drain_and_run_all`](MainThreadQueue::drain_and_run_all), once per
//! turn, passing its own state as the callback context.
//!
//! ```text
//! I/O task ──enqueue──┐
//! I/O task ──enqueue──┼─► VecDeque ─► drain (swap) ─► run in order on host thread
//! any thread ─enqueue─┘
//! ```
//!
//! # Example
//!
//! ```
//! use hostpipe::dispatch::MainThreadQueue;
//!
//! let queue: MainThreadQueue<Vec<&str>> = MainThreadQueue::new();
//! queue.enqueue(|log| log.push("first"));
//! queue.enqueue(|log| log.push("second"));
//!
//! let mut log = Vec::new();
//! assert_eq!(queue.drain_and_run_all(&mut log), 2);
//! assert_eq!(log, ["first", "second"]);
//! ```

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A deferred unit of work, run exactly once with the host context.
pub type Callback<C> = Box<dyn FnOnce(&mut C) + Send + 'static>;

/// Unbounded FIFO of callbacks awaiting the host thread.
///
/// Cloning shares the same queue.
pub struct MainThreadQueue<C: ?Sized + 'static> {
    inner: Arc<Mutex<VecDeque<Callback<C>>>>,
}

impl<C: ?Sized + 'static> MainThreadQueue<C> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Append a callback to the tail. Safe from any thread.
    pub fn enqueue<F>(&self, callback: F)
    where
        F: FnOnce(&mut C) + Send + 'static,
    {
        self.lock().push_back(Box::new(callback));
    }

    /// Detach everything queued so far and run it in enqueue order.
    ///
    /// Callbacks enqueued while this runs land in the next turn. A panicking
    /// callback is logged and does not stop the rest of the batch.
    ///
    /// Returns the number of callbacks run.
    pub fn drain_and_run_all(&self, context: &mut C) -> usize {
        let batch = std::mem::take(&mut *self.lock());
        let count = batch.len();

        for callback in batch {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(context))).is_err() {
                tracing::error!("Dispatch callback panicked");
            }
        }

        count
    }

    /// Number of callbacks waiting for the next drain.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no callbacks are waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The lock is never held while a callback runs, so poisoning carries no
    // torn state; recover the guard.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Callback<C>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: ?Sized + 'static> Clone for MainThreadQueue<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: ?Sized + 'static> Default for MainThreadQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue: MainThreadQueue<Vec<i32>> = MainThreadQueue::new();
        for i in 0..5 {
            queue.enqueue(move |log| log.push(i));
        }

        let mut log = Vec::new();
        assert_eq!(queue.drain_and_run_all(&mut log), 5);
        assert_eq!(log, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_during_drain_runs_next_turn() {
        let queue: MainThreadQueue<Vec<i32>> = MainThreadQueue::new();
        let requeue = queue.clone();
        queue.enqueue(move |log| {
            log.push(1);
            requeue.enqueue(|log| log.push(2));
        });

        let mut log = Vec::new();
        assert_eq!(queue.drain_and_run_all(&mut log), 1);
        assert_eq!(log, vec![1]);
        assert_eq!(queue.len(), 1);

        assert_eq!(queue.drain_and_run_all(&mut log), 1);
        assert_eq!(log, vec![1, 2]);
    }

    #[test]
    fn test_self_requeueing_callback_does_not_stall_turn() {
        fn requeue(queue: MainThreadQueue<u32>) -> Callback<u32> {
            Box::new(move |count: &mut u32| {
                *count += 1;
                let next = queue.clone();
                queue.enqueue(requeue(next));
            })
        }

        let queue: MainThreadQueue<u32> = MainThreadQueue::new();
        queue.enqueue(requeue(queue.clone()));

        let mut count = 0;
        for _ in 0..3 {
            assert_eq!(queue.drain_and_run_all(&mut count), 1);
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_enqueue_from_many_threads() {
        let queue: MainThreadQueue<usize> = MainThreadQueue::new();

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        queue.enqueue(|total| *total += 1);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut total = 0;
        assert_eq!(queue.drain_and_run_all(&mut total), 400);
        assert_eq!(total, 400);
    }

    #[test]
    fn test_panicking_callback_does_not_drop_rest() {
        let queue: MainThreadQueue<Vec<&'static str>> = MainThreadQueue::new();
        queue.enqueue(|log| log.push("before"));
        queue.enqueue(|_| panic!("handler blew up"));
        queue.enqueue(|log| log.push("after"));

        let mut log = Vec::new();
        assert_eq!(queue.drain_and_run_all(&mut log), 3);
        assert_eq!(log, vec!["before", "after"]);
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue: MainThreadQueue<()> = MainThreadQueue::new();
        assert_eq!(queue.drain_and_run_all(&mut ()), 0);
    }
}
