//! Periodic tick scheduling.
//!
//! The session only needs "call this every N seconds until told to stop",
//! so that is the whole [`Scheduler`] trait. [`ThreadScheduler`] runs the
//! task on a dedicated worker thread that selects between a
//! `crossbeam_channel::tick` timer and a rendezvous stop channel; `stop()`
//! joins the worker, so once it returns no task is running and none will
//! start.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use thiserror::Error;

use crate::logging::{self, Component};

pub type Task = Box<dyn FnMut() + Send + 'static>;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[from] io::Error),
}

pub trait Scheduler {
    /// Runs `task` every `interval` until [`Scheduler::stop`] is called.
    /// The first run happens one interval after start.
    fn start(&mut self, interval: Duration, task: Task) -> Result<(), SchedulerError>;

    /// Stops the schedule. Blocks until an in-flight run has finished.
    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Thread-backed scheduler
// ---------------------------------------------------------------------------

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub struct ThreadScheduler {
    worker: Option<Worker>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for ThreadScheduler {
    fn start(&mut self, interval: Duration, mut task: Task) -> Result<(), SchedulerError> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }
        // A worker that died on its own still needs joining.
        self.stop();

        let (stop_tx, stop_rx) = bounded::<()>(0);
        let ticker = tick(interval);
        let handle = thread::Builder::new()
            .name("rivermon-tick".to_string())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticker) -> _ => {
                            if panic::catch_unwind(AssertUnwindSafe(&mut task)).is_err() {
                                logging::error(
                                    Component::Scheduler,
                                    None,
                                    "Scheduled task panicked; schedule continues",
                                );
                            }
                        }
                        // A stop request or a dropped sender both end the loop.
                        recv(stop_rx) -> _ => break,
                    }
                }
            })?;

        logging::info(
            Component::Scheduler,
            None,
            &format!("Started with a {:?} interval", interval),
        );
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        // Rendezvous: returns once the worker has taken the request, or
        // fails at once if the worker already exited.
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            logging::error(Component::Scheduler, None, "Scheduler thread exited abnormally");
        } else {
            logging::info(Component::Scheduler, None, "Stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_runs_repeatedly_until_stopped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(Duration::from_millis(5), counting_task(&counter))
            .unwrap();
        assert!(scheduler.is_running());

        thread::sleep(Duration::from_millis(100));
        scheduler.stop();
        assert!(!scheduler.is_running());

        let after_stop = counter.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected several runs, got {after_stop}");

        thread::sleep(Duration::from_millis(50));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            after_stop,
            "no run may happen after stop() returns"
        );
    }

    #[test]
    fn test_second_start_is_rejected() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(Duration::from_secs(60), counting_task(&counter))
            .unwrap();
        let err = scheduler
            .start(Duration::from_secs(60), counting_task(&counter))
            .unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop();
    }

    #[test]
    fn test_stop_waits_for_in_flight_run() {
        let busy = Arc::new(AtomicBool::new(false));
        let runs = Arc::new(AtomicUsize::new(0));
        let (task_busy, task_runs) = (Arc::clone(&busy), Arc::clone(&runs));

        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(
                Duration::from_millis(1),
                Box::new(move || {
                    task_busy.store(true, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(30));
                    task_runs.fetch_add(1, Ordering::SeqCst);
                    task_busy.store(false, Ordering::SeqCst);
                }),
            )
            .unwrap();

        while runs.load(Ordering::SeqCst) == 0 && !busy.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(1));
        }
        scheduler.stop();
        assert!(!busy.load(Ordering::SeqCst), "stop() returned mid-run");
    }

    #[test]
    fn test_panicking_task_does_not_end_schedule() {
        let counter = Arc::new(AtomicUsize::new(0));
        let task_counter = Arc::clone(&counter);
        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(
                Duration::from_millis(5),
                Box::new(move || {
                    if task_counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        panic!("first run fails");
                    }
                }),
            )
            .unwrap();

        thread::sleep(Duration::from_millis(80));
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }

    #[test]
    fn test_stop_does_not_wait_for_next_tick() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(Duration::from_secs(3600), counting_task(&counter))
            .unwrap();

        let started = std::time::Instant::now();
        scheduler.stop();
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "stop() should interrupt the wait between ticks"
        );
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_without_start_is_a_no_op() {
        let mut scheduler = ThreadScheduler::new();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_can_restart_after_stop() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = ThreadScheduler::new();
        scheduler
            .start(Duration::from_secs(60), counting_task(&counter))
            .unwrap();
        scheduler.stop();
        assert!(
            scheduler
                .start(Duration::from_secs(60), counting_task(&counter))
                .is_ok()
        );
    }
}
