use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Runs recurring callbacks at independent periods on one background thread.
///
/// All callbacks execute sequentially on the same thread, so no two ever
/// overlap. Re-arming is period-after-completion: a callback that runs long
/// pushes its own next firing out, it never bunches up. The thread sleeps
/// until the nearest due timer; registering a timer or stopping wakes it.
///
/// Timers cannot be unregistered individually; they live until the
/// scheduler stops.
pub struct Scheduler {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

struct Shared {
    state: Mutex<State>,
    cv: Condvar,
}

struct State {
    alive: bool,
    timers: Vec<TimerSlot>,
}

struct TimerSlot {
    period: Duration,
    next_due: Instant,
    // Taken out while the callback runs so the lock can be released.
    job: Option<Box<dyn FnMut() + Send>>,
}

impl Scheduler {
    /// Create the scheduler and start its background thread.
    pub fn new() -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                alive: true,
                timers: Vec::new(),
            }),
            cv: Condvar::new(),
        });

        let thread = std::thread::Builder::new()
            .name("poselink-sched".to_string())
            .spawn({
                let shared = Arc::clone(&shared);
                move || run(&shared)
            })?;

        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Register a recurring callback. A zero period is ignored.
    pub fn register(&self, period: Duration, job: impl FnMut() + Send + 'static) {
        if period.is_zero() {
            warn!("ignoring timer registration with zero period");
            return;
        }

        let mut state = lock_state(&self.shared);
        state.timers.push(TimerSlot {
            period,
            next_due: Instant::now() + period,
            job: Some(Box::new(job)),
        });
        drop(state);
        self.shared.cv.notify_all();
    }

    /// Signal the background thread to exit and join it.
    pub fn stop(&mut self) {
        lock_state(&self.shared).alive = false;
        self.shared.cv.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_state(shared: &Shared) -> std::sync::MutexGuard<'_, State> {
    shared
        .state
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn run(shared: &Shared) {
    debug!("scheduler thread started");
    let mut state = lock_state(shared);

    while state.alive {
        let now = Instant::now();
        let nearest = state.timers.iter().map(|t| t.next_due).min();

        match nearest {
            None => {
                state = shared
                    .cv
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            }
            Some(due) if due > now => {
                let (guard, _) = shared
                    .cv
                    .wait_timeout(state, due - now)
                    .unwrap_or_else(PoisonError::into_inner);
                state = guard;
                continue;
            }
            Some(_) => {}
        }

        // Run everything currently due. Jobs are taken out of their slot so
        // user code never runs under the state lock; re-arm happens after
        // the callback returns.
        let mut index = 0;
        while index < state.timers.len() {
            if state.timers[index].next_due <= Instant::now() {
                if let Some(mut job) = state.timers[index].job.take() {
                    drop(state);
                    job();
                    state = lock_state(shared);
                    let slot = &mut state.timers[index];
                    slot.next_due = Instant::now() + slot.period;
                    slot.job = Some(job);
                    if !state.alive {
                        break;
                    }
                }
            }
            index += 1;
        }
    }

    debug!("scheduler thread exiting");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn fires_at_roughly_the_registered_rates() {
        let fast = Arc::new(AtomicUsize::new(0));
        let slow = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new().unwrap();
        scheduler.register(Duration::from_millis(10), {
            let fast = Arc::clone(&fast);
            move || {
                fast.fetch_add(1, Ordering::SeqCst);
            }
        });
        scheduler.register(Duration::from_millis(100), {
            let slow = Arc::clone(&slow);
            move || {
                slow.fetch_add(1, Ordering::SeqCst);
            }
        });

        std::thread::sleep(Duration::from_millis(350));
        drop(scheduler);

        let fast = fast.load(Ordering::SeqCst);
        let slow = slow.load(Ordering::SeqCst);
        assert!(fast >= 15, "fast timer fired only {fast} times");
        assert!((2..=4).contains(&slow), "slow timer fired {slow} times");
        assert!(fast > slow * 4);
    }

    #[test]
    fn callbacks_never_overlap() {
        let busy = Arc::new(AtomicBool::new(false));
        let overlapped = Arc::new(AtomicBool::new(false));

        let scheduler = Scheduler::new().unwrap();
        for _ in 0..3 {
            let busy = Arc::clone(&busy);
            let overlapped = Arc::clone(&overlapped);
            scheduler.register(Duration::from_millis(5), move || {
                if busy.swap(true, Ordering::SeqCst) {
                    overlapped.store(true, Ordering::SeqCst);
                }
                std::thread::sleep(Duration::from_millis(2));
                busy.store(false, Ordering::SeqCst);
            });
        }

        std::thread::sleep(Duration::from_millis(150));
        drop(scheduler);
        assert!(!overlapped.load(Ordering::SeqCst));
    }

    #[test]
    fn rearm_is_period_after_completion() {
        // A callback that takes ~3x its period must not bunch up firings.
        let count = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new().unwrap();
        scheduler.register(Duration::from_millis(10), {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(30));
            }
        });

        std::thread::sleep(Duration::from_millis(200));
        drop(scheduler);

        // Each cycle is ~40ms (30ms work + 10ms period), so ~5 firings.
        let count = count.load(Ordering::SeqCst);
        assert!((3..=6).contains(&count), "fired {count} times");
    }

    #[test]
    fn zero_period_is_ignored() {
        let count = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new().unwrap();
        scheduler.register(Duration::ZERO, {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        std::thread::sleep(Duration::from_millis(30));
        drop(scheduler);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stop_joins_promptly() {
        let mut scheduler = Scheduler::new().unwrap();
        scheduler.register(Duration::from_secs(3600), || {});

        let started = Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn register_after_long_sleep_wakes_the_thread() {
        let count = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new().unwrap();
        scheduler.register(Duration::from_secs(3600), || {});
        // The thread is now parked until the hour-long timer; a fresh
        // registration must interrupt that sleep.
        scheduler.register(Duration::from_millis(10), {
            let count = Arc::clone(&count);
            move || {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        std::thread::sleep(Duration::from_millis(100));
        drop(scheduler);
        assert!(count.load(Ordering::SeqCst) >= 3);
    }
}
