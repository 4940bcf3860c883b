use std::time::{Duration, Instant};

/// Time source for deadline-bounded waits.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Result of [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    Done(T),
    TimedOut,
}

/// Repeat `attempt` until it yields a value or `timeout` elapses, sleeping
/// `interval` between attempts.
///
/// `attempt` receives the time left before the deadline so blocking calls can
/// bound themselves. The first attempt always runs. Sleeps never overshoot the
/// deadline.
pub fn poll_until<T>(
    clock: &dyn Clock,
    timeout: Duration,
    interval: Duration,
    mut attempt: impl FnMut(Duration) -> Option<T>,
) -> PollOutcome<T> {
    let deadline = clock.now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(clock.now());
        if let Some(value) = attempt(remaining) {
            return PollOutcome::Done(value);
        }

        let remaining = deadline.saturating_duration_since(clock.now());
        if remaining.is_zero() {
            return PollOutcome::TimedOut;
        }
        clock.sleep(interval.min(remaining));
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::Cell;
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Clock that only advances when slept on.
    pub struct FakeClock {
        origin: Instant,
        elapsed: Cell<Duration>,
        pub sleeps: Cell<usize>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                origin: Instant::now(),
                elapsed: Cell::new(Duration::ZERO),
                sleeps: Cell::new(0),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.elapsed.set(self.elapsed.get() + by);
        }

        pub fn elapsed(&self) -> Duration {
            self.elapsed.get()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.origin + self.elapsed.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.set(self.sleeps.get() + 1);
            self.advance(duration);
        }
    }
}
