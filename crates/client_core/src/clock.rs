use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    origin: Instant,
    elapsed_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let millis = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.elapsed_ms.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Autosave,
    CloseHost,
}

#[derive(Debug, Default)]
pub(crate) struct Deadlines {
    autosave_every: Option<Duration>,
    next_autosave: Option<Instant>,
    close_at: Option<Instant>,
}

impl Deadlines {
    pub(crate) fn arm_autosave(&mut self, now: Instant, every: Duration) {
        self.autosave_every = Some(every);
        self.next_autosave = Some(now + every);
    }

    pub(crate) fn disarm_autosave(&mut self) {
        self.autosave_every = None;
        self.next_autosave = None;
    }

    pub(crate) fn schedule_close(&mut self, at: Instant) {
        self.close_at = Some(at);
    }

    pub(crate) fn disarm_all(&mut self) {
        self.disarm_autosave();
        self.close_at = None;
    }

    /// Events whose deadline has passed. Autosave re-arms one period from `now`;
    /// close fires once.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut due = Vec::new();

        if let (Some(next), Some(every)) = (self.next_autosave, self.autosave_every) {
            if now >= next {
                due.push(TimerEvent::Autosave);
                self.next_autosave = Some(now + every);
            }
        }

        if self.close_at.is_some_and(|at| now >= at) {
            self.close_at = None;
            due.push(TimerEvent::CloseHost);
        }

        due
    }
}
