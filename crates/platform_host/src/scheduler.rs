//! Interval scheduling contracts and a manually advanced scheduler.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
    time::Duration,
};

/// Callback invoked on every interval tick.
pub type IntervalTick = Rc<dyn Fn()>;

const MIN_INTERVAL_PERIOD: Duration = Duration::from_millis(1);

/// Host service for periodic callbacks on the runtime's thread.
pub trait IntervalScheduler {
    /// Schedules `tick` every `period` until the returned handle is cancelled or dropped.
    fn set_interval(&self, period: Duration, tick: IntervalTick) -> IntervalHandle;
}

/// Owning handle for a scheduled interval; dropping it cancels the interval.
pub struct IntervalHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl IntervalHandle {
    /// Wraps a cancellation callback that runs exactly once.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle for an interval that never fires.
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancels the interval.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for IntervalHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Scheduler for hosts without timers; intervals never fire.
pub struct NoopIntervalScheduler;

impl IntervalScheduler for NoopIntervalScheduler {
    fn set_interval(&self, _period: Duration, _tick: IntervalTick) -> IntervalHandle {
        IntervalHandle::inert()
    }
}

struct ManualTimer {
    period: Duration,
    next_due: Duration,
    tick: IntervalTick,
}

#[derive(Default)]
struct ManualSchedulerInner {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<u64, ManualTimer>,
}

#[derive(Clone, Default)]
/// Scheduler driven by an explicit virtual clock.
///
/// Ticks fire only from [`ManualIntervalScheduler::advance`], in due-time order, with no scheduler
/// borrow held while a tick runs so callbacks may schedule or cancel intervals.
pub struct ManualIntervalScheduler {
    inner: Rc<RefCell<ManualSchedulerInner>>,
}

impl ManualIntervalScheduler {
    /// Returns the current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Returns the number of live intervals.
    pub fn active_intervals(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Advances virtual time by `by`, firing every tick that falls due.
    pub fn advance(&self, by: Duration) {
        let target = self.inner.borrow().now + by;
        loop {
            let tick = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .filter(|(_, timer)| timer.next_due <= target)
                    .min_by_key(|(id, timer)| (timer.next_due, **id))
                    .map(|(id, _)| *id);
                let Some(id) = due else {
                    break;
                };
                let Some(timer) = inner.timers.get_mut(&id) else {
                    break;
                };
                let fired_at = timer.next_due;
                timer.next_due += timer.period;
                let tick = timer.tick.clone();
                inner.now = fired_at;
                tick
            };
            tick();
        }
        self.inner.borrow_mut().now = target;
    }
}

impl fmt::Debug for ManualIntervalScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ManualIntervalScheduler")
            .field("now", &inner.now)
            .field("active_intervals", &inner.timers.len())
            .finish()
    }
}

impl IntervalScheduler for ManualIntervalScheduler {
    fn set_interval(&self, period: Duration, tick: IntervalTick) -> IntervalHandle {
        let period = period.max(MIN_INTERVAL_PERIOD);
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let next_due = inner.now + period;
            inner.timers.insert(
                id,
                ManualTimer {
                    period,
                    next_due,
                    tick,
                },
            );
            id
        };
        let weak: Weak<RefCell<ManualSchedulerInner>> = Rc::downgrade(&self.inner);
        IntervalHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().timers.remove(&id);
            }
        })
    }
}
