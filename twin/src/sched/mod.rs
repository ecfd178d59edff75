//! Cooperative single-thread scheduling: a priority work queue, a timeout
//! queue keyed by wall-clock deadline, and the dispatch loop that drives
//! both and sleeps until the next deadline.
//!
//! Work and timeout procs run on the dispatcher thread and may freely
//! create or clear other entries, including themselves: run passes walk
//! an order snapshot and the generational handles keep cleared entries
//! from being touched again.
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use genpool::Ptr;
use log::trace;

mod queue;
use queue::OrderedQueue;

/// Milliseconds since the dispatcher was created.
pub type Time = i64;

/// Work priorities; lower values run first.
pub const WORK_REDISPLAY: i16 = 0;
pub const WORK_PAINT: i16 = 1;
pub const WORK_LAYOUT: i16 = 2;

/// A queued work proc returns `true` to stay queued for the next pass.
type WorkProc = Box<dyn FnMut() -> bool>;

/// A timeout proc receives the current time and returns the delay to its
/// next firing, or `None` to cancel.
type TimeoutProc = Box<dyn FnMut(Time) -> Option<Duration>>;

struct Work {
    priority: i16,
    /// Taken out while the proc runs so it can touch the dispatcher.
    proc_: Option<WorkProc>,
}

struct Timeout {
    time: Time,
    proc_: Option<TimeoutProc>,
}

/// Handle to queued work; stays valid (but inert) after the work clears
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkHandle(Ptr);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutHandle(Ptr);

struct DispatcherState {
    works: OrderedQueue<Work>,
    timeouts: OrderedQueue<Timeout>,
}

/// Cloneable handle to the scheduler.
#[derive(Clone)]
pub struct Dispatcher {
    rc: Rc<RefCell<DispatcherState>>,
    origin: Instant,
}

fn work_sorts_before(a: &Work, b: &Work) -> bool {
    a.priority < b.priority
}

fn timeout_sorts_before(a: &Timeout, b: &Timeout) -> bool {
    a.time < b.time
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Dispatcher {
        Dispatcher {
            rc: Rc::new(RefCell::new(DispatcherState {
                works: OrderedQueue::new(),
                timeouts: OrderedQueue::new(),
            })),
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> Time {
        self.origin.elapsed().as_millis() as Time
    }

    // ------------------------------------------------------------------
    // work

    pub fn set_work(&self, priority: i16, proc_: impl FnMut() -> bool + 'static) -> WorkHandle {
        let ptr = self.rc.borrow_mut().works.insert(
            Work {
                priority,
                proc_: Some(Box::new(proc_)),
            },
            work_sorts_before,
        );
        WorkHandle(ptr)
    }

    pub fn clear_work(&self, handle: WorkHandle) {
        self.rc.borrow_mut().works.delete(handle.0);
    }

    /// Run every queued work proc once, in priority order. Procs
    /// returning `false` are removed.
    pub fn run_work(&self) {
        let snapshot = self.rc.borrow().works.snapshot();
        for ptr in snapshot {
            let proc_ = self
                .rc
                .borrow_mut()
                .works
                .get_mut(ptr)
                .and_then(|w| w.proc_.take());
            let mut proc_ = match proc_ {
                Some(p) => p,
                // cleared (or already running) - skip
                None => continue,
            };

            let again = proc_();

            let mut s = self.rc.borrow_mut();
            if let Some(w) = s.works.get_mut(ptr) {
                if again {
                    w.proc_ = Some(proc_);
                } else {
                    s.works.delete(ptr);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // timeouts

    pub fn set_timeout(
        &self,
        delay: Duration,
        proc_: impl FnMut(Time) -> Option<Duration> + 'static,
    ) -> TimeoutHandle {
        let time = self.now() + delay.as_millis() as Time;
        let ptr = self.rc.borrow_mut().timeouts.insert(
            Timeout {
                time,
                proc_: Some(Box::new(proc_)),
            },
            timeout_sorts_before,
        );
        TimeoutHandle(ptr)
    }

    pub fn clear_timeout(&self, handle: TimeoutHandle) {
        self.rc.borrow_mut().timeouts.delete(handle.0);
    }

    /// Run the procs of all timeouts whose deadline has passed; each
    /// returned delay reschedules relative to `now`, and the queue is
    /// reordered so the head stays the earliest deadline.
    pub fn run_timeouts(&self) {
        self.run_timeouts_at(self.now());
    }

    fn run_timeouts_at(&self, now: Time) {
        let snapshot = self.rc.borrow().timeouts.snapshot();
        for ptr in snapshot {
            let proc_ = {
                let mut s = self.rc.borrow_mut();
                match s.timeouts.get_mut(ptr) {
                    Some(t) if t.time <= now => t.proc_.take(),
                    // the snapshot is deadline-ordered: nothing later is due
                    Some(_) => break,
                    None => continue,
                }
            };
            let mut proc_ = match proc_ {
                Some(p) => p,
                None => continue,
            };

            let delay = proc_(now);

            let mut s = self.rc.borrow_mut();
            if s.timeouts.contains(ptr) {
                match delay {
                    Some(d) => {
                        if let Some(t) = s.timeouts.get_mut(ptr) {
                            t.time = now + d.as_millis() as Time;
                            t.proc_ = Some(proc_);
                        }
                        s.timeouts.reorder(ptr, timeout_sorts_before);
                    }
                    None => {
                        s.timeouts.delete(ptr);
                    }
                }
            }
        }
    }

    /// Delay until the earliest deadline: zero if already due, `None`
    /// with no timeouts armed.
    pub fn timeout_delay(&self) -> Option<Duration> {
        let next = self.rc.borrow().timeouts.head().map(|t| t.time)?;
        let now = self.now();
        Some(Duration::from_millis((next - now).max(0) as u64))
    }

    // ------------------------------------------------------------------
    // the loop

    /// The cooperative dispatch loop: run due timeouts, run work, then
    /// ask the backend `poll` for more events. When `poll` reports
    /// nothing pending, sleep until the next deadline and return.
    pub fn dispatch(&self, mut poll: impl FnMut() -> bool) {
        loop {
            self.run_timeouts();
            self.run_work();

            if !poll() {
                if let Some(delay) = self.timeout_delay() {
                    if delay > Duration::from_millis(0) {
                        trace!("dispatch sleeping {:?}", delay);
                        std::thread::sleep(delay);
                    }
                }
                break;
            }
        }
    }

    pub fn pending_work(&self) -> usize {
        self.rc.borrow().works.len()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.rc.borrow().timeouts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn work_runs_in_priority_order() {
        let d = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for &(pri, tag) in &[(WORK_LAYOUT, 'l'), (WORK_REDISPLAY, 'r'), (WORK_PAINT, 'p')] {
            let log = log.clone();
            d.set_work(pri, move || {
                log.borrow_mut().push(tag);
                false
            });
        }
        d.run_work();
        assert_eq!(*log.borrow(), ['r', 'p', 'l']);
        assert_eq!(d.pending_work(), 0);
    }

    #[test]
    fn work_returning_true_stays_queued() {
        let d = Dispatcher::new();
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            d.set_work(WORK_PAINT, move || {
                *count.borrow_mut() += 1;
                *count.borrow() < 3
            });
        }
        d.run_work();
        d.run_work();
        d.run_work();
        d.run_work();
        assert_eq!(*count.borrow(), 3);
        assert_eq!(d.pending_work(), 0);
    }

    #[test]
    fn work_may_clear_other_work_mid_pass() {
        let d = Dispatcher::new();
        let hit = Rc::new(RefCell::new(false));

        let victim = {
            let hit = hit.clone();
            d.set_work(WORK_PAINT, move || {
                *hit.borrow_mut() = true;
                true
            })
        };
        {
            let d2 = d.clone();
            d.set_work(WORK_REDISPLAY, move || {
                d2.clear_work(victim);
                false
            });
        }
        d.run_work();
        // the victim was cleared by the earlier-priority work before
        // its turn came - spec work-queue reachability invariant
        assert!(!*hit.borrow());
        assert_eq!(d.pending_work(), 0);
    }

    #[test]
    fn work_may_queue_more_work() {
        let d = Dispatcher::new();
        let ran = Rc::new(RefCell::new(0));
        {
            let d2 = d.clone();
            let ran = ran.clone();
            d.set_work(WORK_PAINT, move || {
                let ran3 = ran.clone();
                d2.set_work(WORK_PAINT, move || {
                    *ran3.borrow_mut() += 10;
                    false
                });
                *ran.borrow_mut() += 1;
                false
            });
        }
        d.run_work();
        assert_eq!(*ran.borrow(), 1);
        // queued during the pass, runs on the next one
        d.run_work();
        assert_eq!(*ran.borrow(), 11);
    }

    #[test]
    fn timeout_head_is_min_deadline() {
        let d = Dispatcher::new();
        // spec property 7: arbitrary insertions keep the head minimal
        for &ms in &[500u64, 100, 300, 700, 200] {
            d.set_timeout(Duration::from_millis(ms), |_| None);
        }
        let s = d.rc.borrow();
        let times: Vec<_> = s.timeouts.iter().map(|t| t.time).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
    }

    #[test]
    fn timeout_reschedules_and_stays_ordered() {
        // spec scenario S5 on a simulated clock: +100ms firing, proc asks
        // for 50ms more each time
        let d = Dispatcher::new();
        let fired = Rc::new(RefCell::new(Vec::new()));
        {
            let fired = fired.clone();
            d.set_timeout(Duration::from_millis(100), move |now| {
                fired.borrow_mut().push(now);
                Some(Duration::from_millis(50))
            });
        }

        // the armed deadline is now()-relative; anchor expectations on it
        let t0 = d.rc.borrow().timeouts.head().unwrap().time;

        for now in 0..=t0 + 200 {
            // head must always be the earliest deadline before a pass
            {
                let s = d.rc.borrow();
                let head = s.timeouts.head().map(|t| t.time);
                let min = s.timeouts.iter().map(|t| t.time).min();
                assert_eq!(head, min);
            }
            d.run_timeouts_at(now);
        }
        assert_eq!(*fired.borrow(), [t0, t0 + 50, t0 + 100, t0 + 150, t0 + 200]);
    }

    #[test]
    fn timeout_cancels_with_none() {
        let d = Dispatcher::new();
        let count = Rc::new(RefCell::new(0));
        {
            let count = count.clone();
            d.set_timeout(Duration::from_millis(10), move |_| {
                *count.borrow_mut() += 1;
                None
            });
        }
        d.run_timeouts_at(50);
        d.run_timeouts_at(100);
        assert_eq!(*count.borrow(), 1);
        assert_eq!(d.pending_timeouts(), 0);
    }

    #[test]
    fn timeout_may_clear_itself() {
        let d = Dispatcher::new();
        let handle = Rc::new(RefCell::new(None));
        {
            let d2 = d.clone();
            let handle2 = handle.clone();
            let h = d.set_timeout(Duration::from_millis(1), move |_| {
                // clearing ourselves mid-proc must not fight the
                // reschedule bookkeeping
                d2.clear_timeout(handle2.borrow().unwrap());
                Some(Duration::from_millis(1))
            });
            *handle.borrow_mut() = Some(h);
        }
        d.run_timeouts_at(10);
        assert_eq!(d.pending_timeouts(), 0);
    }

    #[test]
    fn dispatch_runs_one_tick() {
        let d = Dispatcher::new();
        let ran = Rc::new(RefCell::new(false));
        {
            let ran = ran.clone();
            d.set_work(WORK_PAINT, move || {
                *ran.borrow_mut() = true;
                false
            });
        }
        let mut polls = 0;
        d.dispatch(|| {
            polls += 1;
            false
        });
        assert!(*ran.borrow());
        assert_eq!(polls, 1);
    }

    #[test]
    fn timeout_delay_reports_head() {
        let d = Dispatcher::new();
        assert_eq!(d.timeout_delay(), None);
        d.set_timeout(Duration::from_secs(60), |_| None);
        let delay = d.timeout_delay().unwrap();
        assert!(delay <= Duration::from_secs(60));
        assert!(delay >= Duration::from_secs(59));
    }
}
