//! Frame-driven numeric tweening.
//!
//! `animate` interpolates one scalar over a duration and reports every
//! intermediate value. It never dedupes: the last caller must cancel the
//! previous handle. `AnimatedValue` wraps that rule for a single displayed
//! scalar.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

/// Callback invoked with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Source of animation frames. Dropping the returned handle cancels the frame.
pub trait FrameScheduler {
    type Handle: 'static;

    fn schedule(&self, callback: FrameCallback) -> Self::Handle;
}

/// Ease-out cubic on `[0, 1]`.
pub fn ease_out_cubic(progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

/// Interpolated value at `elapsed_secs`; exactly `to` once the duration has passed.
pub fn value_at(from: f64, to: f64, duration_secs: f64, elapsed_secs: f64) -> f64 {
    if duration_secs <= 0.0 || !duration_secs.is_finite() || elapsed_secs >= duration_secs {
        return to;
    }
    if elapsed_secs <= 0.0 {
        return from;
    }
    from + (to - from) * ease_out_cubic(elapsed_secs / duration_secs)
}

struct Run<H> {
    from: f64,
    to: f64,
    duration_secs: f64,
    started_at: Cell<Option<f64>>,
    cancelled: Cell<bool>,
    finished: Cell<bool>,
    pending: RefCell<Option<H>>,
    on_update: RefCell<Box<dyn FnMut(f64)>>,
}

/// Cancellation handle for one running interpolation.
///
/// Dropping the handle cancels the run.
pub struct AnimationHandle {
    cancel: Option<Box<dyn FnOnce()>>,
    finished: Rc<dyn Fn() -> bool>,
}

impl AnimationHandle {
    /// Stop the run. No `on_update` call happens after this returns.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_finished(&self) -> bool {
        (self.finished)()
    }
}

impl Drop for AnimationHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for AnimationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("cancelled", &self.cancel.is_none())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Interpolate `from` → `to` over `duration_secs`, one `on_update` per frame.
///
/// The first frame reports `from`; the last reports exactly `to`.
pub fn animate<S>(
    scheduler: &S,
    from: f64,
    to: f64,
    duration_secs: f64,
    on_update: impl FnMut(f64) + 'static,
) -> AnimationHandle
where
    S: FrameScheduler + Clone + 'static,
{
    let run = Rc::new(Run {
        from,
        to,
        duration_secs,
        started_at: Cell::new(None),
        cancelled: Cell::new(false),
        finished: Cell::new(false),
        pending: RefCell::new(None),
        on_update: RefCell::new(Box::new(on_update)),
    });

    schedule_frame(scheduler.clone(), Rc::downgrade(&run));

    let cancel_run = Rc::clone(&run);
    let finished_run = Rc::clone(&run);
    AnimationHandle {
        cancel: Some(Box::new(move || {
            cancel_run.cancelled.set(true);
            // Dropping the pending frame handle unschedules it.
            cancel_run.pending.borrow_mut().take();
        })),
        finished: Rc::new(move || finished_run.finished.get()),
    }
}

fn schedule_frame<S>(scheduler: S, run: Weak<Run<S::Handle>>)
where
    S: FrameScheduler + Clone + 'static,
{
    let Some(strong) = run.upgrade() else { return };
    let next_scheduler = scheduler.clone();
    let handle = scheduler.schedule(Box::new(move |now_ms| on_frame(next_scheduler, run, now_ms)));
    *strong.pending.borrow_mut() = Some(handle);
}

fn on_frame<S>(scheduler: S, run: Weak<Run<S::Handle>>, now_ms: f64)
where
    S: FrameScheduler + Clone + 'static,
{
    let Some(strong) = run.upgrade() else { return };
    if strong.cancelled.get() || strong.finished.get() {
        return;
    }
    strong.pending.borrow_mut().take();

    let started = match strong.started_at.get() {
        Some(started) => started,
        None => {
            strong.started_at.set(Some(now_ms));
            now_ms
        }
    };
    let elapsed_secs = (now_ms - started) / 1000.0;
    let value = if strong.from.is_finite() && strong.to.is_finite() {
        value_at(strong.from, strong.to, strong.duration_secs, elapsed_secs)
    } else {
        strong.to
    };
    let done = !(strong.from.is_finite() && strong.to.is_finite())
        || !strong.duration_secs.is_finite()
        || strong.duration_secs <= 0.0
        || elapsed_secs >= strong.duration_secs;

    (strong.on_update.borrow_mut())(value);

    // `on_update` may have cancelled us.
    if strong.cancelled.get() {
        return;
    }
    if done {
        strong.finished.set(true);
    } else {
        schedule_frame(scheduler, run);
    }
}

/// One displayed scalar with at-most-one active interpolation.
///
/// A new target supersedes the running one; the next run starts from the
/// value currently on screen. Jumps of at least `restart_threshold` restart
/// from `origin` instead, so a large change replays the full sweep.
pub struct AnimatedValue<S: FrameScheduler + Clone + 'static> {
    scheduler: S,
    duration_secs: f64,
    restart_threshold: Option<f64>,
    origin: f64,
    displayed: Rc<Cell<f64>>,
    target: f64,
    sink: Rc<dyn Fn(f64)>,
    active: Option<AnimationHandle>,
}

impl<S: FrameScheduler + Clone + 'static> AnimatedValue<S> {
    pub fn new(scheduler: S, initial: f64, duration_secs: f64, sink: impl Fn(f64) + 'static) -> Self {
        Self {
            scheduler,
            duration_secs,
            restart_threshold: None,
            origin: 0.0,
            displayed: Rc::new(Cell::new(initial)),
            target: initial,
            sink: Rc::new(sink),
            active: None,
        }
    }

    pub fn with_restart_threshold(mut self, threshold: f64, origin: f64) -> Self {
        self.restart_threshold = Some(threshold);
        self.origin = origin;
        self
    }

    pub fn displayed(&self) -> f64 {
        self.displayed.get()
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.active.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Retarget: cancel the running interpolation, then start a new one.
    pub fn set_target(&mut self, to: f64) {
        if to == self.target && (self.is_animating() || self.displayed.get() == to) {
            return;
        }
        if let Some(mut previous) = self.active.take() {
            previous.cancel();
        }
        let current = self.displayed.get();
        let from = match self.restart_threshold {
            Some(threshold) if (to - current).abs() >= threshold => self.origin,
            _ => current,
        };
        self.target = to;

        let displayed = Rc::clone(&self.displayed);
        let sink = Rc::clone(&self.sink);
        self.active = Some(animate(&self.scheduler, from, to, self.duration_secs, move |value| {
            displayed.set(value);
            sink(value);
        }));
    }

    /// Cancel without retargeting (unmount).
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.active.take() {
            handle.cancel();
        }
    }
}

impl<S: FrameScheduler + Clone + 'static> Drop for AnimatedValue<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Deterministic scheduler: frames fire only when the clock is advanced.
#[derive(Clone, Default)]
pub struct ManualFrameScheduler {
    inner: Rc<ManualInner>,
}

#[derive(Default)]
struct ManualInner {
    now_ms: Cell<f64>,
    next_id: Cell<u64>,
    queue: RefCell<BTreeMap<u64, FrameCallback>>,
}

/// Pending frame of a `ManualFrameScheduler`; removes itself when dropped.
pub struct ManualFrame {
    id: u64,
    inner: Weak<ManualInner>,
}

impl Drop for ManualFrame {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            // try_borrow_mut: a frame dropped while the queue is being drained is already gone.
            if let Ok(mut queue) = inner.queue.try_borrow_mut() {
                queue.remove(&self.id);
            }
        }
    }
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> f64 {
        self.inner.now_ms.get()
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Fire every queued frame at the current time, without advancing it.
    pub fn tick(&self) -> usize {
        self.advance(0.0)
    }

    /// Move the clock forward and fire the frames that were queued before the call.
    pub fn advance(&self, delta_ms: f64) -> usize {
        self.inner.now_ms.set(self.inner.now_ms.get() + delta_ms);
        let due = std::mem::take(&mut *self.inner.queue.borrow_mut());
        let now = self.inner.now_ms.get();
        let fired = due.len();
        for (_, callback) in due {
            callback(now);
        }
        fired
    }

    /// Advance in fixed steps until `total_ms` has elapsed.
    pub fn run_for(&self, total_ms: f64, step_ms: f64) {
        let mut elapsed = 0.0;
        while elapsed < total_ms {
            let step = step_ms.min(total_ms - elapsed);
            self.advance(step);
            elapsed += step;
        }
    }
}

impl FrameScheduler for ManualFrameScheduler {
    type Handle = ManualFrame;

    fn schedule(&self, callback: FrameCallback) -> ManualFrame {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.queue.borrow_mut().insert(id, callback);
        ManualFrame { id, inner: Rc::downgrade(&self.inner) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_at_endpoints() {
        assert_eq!(value_at(0.0, 100.0, 0.5, 0.0), 0.0);
        assert_eq!(value_at(0.0, 100.0, 0.5, 0.5), 100.0);
        assert_eq!(value_at(3.0, -1.0, 0.0, 0.0), -1.0);
    }

    #[test]
    fn easing_is_monotonic() {
        let mut last = 0.0;
        for step in 0..=100 {
            let v = ease_out_cubic(step as f64 / 100.0);
            assert!(v >= last);
            last = v;
        }
        assert_eq!(last, 1.0);
    }
}
