//! Frame scheduling: the host's "call me before the next repaint" facility.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use web_time::Instant;

/// Handle of a pending frame request, used to cancel it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameRequestId(pub u64);

/// Callback run at the next frame with the frame timestamp, in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Schedules callbacks for the next display refresh.
///
/// On the web this is `requestAnimationFrame`
/// ([`AnimationFrameScheduler`](crate::web::AnimationFrameScheduler)); natively and in
/// tests the host pumps a [`ManualScheduler`].
pub trait FrameScheduler {
    /// Runs `callback` once, at the next frame.
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId;

    /// Cancels a request. Unknown or already-run requests are ignored.
    fn cancel_frame(&self, id: FrameRequestId);

    /// The current time on the frame clock, in milliseconds.
    fn now_ms(&self) -> f64;
}

/// A scheduler driven explicitly by its owner.
///
/// Requests pile up until [`run_frame`](Self::run_frame) is called. The clock is
/// the wall clock unless a time was pinned with [`set_time`](Self::set_time).
pub struct ManualScheduler {
    epoch: Instant,
    pinned_time: Cell<Option<f64>>,
    next_id: Cell<u64>,
    pending: RefCell<Vec<(FrameRequestId, FrameCallback)>>,
}

impl ManualScheduler {
    /// A scheduler with no pending request.
    pub fn new() -> Self {
        ManualScheduler {
            epoch: Instant::now(),
            pinned_time: Cell::new(None),
            next_id: Cell::new(1),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Pins the frame clock to `time_ms`.
    pub fn set_time(&self, time_ms: f64) {
        self.pinned_time.set(Some(time_ms));
    }

    /// Number of requests waiting for the next frame.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Runs every request pending at the time of the call and returns how many ran.
    ///
    /// Requests made by the callbacks themselves wait for the next call.
    pub fn run_frame(&self) -> usize {
        let now = self.now_ms();
        let batch = std::mem::take(&mut *self.pending.borrow_mut());
        let count = batch.len();

        for (_, callback) in batch {
            callback(now);
        }

        count
    }

    /// Pins the clock to `time_ms`, then runs a frame.
    pub fn run_frame_at(&self, time_ms: f64) -> usize {
        self.set_time(time_ms);
        self.run_frame()
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&self, callback: FrameCallback) -> FrameRequestId {
        let id = FrameRequestId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.pending.borrow_mut().push((id, callback));
        id
    }

    fn cancel_frame(&self, id: FrameRequestId) {
        self.pending.borrow_mut().retain(|(pending, _)| *pending != id);
    }

    fn now_ms(&self) -> f64 {
        self.pinned_time
            .get()
            .unwrap_or_else(|| self.epoch.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Host-side closures kept alive while their frame request is pending.
///
/// A closure handed to the host must outlive its request, and must be dropped when
/// the request is cancelled since the host will never call it. A closure cannot be
/// dropped while it runs, so the one that ran last is kept until the next one runs.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) struct RetainedClosures<C> {
    pending: HashMap<i32, C>,
    last_run: Option<C>,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl<C> RetainedClosures<C> {
    pub fn new() -> Self {
        RetainedClosures {
            pending: HashMap::new(),
            last_run: None,
        }
    }

    pub fn insert(&mut self, handle: i32, closure: C) {
        let _ = self.pending.insert(handle, closure);
    }

    /// Called from the closure of `handle` when the host runs it. Returns the
    /// closure that ran before, which has returned and can be dropped.
    pub fn mark_running(&mut self, handle: i32) -> Option<C> {
        let running = self.pending.remove(&handle);
        std::mem::replace(&mut self.last_run, running)
    }

    /// Removes the closure of a cancelled request.
    pub fn cancel(&mut self, handle: i32) -> Option<C> {
        self.pending.remove(&handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
