//! A self re-arming frame loop that can be cancelled at any time.

use crate::scheduler::{FrameRequestId, FrameScheduler};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Default)]
struct LoopToken {
    cancelled: Cell<bool>,
    pending: Cell<Option<FrameRequestId>>,
}

type FrameFn = Rc<RefCell<dyn FnMut(f64) -> bool>>;

/// Runs a closure once per frame until it returns `false` or the loop is cancelled.
///
/// Cancelling both withdraws the pending request and raises a flag checked by the
/// callback itself, so a frame already handed to the host never draws.
pub struct FrameLoop<S: FrameScheduler + 'static> {
    scheduler: Rc<S>,
    token: Rc<LoopToken>,
}

impl<S: FrameScheduler + 'static> FrameLoop<S> {
    /// Requests the first frame. `frame` receives the frame time in milliseconds.
    pub fn start(scheduler: Rc<S>, frame: impl FnMut(f64) -> bool + 'static) -> Self {
        let token = Rc::new(LoopToken::default());
        let frame: FrameFn = Rc::new(RefCell::new(frame));
        arm(&scheduler, &token, frame);

        FrameLoop { scheduler, token }
    }

    /// Stops the loop. Idempotent.
    pub fn cancel(&self) {
        self.token.cancelled.set(true);
        if let Some(id) = self.token.pending.take() {
            self.scheduler.cancel_frame(id);
        }
    }

    /// `true` once [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.token.cancelled.get()
    }
}

fn arm<S: FrameScheduler + 'static>(scheduler: &Rc<S>, token: &Rc<LoopToken>, frame: FrameFn) {
    let next_scheduler = scheduler.clone();
    let next_token = token.clone();

    let id = scheduler.request_frame(Box::new(move |time| {
        next_token.pending.set(None);
        if next_token.cancelled.get() {
            return;
        }

        let keep_going = {
            let mut frame = frame.borrow_mut();
            (*frame)(time)
        };
        if keep_going && !next_token.cancelled.get() {
            arm(&next_scheduler, &next_token, frame);
        }
    }));

    token.pending.set(Some(id));
}
