use gloo::render::{AnimationFrame, request_animation_frame};

use crate::domain::animation::{FrameCallback, FrameScheduler};

/// `requestAnimationFrame`-backed scheduler. Dropping the returned
/// [`AnimationFrame`] cancels the pending callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserFrameScheduler;

impl FrameScheduler for BrowserFrameScheduler {
    type Handle = AnimationFrame;

    fn schedule(&self, callback: FrameCallback) -> AnimationFrame {
        request_animation_frame(callback)
    }
}
