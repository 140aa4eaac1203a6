use std::task::Poll;

use super::motion_controller::MotionController;

/// Handle returned when activating a motion that the caller wants to wait on.
///
/// Poll it once per tick. It completes once the motion is neither active nor queued. There is
/// no timeout: a motion that never finishes keeps the handle pending.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MotionWait {
    pub layer: usize,
    pub index: usize,
}

impl MotionWait {
    pub fn poll(&self, controller: &MotionController) -> Poll<()> {
        let Some(motion) = controller.motion(self.layer, self.index) else {
            return Poll::Ready(());
        };

        let core = motion.core();
        if core.is_active() || core.is_queued() {
            Poll::Pending
        } else {
            Poll::Ready(())
        }
    }
}
