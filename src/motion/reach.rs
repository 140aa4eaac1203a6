use glam::Vec3;

use super::motion_state::AnimatorLayerState;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ReachError {
    #[error("Reach window must end after it starts (start: {start}, end: {end})")]
    InvalidWindow { start: f32, end: f32 },

    #[error("Reach power must be a positive number (power: {0})")]
    InvalidPower(f32),
}

/// The animator state or transition whose normalized time drives a [ReachData].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReachKey {
    State(i32),
    Transition(i32),
}

impl ReachKey {
    /// Progress of the keyed state/transition, or `None` when it is not the current one.
    fn progress(&self, layer: &AnimatorLayerState) -> Option<f32> {
        match *self {
            ReachKey::State(id) if id != 0 && layer.state_id == id => Some(layer.state_time),
            ReachKey::Transition(id) if id != 0 && layer.transition_id == id => {
                Some(layer.transition_time)
            }
            _ => None,
        }
    }
}

/// Nudges the actor towards `target` while part of an animation plays.
///
/// Between `start` and `end` the anchor follows an eased curve towards the target, so the
/// result does not depend on how many frames the window was sampled in. Once progress
/// passes `end` the full remaining distance is returned one last time and the record is done.
#[derive(Clone, Debug, PartialEq)]
pub struct ReachData {
    pub key: ReachKey,
    pub target: Vec3,
    pub start: f32,
    pub end: f32,
    pub power: f32,
    /// Point on the actor that should end up on `target`, in actor local space.
    pub anchor_offset: Vec3,
    eased: f32,
    is_complete: bool,
}

impl ReachData {
    pub fn new(
        key: ReachKey,
        target: Vec3,
        start: f32,
        end: f32,
        power: f32,
    ) -> Result<Self, ReachError> {
        if !(end > start) {
            return Err(ReachError::InvalidWindow { start, end });
        }
        if !(power > 0.0) {
            return Err(ReachError::InvalidPower(power));
        }

        Ok(Self {
            key,
            target,
            start,
            end,
            power,
            anchor_offset: Vec3::ZERO,
            eased: 0.0,
            is_complete: false,
        })
    }

    pub fn with_anchor_offset(mut self, anchor_offset: Vec3) -> Self {
        self.anchor_offset = anchor_offset;
        self
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn reset(&mut self) {
        self.eased = 0.0;
        self.is_complete = false;
    }

    /// Movement required this tick for an anchor currently at `anchor`.
    pub fn step(&mut self, progress: f32, anchor: Vec3) -> Vec3 {
        if self.is_complete || progress <= self.start {
            return Vec3::ZERO;
        }

        let remaining = self.target - anchor;

        if progress >= self.end {
            self.is_complete = true;
            self.eased = 1.0;
            return remaining;
        }

        let fraction = ((progress - self.start) / (self.end - self.start)).powf(self.power);
        if fraction <= self.eased {
            return Vec3::ZERO;
        }

        // `remaining` covers (1 - eased) of the curve; move along the part we just crossed.
        let weight = (fraction - self.eased) / (1.0 - self.eased);
        self.eased = fraction;
        remaining * weight
    }
}

/// Sum the movement of every incomplete record whose state or transition is playing.
///
/// `anchor` is the actor's anchor in world space before any reach movement is applied.
pub fn accumulate(
    reach: &mut [ReachData],
    layer: &AnimatorLayerState,
    actor_position: Vec3,
    actor_rotation: glam::Quat,
) -> Vec3 {
    let mut total = Vec3::ZERO;

    for data in reach.iter_mut().filter(|data| !data.is_complete) {
        let Some(progress) = data.key.progress(layer) else {
            continue;
        };

        let anchor = actor_position + actor_rotation * data.anchor_offset + total;
        total += data.step(progress, anchor);
    }

    total
}
