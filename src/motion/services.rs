use glam::{Quat, Vec3};

use crate::engine::transform::Transform;

/// What the movement service reports about the actor at the start of a tick.
#[derive(Clone, Copy, Debug)]
pub struct ActorState {
    pub transform: Transform,
    /// World space velocity observed by the movement service in units per second.
    pub velocity: Vec3,
    pub is_grounded: bool,
    /// Free-form posture id passed straight through to the animator.
    pub stance: i32,
    /// The movement service already runs its own fixed-step loop, so motions should not
    /// sub-step on top of it.
    pub is_fixed_stepping: bool,
}

impl Default for ActorState {
    fn default() -> Self {
        Self {
            transform: Transform::default(),
            velocity: Vec3::ZERO,
            is_grounded: true,
            stance: 0,
            is_fixed_stepping: false,
        }
    }
}

/// The movement/collision service that actually displaces the character body.
pub trait ActorDriver: Send + Sync {
    fn state(&self) -> ActorState;

    /// Displace the actor by `movement` in world space. Called at most once per tick.
    fn move_by(&mut self, movement: Vec3);

    /// Rotate the actor by `yaw` around its up axis and apply `tilt` on top.
    fn rotate(&mut self, yaw: Quat, tilt: Quat);

    fn set_position(&mut self, position: Vec3);

    fn set_rotation(&mut self, rotation: Quat);
}

/// A state id plus how far through the state the animator is.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatorStateInfo {
    /// Hash of the full state path. `0` means no state.
    pub id: i32,
    /// Normalized time. The integer part counts loops.
    pub normalized_time: f32,
}

/// The transition the animator is currently blending through, `id == 0` when none.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatorTransitionInfo {
    pub id: i32,
    pub normalized_time: f32,
}

/// Displacement and rotation extracted from clips this frame, in actor local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMotion {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for RootMotion {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

/// The skeletal animation runtime that plays clips and blend trees.
///
/// Parameter names are plain strings; implementations are expected to cache their own
/// name to id lookups.
pub trait Animator: Send + Sync {
    fn layer_count(&self) -> usize;

    fn current_state(&self, layer: usize) -> AnimatorStateInfo;

    fn current_transition(&self, layer: usize) -> AnimatorTransitionInfo;

    /// Root motion accumulated since the last call.
    fn root_motion(&mut self) -> RootMotion {
        RootMotion::default()
    }

    fn set_integer(&mut self, name: &str, value: i32);

    fn set_float(&mut self, name: &str, value: f32);

    fn set_bool(&mut self, name: &str, value: bool);

    /// The hash the animator uses for a state or transition path.
    fn string_to_hash(&self, name: &str) -> i32;
}

/// Hook used to find the animator again when the controller lost it.
pub type AnimatorSource = Box<dyn FnMut() -> Option<Box<dyn Animator>> + Send + Sync>;
