use glam::{Quat, Vec2, Vec3};

use crate::engine::transform::horizontal_angle;

use super::motion_state::MotionState;

/// Inputs below this magnitude count as no input.
pub const DEFAULT_DEAD_ZONE: f32 = 0.001;

/// Rotation targets closer than this many degrees count as reached.
pub const ROTATION_TOLERANCE: f32 = 0.5;

/// Where the controller gets its input from when no simulated target is set.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InputMode {
    /// A stick style value supplied from outside, relative to the camera.
    #[default]
    User,
    /// Derive input from how the actor is actually moving.
    TrackTransform,
}

/// Supplies user input every tick.
pub trait InputSource: Send + Sync {
    /// Stick value with `x` to the right and `y` forward.
    fn movement(&self) -> Vec2;

    /// World space forward of the camera the input is relative to.
    fn camera_forward(&self) -> Option<Vec3> {
        None
    }
}

/// Movement goals that stand in for user input, e.g. for AI driven actors.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionTargets {
    pub position: Option<Vec3>,
    /// Input magnitude used while walking to `position`, in `[0, 1]`.
    pub normalized_speed: f32,
    /// Desired velocity. Its horizontal speed relative to the controller's max speed is
    /// used as the input magnitude.
    pub velocity: Option<Vec3>,
    pub rotation: Option<Quat>,
    /// Forces the forward the input angle is measured from while tracking.
    pub forward: Option<Vec3>,
}

impl MotionTargets {
    #[inline]
    pub fn has_movement(&self) -> bool {
        self.position.is_some() || self.velocity.is_some()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Input for one tick after it was converted into magnitude and angles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResolvedInput {
    pub x: f32,
    pub y: f32,
    /// World space direction of the input, zero when there is none.
    pub forward: Vec3,
    pub magnitude: f32,
    pub avatar_angle: f32,
    pub camera_angle: f32,
}

impl ResolvedInput {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        forward: Vec3::ZERO,
        magnitude: 0.0,
        avatar_angle: 0.0,
        camera_angle: 0.0,
    };

    /// Convert a stick value relative to `camera_forward` into world space input.
    pub fn from_user(
        stick: Vec2,
        actor_forward: Vec3,
        camera_forward: Option<Vec3>,
        dead_zone: f32,
    ) -> Self {
        let magnitude = stick.length().min(1.0);
        if !(magnitude > dead_zone) {
            return Self::ZERO;
        }

        let camera_forward = flatten(camera_forward.unwrap_or(Vec3::Z)).unwrap_or(Vec3::Z);
        let camera_right = Vec3::Y.cross(camera_forward);
        let forward = (camera_forward * stick.y + camera_right * stick.x).normalize_or_zero();

        Self {
            x: stick.x,
            y: stick.y,
            forward,
            magnitude,
            avatar_angle: horizontal_angle(actor_forward, forward),
            camera_angle: horizontal_angle(camera_forward, forward),
        }
    }

    /// Build a pseudo stick value for moving along `direction` at `speed`.
    ///
    /// The angle is measured from `reference_forward` (the actor's forward, or a forced
    /// target forward) and the stick is `(sin(angle), cos(angle)) * speed`.
    pub fn from_direction(
        direction: Vec3,
        speed: f32,
        reference_forward: Vec3,
        camera_forward: Option<Vec3>,
        dead_zone: f32,
    ) -> Self {
        let Some(forward) = flatten(direction) else {
            return Self::ZERO;
        };
        if !(speed > dead_zone) {
            return Self::ZERO;
        }

        let angle = horizontal_angle(reference_forward, forward);
        let radians = angle.to_radians();

        Self {
            x: radians.sin() * speed,
            y: radians.cos() * speed,
            forward,
            magnitude: speed,
            avatar_angle: angle,
            camera_angle: horizontal_angle(camera_forward.unwrap_or(Vec3::Z), forward),
        }
    }

    /// Store the input in `state` and push the magnitude into its trend window.
    pub fn apply(&self, state: &mut MotionState) {
        state.input_x = self.x;
        state.input_y = self.y;
        state.input_forward = self.forward;
        state.input_from_avatar_angle = self.avatar_angle;
        state.input_from_camera_angle = self.camera_angle;
        state.input_magnitude.push(self.magnitude);
    }
}

/// Horizontal unit vector of `vector`, or `None` when it is (nearly) vertical.
fn flatten(vector: Vec3) -> Option<Vec3> {
    let flat = Vec3::new(vector.x, 0.0, vector.z);
    (flat.length_squared() > f32::EPSILON).then(|| flat.normalize())
}
