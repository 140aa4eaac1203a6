use glam::Vec3;

use crate::motion::{
    motion::{CORE_FIELDS, Motion, MotionContext, MotionCore},
    properties::{Field, PropertyMap, load_fields, save_fields},
};

/// Layer parameter while walking.
pub const PARAMETER_WALK: i32 = 1;
/// Layer parameter while running.
pub const PARAMETER_RUN: i32 = 2;

/// Walks or runs in the direction of the input, turning the actor towards it.
#[derive(Debug)]
pub struct Locomotion {
    core: MotionCore,
    /// Units per second at full input below the run threshold.
    pub walk_speed: f32,
    pub run_speed: f32,
    /// Input magnitude at which walking turns into running.
    pub run_threshold: f32,
    /// Degrees per second the actor may turn towards the input.
    pub rotation_speed: f32,
    pub require_grounded: bool,
    /// Hash of the animator state (usually a blend tree) that plays locomotion.
    pub state_id: i32,
}

impl Locomotion {
    pub const KIND: &'static str = "Locomotion";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: MotionCore::new(name).with_priority(1.0),
            walk_speed: 1.6,
            run_speed: 4.5,
            run_threshold: 0.6,
            rotation_speed: 360.0,
            require_grounded: true,
            state_id: 0,
        }
    }

    fn wants_to_move(&self, ctx: &MotionContext) -> bool {
        (!self.require_grounded || ctx.actor.is_grounded) && ctx.state.input_magnitude.value() > 0.0
    }
}

const LOCOMOTION_FIELDS: &[Field<Locomotion>] = &[
    Field::float("WalkSpeed", |m| m.walk_speed, |m, v| m.walk_speed = v),
    Field::float("RunSpeed", |m| m.run_speed, |m, v| m.run_speed = v),
    Field::float("RunThreshold", |m| m.run_threshold, |m, v| m.run_threshold = v),
    Field::float("RotationSpeed", |m| m.rotation_speed, |m, v| m.rotation_speed = v),
    Field::bool(
        "RequireGrounded",
        |m| m.require_grounded,
        |m, v| m.require_grounded = v,
    ),
    Field::int("AnimatorState", |m| m.state_id, |m, v| m.state_id = v),
];

impl Motion for Locomotion {
    fn core(&self) -> &MotionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MotionCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn test_activate(&mut self, ctx: &MotionContext) -> bool {
        self.wants_to_move(ctx)
    }

    fn test_update(&mut self, ctx: &MotionContext) -> bool {
        self.wants_to_move(ctx)
    }

    fn update(&mut self, ctx: &mut MotionContext, delta_time: f32, _update_index: u32) {
        let magnitude = ctx.state.input_magnitude.value();

        let (speed, parameter) = if magnitude >= self.run_threshold {
            (self.run_speed, PARAMETER_RUN)
        } else {
            (self.walk_speed, PARAMETER_WALK)
        };

        self.core.velocity = ctx.state.input_forward * speed * magnitude.min(1.0);
        self.core.parameter = parameter;

        // Turn as far towards the input as this step allows.
        let angle = ctx.state.input_from_avatar_angle;
        let turn_rate = if delta_time > 0.0 {
            (angle / delta_time).clamp(-self.rotation_speed, self.rotation_speed)
        } else {
            0.0
        };
        self.core.angular_velocity = Vec3::new(0.0, turn_rate, 0.0);
    }

    fn is_in_motion_state(&self, state_id: i32, _transition_id: i32) -> bool {
        self.state_id != 0 && state_id == self.state_id
    }

    fn save_properties(&self, map: &mut PropertyMap) {
        save_fields(CORE_FIELDS, &self.core, map);
        save_fields(LOCOMOTION_FIELDS, self, map);
    }

    fn load_properties(&mut self, map: &PropertyMap) {
        load_fields(CORE_FIELDS, &mut self.core, map);
        load_fields(LOCOMOTION_FIELDS, self, map);
    }
}
