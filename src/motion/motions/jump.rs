use glam::Vec3;

use crate::motion::{
    message::MotionRef,
    motion::{CORE_FIELDS, Motion, MotionContext, MotionCore},
    properties::{Field, PropertyMap, load_fields, save_fields},
};

pub const PHASE_RISING: i32 = 1;
pub const PHASE_FALLING: i32 = 2;

/// Launches the actor upwards and runs until it lands again.
///
/// Never starts on its own; activate it by name.
#[derive(Debug)]
pub struct Jump {
    core: MotionCore,
    /// Upward speed at take off, in units per second.
    pub impulse: f32,
    pub gravity: f32,
    /// Ignore being grounded for this long after take off.
    pub min_air_time: f32,

    vertical_speed: f32,
    carried: Vec3,
    /// Phase last requested on the animator.
    air_phase: i32,
}

impl Jump {
    pub const KIND: &'static str = "Jump";

    pub fn new(name: impl Into<String>) -> Self {
        let mut core = MotionCore::new(name).with_priority(10.0);
        core.is_interruptible = false;
        Self {
            core,
            impulse: 5.0,
            gravity: 9.81,
            min_air_time: 0.1,
            vertical_speed: 0.0,
            carried: Vec3::ZERO,
            air_phase: 0,
        }
    }

    #[inline]
    pub fn vertical_speed(&self) -> f32 {
        self.vertical_speed
    }

    #[inline]
    pub fn air_phase(&self) -> i32 {
        self.air_phase
    }

    fn request_phase(&mut self, ctx: &mut MotionContext, phase: i32) {
        if self.air_phase != phase {
            self.air_phase = phase;
            ctx.set_phase(phase, false);
        }
    }
}

const JUMP_FIELDS: &[Field<Jump>] = &[
    Field::float("Impulse", |m| m.impulse, |m, v| m.impulse = v),
    Field::float("Gravity", |m| m.gravity, |m, v| m.gravity = v),
    Field::float("MinAirTime", |m| m.min_air_time, |m, v| m.min_air_time = v),
];

impl Motion for Jump {
    fn core(&self) -> &MotionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MotionCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn test_activate(&mut self, _ctx: &MotionContext) -> bool {
        false
    }

    fn activate(&mut self, ctx: &mut MotionContext, _previous: Option<&MotionRef>) -> bool {
        let velocity = ctx.actor.velocity;
        self.carried = Vec3::new(velocity.x, 0.0, velocity.z);
        self.vertical_speed = self.impulse;
        self.air_phase = 0;
        self.request_phase(ctx, PHASE_RISING);
        true
    }

    fn deactivate(&mut self, ctx: &mut MotionContext) {
        self.request_phase(ctx, 0);
    }

    fn test_update(&mut self, ctx: &MotionContext) -> bool {
        let landed = ctx.actor.is_grounded
            && self.core.age() >= self.min_air_time
            && self.vertical_speed <= 0.0;
        !landed
    }

    fn update(&mut self, ctx: &mut MotionContext, delta_time: f32, _update_index: u32) {
        self.vertical_speed -= self.gravity * delta_time;
        self.core.velocity = self.carried + Vec3::Y * self.vertical_speed;

        let phase = if self.vertical_speed > 0.0 {
            PHASE_RISING
        } else {
            PHASE_FALLING
        };
        self.request_phase(ctx, phase);
    }

    fn save_properties(&self, map: &mut PropertyMap) {
        save_fields(CORE_FIELDS, &self.core, map);
        save_fields(JUMP_FIELDS, self, map);
    }

    fn load_properties(&mut self, map: &PropertyMap) {
        load_fields(CORE_FIELDS, &mut self.core, map);
        load_fields(JUMP_FIELDS, self, map);
    }
}
