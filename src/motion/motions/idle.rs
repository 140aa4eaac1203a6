use crate::motion::{
    motion::{CORE_FIELDS, Motion, MotionContext, MotionCore, MotionFlags},
    properties::{Field, PropertyMap, load_fields, save_fields},
};

/// The resting motion of a layer. Always willing to run, at the lowest priority.
#[derive(Debug)]
pub struct Idle {
    core: MotionCore,
    /// Hash of the animator state that plays the idle.
    pub state_id: i32,
}

impl Idle {
    pub const KIND: &'static str = "Idle";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: MotionCore::new(name).with_flags(MotionFlags::IDLE),
            state_id: 0,
        }
    }
}

const IDLE_FIELDS: &[Field<Idle>] = &[Field::int(
    "AnimatorState",
    |m| m.state_id,
    |m, v| m.state_id = v,
)];

impl Motion for Idle {
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
        true
    }

    fn update(&mut self, _ctx: &mut MotionContext, _delta_time: f32, _update_index: u32) {}

    fn is_in_motion_state(&self, state_id: i32, _transition_id: i32) -> bool {
        self.state_id != 0 && state_id == self.state_id
    }

    fn save_properties(&self, map: &mut PropertyMap) {
        save_fields(CORE_FIELDS, &self.core, map);
        save_fields(IDLE_FIELDS, self, map);
    }

    fn load_properties(&mut self, map: &PropertyMap) {
        load_fields(CORE_FIELDS, &mut self.core, map);
        load_fields(IDLE_FIELDS, self, map);
    }
}
