use glam::Vec3;

use crate::motion::{
    message::MotionRef,
    motion::{CORE_FIELDS, Motion, MotionContext, MotionCore, MotionFlags},
    properties::{Field, ObjectRef, PropertyMap, load_fields, save_fields},
    reach::{ReachData, ReachKey},
};

/// Plays an interaction clip while pulling the actor's hand (or feet) onto a target.
///
/// Never starts on its own. While active it overrides later layers.
#[derive(Debug)]
pub struct Interact {
    core: MotionCore,
    /// Hash of the animator state that plays the interaction.
    pub state_id: i32,
    /// The object being interacted with. Resolving it is left to the host.
    pub target: ObjectRef,
    pub target_position: Vec3,
    /// Point on the actor, in local space, that should end up on `target_position`.
    pub anchor_offset: Vec3,
    pub reach_start: f32,
    pub reach_end: f32,
    pub reach_power: f32,
    /// Seconds the interaction runs for.
    pub duration: f32,
}

impl Interact {
    pub const KIND: &'static str = "Interact";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            core: MotionCore::new(name)
                .with_priority(20.0)
                .with_flags(MotionFlags::OVERRIDE_LAYERS),
            state_id: 0,
            target: ObjectRef::None,
            target_position: Vec3::ZERO,
            anchor_offset: Vec3::ZERO,
            reach_start: 0.0,
            reach_end: 0.5,
            reach_power: 1.0,
            duration: 1.5,
        }
    }
}

const INTERACT_FIELDS: &[Field<Interact>] = &[
    Field::int("AnimatorState", |m| m.state_id, |m, v| m.state_id = v),
    Field::reference("Target", |m| m.target.clone(), |m, v| m.target = v),
    Field::vec3(
        "TargetPosition",
        |m| m.target_position,
        |m, v| m.target_position = v,
    ),
    Field::vec3("AnchorOffset", |m| m.anchor_offset, |m, v| m.anchor_offset = v),
    Field::float("ReachStart", |m| m.reach_start, |m, v| m.reach_start = v),
    Field::float("ReachEnd", |m| m.reach_end, |m, v| m.reach_end = v),
    Field::float("ReachPower", |m| m.reach_power, |m, v| m.reach_power = v),
    Field::float("Duration", |m| m.duration, |m, v| m.duration = v),
];

impl Motion for Interact {
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

    fn activate(&mut self, _ctx: &mut MotionContext, _previous: Option<&MotionRef>) -> bool {
        let reach = match ReachData::new(
            ReachKey::State(self.state_id),
            self.target_position,
            self.reach_start,
            self.reach_end,
            self.reach_power,
        ) {
            Ok(reach) => reach.with_anchor_offset(self.anchor_offset),
            Err(err) => {
                tracing::warn!(motion = %self.core.name, "Can not start interaction. ({err})");
                return false;
            }
        };

        self.core.reach.clear();
        self.core.reach.push(reach);
        true
    }

    fn test_update(&mut self, _ctx: &MotionContext) -> bool {
        self.core.age() < self.duration
    }

    fn update(&mut self, _ctx: &mut MotionContext, _delta_time: f32, _update_index: u32) {}

    fn is_in_motion_state(&self, state_id: i32, _transition_id: i32) -> bool {
        self.state_id != 0 && state_id == self.state_id
    }

    fn save_properties(&self, map: &mut PropertyMap) {
        save_fields(CORE_FIELDS, &self.core, map);
        save_fields(INTERACT_FIELDS, self, map);
    }

    fn load_properties(&mut self, map: &PropertyMap) {
        load_fields(CORE_FIELDS, &mut self.core, map);
        load_fields(INTERACT_FIELDS, self, map);
    }
}
