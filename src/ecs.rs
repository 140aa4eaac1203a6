use bevy_ecs::{message::Messages, prelude::*};

use crate::motion::{message::MotionMessage, motion_controller::MotionController};

/// Seconds since the previous frame, set by the host before running the schedule.
#[derive(Debug, Default, Resource)]
pub struct FrameDelta {
    pub delta_time: f32,
}

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MotionSystems {
    Update,
}

/// Register the motion resources and systems.
pub fn add_motion_systems(world: &mut World, schedule: &mut Schedule) {
    world.init_resource::<FrameDelta>();
    world.init_resource::<Messages<MotionMessage>>();

    schedule.add_systems(
        (rotate_motion_messages, update_motion_controllers)
            .chain()
            .in_set(MotionSystems::Update),
    );
}

/// Drop messages older than a frame so readers only ever see recent ones.
fn rotate_motion_messages(mut messages: ResMut<Messages<MotionMessage>>) {
    messages.update();
}

/// Tick every controller once and forward the messages they dispatched.
pub fn update_motion_controllers(
    frame_delta: Res<FrameDelta>,
    mut controllers: Query<(Entity, &mut MotionController)>,
    mut messages: MessageWriter<MotionMessage>,
) {
    let delta_time = frame_delta.delta_time;

    let mut forward = |entity: Entity, controller: &mut MotionController| {
        for mut message in controller.drain_messages() {
            message.entity = Some(entity);
            messages.write(message);
        }
    };

    for (entity, mut controller) in controllers.iter_mut() {
        // Messages from calls made between frames, before the update drops them.
        forward(entity, &mut *controller);
        controller.update(delta_time);
        forward(entity, &mut *controller);
    }
}
