pub mod fixed_step;
pub mod input;
pub mod message;
#[allow(clippy::module_inception)]
pub mod motion;
pub mod motion_controller;
pub mod motion_layer;
pub mod motion_state;
pub mod motions;
pub mod properties;
pub mod reach;
pub mod registry;
pub mod services;
pub mod wait;

pub mod prelude {
    pub use super::input::{InputMode, InputSource, MotionTargets};
    pub use super::message::{MessageKind, MotionListener, MotionMessage, MotionRef};
    pub use super::motion::{Motion, MotionContext, MotionCore, MotionFlags};
    pub use super::motion_controller::{ControllerSettings, MotionController, PhaseClearType};
    pub use super::motion_layer::MotionLayer;
    pub use super::motion_state::{MotionState, Trend};
    pub use super::registry::MotionRegistry;
    pub use super::services::{ActorDriver, ActorState, Animator, RootMotion};
    pub use super::wait::MotionWait;
}
