mod idle;
mod interact;
mod jump;
mod locomotion;

pub use idle::Idle;
pub use interact::Interact;
pub use jump::{Jump, PHASE_FALLING, PHASE_RISING};
pub use locomotion::{Locomotion, PARAMETER_RUN, PARAMETER_WALK};
