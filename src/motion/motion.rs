use bitflags::bitflags;
use glam::{Quat, Vec3};

use super::{
    fixed_step::FixedStep,
    message::MotionRef,
    motion_state::{AnimatorLayerState, MotionState},
    properties::{Field, PropertyMap, load_fields, save_fields},
    reach::{self, ReachData, ReachError},
    services::{ActorState, RootMotion},
};

bitflags! {
    /// Behavior flags a motion declares to its layer and controller.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct MotionFlags: u32 {
        /// While active, every later layer that does not ignore overrides drops back to its
        /// idle motion.
        const OVERRIDE_LAYERS = 1 << 0;
        /// This is the layer's resting motion, the one queued when a layer is overridden.
        const IDLE = 1 << 1;
        /// Skip the default activation phase write even when no listener handled it.
        const SILENT_ACTIVATION = 1 << 2;
    }
}

/// Data every motion carries, regardless of what it does.
#[derive(Clone, Debug)]
pub struct MotionCore {
    pub name: String,
    /// Free-form tags used to query groups of motions.
    pub category: String,
    pub pack: String,
    /// Higher wins when several motions want to start on the same layer.
    pub priority: f32,
    pub is_enabled: bool,
    /// Whether a higher priority motion may take over while this one runs.
    pub is_interruptible: bool,
    /// Value written to the layer's form parameter while this motion is active.
    pub form: i32,
    /// Phase written to the animator when this motion activates. `0` writes nothing.
    pub activation_phase: i32,
    /// Seconds after deactivating before `test_activate` is consulted again.
    pub reactivation_delay: f32,
    /// When positive, `update` runs at this fixed rate instead of once per frame.
    pub fixed_update_fps: f32,
    pub flags: MotionFlags,

    /// Value written to the layer's parameter while this motion is active.
    pub parameter: i32,

    /// Units per second the motion wants to move the actor, in world space.
    pub velocity: Vec3,
    /// Displacement requested this tick, on top of `velocity`.
    pub movement: Vec3,
    /// Degrees per second around each axis.
    pub angular_velocity: Vec3,
    pub rotation: Quat,
    pub tilt: Quat,
    pub reach: Vec<ReachData>,

    is_active: bool,
    is_queued: bool,
    age: f32,
    deactivation_time: Option<f32>,
    fixed_step: FixedStep,
}

impl MotionCore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            pack: String::new(),
            priority: 0.0,
            is_enabled: true,
            is_interruptible: true,
            form: 0,
            activation_phase: 0,
            reactivation_delay: 0.0,
            fixed_update_fps: 0.0,
            flags: MotionFlags::empty(),
            parameter: 0,
            velocity: Vec3::ZERO,
            movement: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            tilt: Quat::IDENTITY,
            reach: Vec::new(),
            is_active: false,
            is_queued: false,
            age: 0.0,
            deactivation_time: None,
            fixed_step: FixedStep::default(),
        }
    }

    pub fn with_priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_flags(mut self, flags: MotionFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.is_queued
    }

    #[inline]
    pub(crate) fn set_queued(&mut self, queued: bool) {
        self.is_queued = queued;
    }

    /// Seconds since the motion was activated.
    #[inline]
    pub fn age(&self) -> f32 {
        self.age
    }

    #[inline]
    pub fn deactivation_time(&self) -> Option<f32> {
        self.deactivation_time
    }

    /// Return true when all `flags` are set on this motion.
    #[inline]
    pub fn has_flags(&self, flags: MotionFlags) -> bool {
        self.flags.contains(flags)
    }

    /// Return whether the category list contains `category`. Categories are separated by
    /// commas and compared without case.
    pub fn has_category(&self, category: &str) -> bool {
        self.category
            .split(',')
            .any(|c| c.trim().eq_ignore_ascii_case(category.trim()))
    }

    /// Whether `test_activate` should be consulted at controller time `time`.
    pub fn can_start(&self, time: f32) -> bool {
        self.is_enabled
            && !self.is_active
            && self
                .deactivation_time
                .is_none_or(|deactivated| time - deactivated >= self.reactivation_delay)
    }

    /// Register a reach record, rejecting invalid windows.
    pub fn add_reach(&mut self, data: ReachData) -> Result<(), ReachError> {
        if !(data.end > data.start) {
            return Err(ReachError::InvalidWindow {
                start: data.start,
                end: data.end,
            });
        }
        if !(data.power > 0.0) {
            return Err(ReachError::InvalidPower(data.power));
        }
        self.reach.push(data);
        Ok(())
    }

    fn clear_outputs(&mut self) {
        self.velocity = Vec3::ZERO;
        self.movement = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.rotation = Quat::IDENTITY;
        self.tilt = Quat::IDENTITY;
    }
}

impl Default for MotionCore {
    fn default() -> Self {
        Self::new("")
    }
}

/// Properties shared by every motion. Runtime-only state is not listed.
pub const CORE_FIELDS: &[Field<MotionCore>] = &[
    Field::text("Name", |m| m.name.clone(), |m, v| m.name = v),
    Field::text("Category", |m| m.category.clone(), |m, v| m.category = v),
    Field::text("Pack", |m| m.pack.clone(), |m, v| m.pack = v),
    Field::float("Priority", |m| m.priority, |m, v| m.priority = v),
    Field::bool("IsEnabled", |m| m.is_enabled, |m, v| m.is_enabled = v),
    Field::bool(
        "IsInterruptible",
        |m| m.is_interruptible,
        |m, v| m.is_interruptible = v,
    ),
    Field::int("Form", |m| m.form, |m, v| m.form = v),
    Field::int(
        "ActivationPhase",
        |m| m.activation_phase,
        |m, v| m.activation_phase = v,
    ),
    Field::float(
        "ReactivationDelay",
        |m| m.reactivation_delay,
        |m, v| m.reactivation_delay = v,
    ),
    Field::float(
        "FixedUpdateFps",
        |m| m.fixed_update_fps,
        |m, v| m.fixed_update_fps = v,
    ),
    Field::bool(
        "OverrideLayers",
        |m| m.has_flags(MotionFlags::OVERRIDE_LAYERS),
        |m, v| m.flags.set(MotionFlags::OVERRIDE_LAYERS, v),
    ),
    Field::bool(
        "IsIdle",
        |m| m.has_flags(MotionFlags::IDLE),
        |m, v| m.flags.set(MotionFlags::IDLE, v),
    ),
    Field::bool(
        "SilentActivation",
        |m| m.has_flags(MotionFlags::SILENT_ACTIVATION),
        |m, v| m.flags.set(MotionFlags::SILENT_ACTIVATION, v),
    ),
];

/// Everything a motion may look at or change while the controller runs it.
pub struct MotionContext<'a> {
    /// Controller clock in seconds.
    pub time: f32,
    /// Wall clock time since the previous tick.
    pub delta_time: f32,
    pub actor: &'a ActorState,
    pub state: &'a mut MotionState,
    pub previous: &'a MotionState,
    /// Index of the controller layer running the motion.
    pub layer_index: usize,
    pub animator_layer: usize,
    pub(crate) auto_clear: &'a mut AutoClear,
}

/// Tracks a phase that should reset itself once the animator picks it up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AutoClear {
    pub pending: bool,
    /// Transition that was playing when the phase was written.
    pub transition_id: i32,
}

impl MotionContext<'_> {
    /// Animator values of the motion's layer this tick.
    pub fn layer(&self) -> AnimatorLayerState {
        self.state
            .layer(self.layer_index)
            .copied()
            .unwrap_or_default()
    }

    /// Request `phase` on the motion's animator layer.
    ///
    /// With `auto_clear` the phase resets to `0` once the animator confirms the motion's
    /// state or moves on to another transition.
    pub fn set_phase(&mut self, phase: i32, auto_clear: bool) {
        let time = self.time;
        let Some(layer) = self.state.layer_mut(self.layer_index) else {
            return;
        };

        layer.phase = phase;
        if phase != 0 {
            layer.phase_set_time = time;
        }

        self.auto_clear.pending = auto_clear && phase != 0;
        self.auto_clear.transition_id = layer.transition_id;
    }
}

/// A single behavior the controller can run on one of its layers.
///
/// Implementations only decide what the motion wants. Arbitration, timing and bookkeeping
/// are done by the layer through [MotionCore].
pub trait Motion: Send + Sync {
    fn core(&self) -> &MotionCore;

    fn core_mut(&mut self) -> &mut MotionCore;

    /// Key the motion is registered under in the [super::registry::MotionRegistry].
    fn kind(&self) -> &'static str;

    /// Return whether the motion wants to start this tick.
    fn test_activate(&mut self, ctx: &MotionContext) -> bool;

    /// Return whether the motion wants to keep running after its update.
    fn test_update(&mut self, _ctx: &MotionContext) -> bool {
        true
    }

    /// Return whether `candidate` may take over from this motion.
    fn test_interruption(&mut self, _candidate: &MotionCore) -> bool {
        true
    }

    /// Called after the core was reset for a new activation. Return false to refuse.
    fn activate(&mut self, _ctx: &mut MotionContext, _previous: Option<&MotionRef>) -> bool {
        true
    }

    /// Called before the core is reset on deactivation.
    fn deactivate(&mut self, _ctx: &mut MotionContext) {}

    /// Advance the motion by `delta_time`. `update_index` counts the fixed steps taken this
    /// tick, starting at `1`.
    fn update(&mut self, ctx: &mut MotionContext, delta_time: f32, update_index: u32);

    /// Adjust the root motion reported by the animator. Only called for the first layer.
    fn update_root_motion(&mut self, _ctx: &MotionContext, _root_motion: &mut RootMotion) {}

    /// Return whether the animator state or transition belongs to this motion.
    fn is_in_motion_state(&self, _state_id: i32, _transition_id: i32) -> bool {
        false
    }

    fn on_animator_state_change(&mut self, _ctx: &mut MotionContext, _previous: i32, _state: i32) {
    }

    fn on_animator_ik(&mut self, _animator_layer: usize) {}

    fn save_properties(&self, map: &mut PropertyMap) {
        save_fields(CORE_FIELDS, self.core(), map);
    }

    fn load_properties(&mut self, map: &PropertyMap) {
        load_fields(CORE_FIELDS, self.core_mut(), map);
    }
}

impl std::fmt::Debug for dyn Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Motion")
            .field("kind", &self.kind())
            .field("name", &self.core().name)
            .field("is_active", &self.core().is_active)
            .finish()
    }
}

/// Reset `motion` for a new run and let it veto the activation.
pub(crate) fn begin_activation(
    motion: &mut dyn Motion,
    ctx: &mut MotionContext,
    previous: Option<&MotionRef>,
) -> bool {
    {
        let core = motion.core_mut();
        core.is_active = true;
        core.is_queued = false;
        core.age = 0.0;
        core.clear_outputs();
        core.fixed_step.reset();
        core.reach.iter_mut().for_each(ReachData::reset);
    }

    if !motion.activate(ctx, previous) {
        let core = motion.core_mut();
        core.is_active = false;
        core.clear_outputs();
        return false;
    }

    true
}

/// Stop `motion`, zero its outputs and stamp the deactivation time.
pub(crate) fn end_activation(motion: &mut dyn Motion, ctx: &mut MotionContext) {
    motion.deactivate(ctx);

    let core = motion.core_mut();
    core.is_active = false;
    core.clear_outputs();
    core.reach.clear();
    core.deactivation_time = Some(ctx.time);
}

/// Run one tick of `motion`, returning how many times `update` was called.
///
/// With a fixed update rate (and an actor that does not already fixed-step) the frame time
/// is accumulated and handed out in steps, at most
/// [MAX_CATCH_UP_STEPS](super::fixed_step::MAX_CATCH_UP_STEPS) per tick. Reach records are
/// applied once afterwards.
pub(crate) fn update_motion(motion: &mut dyn Motion, ctx: &mut MotionContext) -> u32 {
    let delta_time = ctx.delta_time;

    let (steps, step_time) = {
        let core = motion.core_mut();
        core.age += delta_time;
        core.movement = Vec3::ZERO;

        let fps = core.fixed_update_fps;
        if fps > 0.0 && !ctx.actor.is_fixed_stepping {
            (core.fixed_step.advance(delta_time, fps), 1.0 / fps)
        } else {
            (1, delta_time)
        }
    };

    for update_index in 1..=steps {
        motion.update(ctx, step_time, update_index);
    }

    let layer = ctx.layer();
    let transform = ctx.actor.transform;
    let core = motion.core_mut();
    if !core.reach.is_empty() {
        core.movement += reach::accumulate(
            &mut core.reach,
            &layer,
            transform.translation,
            transform.rotation,
        );
    }

    steps
}
