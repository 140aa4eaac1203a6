use bevy_ecs::prelude::*;
use glam::{EulerRot, Quat, Vec2, Vec3};

use crate::{
    config::controller_defs::{ControllerDefs, LayerDef, MotionDef},
    engine::{names::AnimatorNames, transform::normalize_rotation_or_identity},
};

use super::{
    fixed_step::FixedStep,
    input::{DEFAULT_DEAD_ZONE, InputMode, InputSource, MotionTargets, ROTATION_TOLERANCE, ResolvedInput},
    message::{MotionListener, MotionListeners, MotionMessage, MotionRef},
    motion::Motion,
    motion_layer::{LayerFrame, MotionLayer},
    motion_state::{AnimatorLayerState, MagnitudeGate, MotionState, Trend},
    properties::PropertyMap,
    registry::MotionRegistry,
    services::{ActorDriver, ActorState, Animator, AnimatorSource, RootMotion},
    wait::MotionWait,
};

/// Animator parameter names written by the controller.
pub mod parameters {
    pub const IS_GROUNDED: &str = "IsGrounded";
    pub const STANCE: &str = "Stance";
    pub const INPUT_X: &str = "InputX";
    pub const INPUT_Y: &str = "InputY";
    pub const INPUT_MAGNITUDE: &str = "InputMagnitude";
    pub const INPUT_MAGNITUDE_AVG: &str = "InputMagnitudeAvg";
    pub const INPUT_ANGLE_FROM_AVATAR: &str = "InputAngleFromAvatar";
    pub const INPUT_ANGLE_FROM_CAMERA: &str = "InputAngleFromCamera";

    pub fn layer_phase(layer: usize) -> String {
        format!("L{layer}MotionPhase")
    }

    pub fn layer_form(layer: usize) -> String {
        format!("L{layer}MotionForm")
    }

    pub fn layer_parameter(layer: usize) -> String {
        format!("L{layer}MotionParameter")
    }

    pub fn layer_state_time(layer: usize) -> String {
        format!("L{layer}MotionStateTime")
    }
}

/// How a phase going back to `0` reaches the animator.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PhaseClearType {
    /// Write whatever the layer holds every tick.
    #[default]
    Immediate,
    /// Keep a non-zero phase on the animator for at least the dwell time.
    Dwell,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControllerSettings {
    pub input_mode: InputMode,
    /// Position targets closer than this are considered reached.
    pub target_stop_distance: f32,
    /// When positive, animator parameters are only written on ticks where at least one
    /// step at this rate elapsed.
    pub fixed_update_fps: f32,
    pub phase_clear: PhaseClearType,
    pub phase_dwell_time: f32,
    /// Seconds the input magnitude is held after it changes direction.
    pub trend_delay: f32,
    pub dead_zone: f32,
    /// Horizontal speed that counts as full input when input comes from a velocity.
    pub max_speed: f32,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            input_mode: InputMode::User,
            target_stop_distance: 0.1,
            fixed_update_fps: 0.0,
            phase_clear: PhaseClearType::Immediate,
            phase_dwell_time: 0.1,
            trend_delay: 0.2,
            dead_zone: DEFAULT_DEAD_ZONE,
            max_speed: 4.5,
        }
    }
}

/// Per layer parameter names, built once instead of every tick.
#[derive(Debug)]
struct LayerParameterNames {
    phase: String,
    form: String,
    parameter: String,
    state_time: String,
}

impl LayerParameterNames {
    fn new(layer: usize) -> Self {
        Self {
            phase: parameters::layer_phase(layer),
            form: parameters::layer_form(layer),
            parameter: parameters::layer_parameter(layer),
            state_time: parameters::layer_state_time(layer),
        }
    }
}

/// Drives an actor by arbitrating motions on layers and keeps the animator in sync.
#[derive(Component)]
pub struct MotionController {
    pub settings: ControllerSettings,

    layers: Vec<MotionLayer>,
    parameter_names: Vec<LayerParameterNames>,
    /// Last phase written to the animator for each layer.
    written_phases: Vec<i32>,

    state: MotionState,
    previous: MotionState,

    actor: Option<Box<dyn ActorDriver>>,
    animator: Option<Box<dyn Animator>>,
    animator_source: Option<AnimatorSource>,
    input_source: Option<Box<dyn InputSource>>,

    user_input: Vec2,
    camera_forward: Option<Vec3>,
    targets: MotionTargets,

    listeners: MotionListeners,
    names: AnimatorNames,
    gate: MagnitudeGate,
    fixed_step: FixedStep,

    time: f32,
    update_index: u32,
    root_motion: RootMotion,
}

impl Default for MotionController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}

impl std::fmt::Debug for MotionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionController")
            .field("settings", &self.settings)
            .field("layers", &self.layers)
            .field("state", &self.state)
            .field("targets", &self.targets)
            .field("has_actor", &self.actor.is_some())
            .field("has_animator", &self.animator.is_some())
            .field("time", &self.time)
            .finish()
    }
}

impl MotionController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            layers: Vec::new(),
            parameter_names: Vec::new(),
            written_phases: Vec::new(),
            state: MotionState::default(),
            previous: MotionState::default(),
            actor: None,
            animator: None,
            animator_source: None,
            input_source: None,
            user_input: Vec2::ZERO,
            camera_forward: None,
            targets: MotionTargets::default(),
            listeners: MotionListeners::default(),
            names: AnimatorNames::default(),
            gate: MagnitudeGate::default(),
            fixed_step: FixedStep::default(),
            time: 0.0,
            update_index: 0,
            root_motion: RootMotion::default(),
        }
    }

    /// Build a controller, its layers and their motions from definitions.
    ///
    /// Motions of an unknown kind are skipped with a warning.
    pub fn from_defs(defs: &ControllerDefs, registry: &MotionRegistry) -> Self {
        let mut controller = Self::new(defs.settings);

        for layer_def in defs.layers.iter() {
            let mut layer = MotionLayer::new(layer_def.name.clone(), 0, layer_def.animator_layer);
            layer.ignore_override = layer_def.ignore_override;

            for motion_def in layer_def.motions.iter() {
                let Some(mut motion) = registry.create(&motion_def.kind, &motion_def.name) else {
                    continue;
                };

                motion.load_properties(&motion_def.properties);
                motion.core_mut().name = motion_def.name.clone();
                layer.add_motion(motion);
            }

            controller.add_layer(layer);
        }

        controller
    }

    /// Describe the controller's current layers and motion properties.
    pub fn to_defs(&self) -> ControllerDefs {
        ControllerDefs {
            settings: self.settings,
            layers: self
                .layers
                .iter()
                .map(|layer| LayerDef {
                    name: layer.name.clone(),
                    animator_layer: layer.animator_layer,
                    ignore_override: layer.ignore_override,
                    motions: layer
                        .motions()
                        .iter()
                        .map(|motion| {
                            let mut properties = PropertyMap::default();
                            motion.save_properties(&mut properties);
                            MotionDef {
                                kind: motion.kind().to_owned(),
                                name: motion.core().name.clone(),
                                properties,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Append a layer, returning its index.
    pub fn add_layer(&mut self, mut layer: MotionLayer) -> usize {
        let index = self.layers.len();
        layer.index = index;

        self.layers.push(layer);
        self.parameter_names.push(LayerParameterNames::new(index));
        self.written_phases.push(0);
        self.state.layers.push(AnimatorLayerState::default());
        self.previous.layers.push(AnimatorLayerState::default());

        index
    }

    /// Add a motion to an existing layer, returning its index within the layer.
    pub fn add_motion(&mut self, layer: usize, motion: Box<dyn Motion>) -> Option<usize> {
        Some(self.layer_mut(layer)?.add_motion(motion))
    }

    pub fn set_actor(&mut self, actor: Box<dyn ActorDriver>) {
        self.actor = Some(actor);
    }

    pub fn set_animator(&mut self, animator: Box<dyn Animator>) {
        self.animator = Some(animator);
        self.check_animator_layers();
    }

    /// Used to look for an animator again whenever the controller has none.
    pub fn set_animator_source(&mut self, source: AnimatorSource) {
        self.animator_source = Some(source);
    }

    #[inline]
    pub fn has_animator(&self) -> bool {
        self.animator.is_some()
    }

    pub fn set_input_source(&mut self, source: Box<dyn InputSource>) {
        self.input_source = Some(source);
    }

    /// Stick input used in [InputMode::User] when there is no input source.
    pub fn set_user_input(&mut self, input: Vec2) {
        self.user_input = input;
    }

    pub fn set_camera_forward(&mut self, forward: Option<Vec3>) {
        self.camera_forward = forward;
    }

    pub fn add_listener(&mut self, listener: impl MotionListener + 'static) {
        self.listeners.add(listener);
    }

    /// Take every message dispatched since the last call.
    ///
    /// Undrained messages are dropped when the next [Self::update] starts.
    pub fn drain_messages(&mut self) -> impl Iterator<Item = MotionMessage> + '_ {
        self.listeners.drain()
    }

    #[inline]
    pub fn pending_messages(&self) -> &[MotionMessage] {
        self.listeners.pending()
    }

    #[inline]
    pub fn layers(&self) -> &[MotionLayer] {
        &self.layers
    }

    pub fn layer(&self, layer: usize) -> Option<&MotionLayer> {
        let found = self.layers.get(layer);
        if found.is_none() {
            tracing::warn!(layer, "Invalid motion layer index.");
        }
        found
    }

    pub fn layer_mut(&mut self, layer: usize) -> Option<&mut MotionLayer> {
        let found = self.layers.get_mut(layer);
        if found.is_none() {
            tracing::warn!(layer, "Invalid motion layer index.");
        }
        found
    }

    /// The snapshot built during the last tick.
    #[inline]
    pub fn state(&self) -> &MotionState {
        &self.state
    }

    #[inline]
    pub fn previous_state(&self) -> &MotionState {
        &self.previous
    }

    /// Seconds accumulated over every tick that ran.
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Fixed steps taken during the last tick. `0` means parameters were not written.
    #[inline]
    pub fn update_index(&self) -> u32 {
        self.update_index
    }

    /// Root motion consumed during the last tick, after the first layer adjusted it.
    #[inline]
    pub fn root_motion(&self) -> RootMotion {
        self.root_motion
    }

    pub fn motion(&self, layer: usize, index: usize) -> Option<&dyn Motion> {
        let motion = self.layer(layer)?.motion(index);
        if motion.is_none() {
            tracing::warn!(layer, index, "Invalid motion index.");
        }
        motion
    }

    pub fn motion_mut(&mut self, layer: usize, index: usize) -> Option<&mut (dyn Motion + 'static)> {
        let motion = self.layer_mut(layer)?.motion_mut(index);
        if motion.is_none() {
            tracing::warn!(layer, index, "Invalid motion index.");
        }
        motion
    }

    /// Find the first motion called `name`, searching layers in order.
    pub fn find_motion(&self, name: &str) -> Option<MotionRef> {
        self.layers.iter().find_map(|layer| {
            layer
                .find_motion(name)
                .and_then(|index| layer.motion_ref(index))
        })
    }

    pub fn active_motion(&self, layer: usize) -> Option<&dyn Motion> {
        self.layer(layer)?.active_motion()
    }

    pub fn is_motion_active(&self, name: &str) -> bool {
        self.find_motion(name)
            .and_then(|found| self.layers[found.layer].motion(found.index))
            .is_some_and(|motion| motion.core().is_active())
    }

    /// Every motion whose category list contains `category`.
    pub fn motions_with_category(&self, category: &str) -> Vec<MotionRef> {
        self.layers
            .iter()
            .flat_map(|layer| {
                layer
                    .motions()
                    .iter()
                    .enumerate()
                    .filter(|(_, motion)| motion.core().has_category(category))
                    .filter_map(|(index, _)| layer.motion_ref(index))
            })
            .collect()
    }

    /// Queue the motion called `name` to start at the beginning of the next tick.
    pub fn activate_motion(&mut self, name: &str) -> bool {
        let Some(found) = self.find_motion(name) else {
            tracing::warn!(motion = %name, "Can not activate unknown motion.");
            return false;
        };
        self.layers[found.layer].queue_motion(found.index)
    }

    pub fn activate_motion_at(&mut self, layer: usize, index: usize) -> bool {
        self.layer_mut(layer)
            .is_some_and(|layer| layer.queue_motion(index))
    }

    /// Queue `name` and return a handle that completes once the motion finished.
    pub fn activate_motion_and_wait(&mut self, name: &str) -> Option<MotionWait> {
        let found = self.find_motion(name);
        if !self.activate_motion(name) {
            return None;
        }
        found.map(|found| MotionWait {
            layer: found.layer,
            index: found.index,
        })
    }

    /// Stop the motion called `name` right away, or cancel it if it was only queued.
    pub fn deactivate_motion(&mut self, name: &str) -> bool {
        let Some(found) = self.find_motion(name) else {
            tracing::warn!(motion = %name, "Can not deactivate unknown motion.");
            return false;
        };

        let actor = self.actor_state();
        let mut frame = LayerFrame {
            time: self.time,
            delta_time: 0.0,
            actor: &actor,
            state: &mut self.state,
            previous: &self.previous,
            listeners: &mut self.listeners,
        };

        let layer = &mut self.layers[found.layer];
        let cancelled = layer.cancel_queued(found.index);
        layer.deactivate_index(found.index, &mut frame) || cancelled
    }

    /// The phase currently requested on `layer`.
    pub fn animator_phase(&self, layer: usize) -> i32 {
        self.layer(layer)
            .and_then(|_| self.state.layer(layer))
            .map_or(0, |state| state.phase)
    }

    /// Request `phase` on `layer`, optionally clearing it once the animator responds.
    pub fn set_animator_phase(&mut self, layer: usize, phase: i32, auto_clear: bool) {
        if layer >= self.layers.len() {
            tracing::warn!(layer, "Invalid motion layer index.");
            return;
        }

        let actor = self.actor_state();
        let mut frame = LayerFrame {
            time: self.time,
            delta_time: 0.0,
            actor: &actor,
            state: &mut self.state,
            previous: &self.previous,
            listeners: &mut self.listeners,
        };
        self.layers[layer].set_phase(&mut frame, phase, auto_clear);
    }

    #[inline]
    pub fn targets(&self) -> &MotionTargets {
        &self.targets
    }

    /// Walk towards `position` until within the stop distance.
    /// Walk towards `position` with an input magnitude of `normalized_speed`.
    pub fn set_target_position(&mut self, position: Vec3, normalized_speed: f32) {
        self.targets.position = Some(position);
        self.targets.normalized_speed = normalized_speed.clamp(0.0, 1.0);
    }

    pub fn set_target_velocity(&mut self, velocity: Vec3) {
        self.targets.velocity = Some(velocity);
    }

    /// Snap the actor to `rotation`; cleared once the actor faces it.
    pub fn set_target_rotation(&mut self, rotation: Quat) {
        self.targets.rotation = Some(rotation);
    }

    pub fn set_target_forward(&mut self, forward: Vec3) {
        self.targets.forward = Some(forward);
    }

    pub fn clear_target(&mut self) {
        self.targets.clear();
    }

    /// Hash `name` with the animator and remember it for diagnostics.
    pub fn register_animator_name(&mut self, name: &str) -> Option<i32> {
        let Some(animator) = self.animator.as_ref() else {
            tracing::warn!(name, "Can not hash animator name without an animator.");
            return None;
        };

        let hash = animator.string_to_hash(name);
        self.names.register(hash, name);
        Some(hash)
    }

    #[inline]
    pub fn animator_name(&self, hash: i32) -> Option<&str> {
        self.names.get(hash)
    }

    /// Forward the animator's IK pass to the active motion of every layer that drives
    /// `animator_layer`.
    pub fn on_animator_ik(&mut self, animator_layer: usize) {
        for layer in self
            .layers
            .iter_mut()
            .filter(|layer| layer.animator_layer == animator_layer)
        {
            layer.on_animator_ik(animator_layer);
        }
    }

    fn actor_state(&self) -> ActorState {
        self.actor
            .as_ref()
            .map(|actor| actor.state())
            .unwrap_or_default()
    }

    fn reacquire_animator(&mut self) -> bool {
        if let Some(source) = self.animator_source.as_mut() {
            self.animator = source();
        }

        if self.animator.is_none() {
            tracing::warn!("No animator available, skipping motion controller update.");
            return false;
        }

        tracing::debug!("Animator acquired.");
        self.check_animator_layers();
        true
    }

    fn check_animator_layers(&self) {
        let Some(animator) = self.animator.as_ref() else {
            return;
        };

        let layer_count = animator.layer_count();
        for layer in self
            .layers
            .iter()
            .filter(|layer| layer.animator_layer >= layer_count)
        {
            tracing::warn!(
                layer = %layer.name,
                animator_layer = layer.animator_layer,
                layer_count,
                "Motion layer drives an animator layer that does not exist."
            );
        }
    }

    /// Called each frame with the amount of time passed since the last update in `delta_time`.
    pub fn update(&mut self, delta_time: f32) {
        let delta_time = delta_time.max(0.0);
        self.listeners.clear_outbox();

        if self.animator.is_none() && !self.reacquire_animator() {
            return;
        }

        let Some(actor) = self.actor.as_ref() else {
            tracing::warn!("No actor driver, skipping motion controller update.");
            return;
        };
        let actor = actor.state();

        self.time += delta_time;
        self.update_index = if self.settings.fixed_update_fps > 0.0 {
            self.fixed_step
                .advance(delta_time, self.settings.fixed_update_fps)
        } else {
            1
        };

        self.shift_state(&actor);
        self.read_animator(&actor, delta_time);
        self.resolve_input(&actor);

        let root_motion = self.consume_root_motion(&actor, delta_time);
        self.update_layers(&actor, delta_time);
        let magnitude = self.update_trend(delta_time);

        self.apply_rotation(&root_motion, delta_time);
        self.apply_movement(&actor, &root_motion, delta_time);

        if self.update_index != 0 {
            self.write_parameters(magnitude);
        }

        self.root_motion = root_motion;
    }

    fn shift_state(&mut self, actor: &ActorState) {
        self.previous.clone_from(&self.state);
        self.state.clear_input();
        self.state.is_grounded = actor.is_grounded;
        self.state.stance = actor.stance;
    }

    fn read_animator(&mut self, actor: &ActorState, delta_time: f32) {
        let Some(animator) = self.animator.as_ref() else {
            return;
        };

        let mut frame = LayerFrame {
            time: self.time,
            delta_time,
            actor,
            state: &mut self.state,
            previous: &self.previous,
            listeners: &mut self.listeners,
        };

        for layer in self.layers.iter_mut() {
            let previous = layer.state_id();
            let state = animator.current_state(layer.animator_layer);
            let transition = animator.current_transition(layer.animator_layer);
            layer.sync_animator(&mut frame, state, transition);

            if previous != state.id {
                tracing::debug!(
                    layer = %layer.name,
                    from = %self.names.describe(previous),
                    to = %self.names.describe(state.id),
                    "Animator state changed."
                );
            }
        }
    }

    fn resolve_input(&mut self, actor: &ActorState) {
        let transform = actor.transform;
        let dead_zone = self.settings.dead_zone;

        if let Some(position) = self.targets.position
            && horizontal_length(position - transform.translation)
                <= self.settings.target_stop_distance
        {
            tracing::debug!(?position, "Reached target position.");
            self.targets.position = None;
        }

        if let Some(rotation) = self.targets.rotation
            && transform.rotation.angle_between(rotation).to_degrees() <= ROTATION_TOLERANCE
        {
            self.targets.rotation = None;
        }

        let camera_forward = self.camera_forward.or_else(|| {
            self.input_source
                .as_ref()
                .and_then(|source| source.camera_forward())
        });
        let reference = self.targets.forward.unwrap_or(transform.forward());

        let input = if let Some(velocity) = self.targets.velocity {
            ResolvedInput::from_direction(
                velocity,
                self.normalized_speed(velocity),
                reference,
                camera_forward,
                dead_zone,
            )
        } else if let Some(position) = self.targets.position {
            ResolvedInput::from_direction(
                position - transform.translation,
                self.targets.normalized_speed,
                reference,
                camera_forward,
                dead_zone,
            )
        } else {
            match self.settings.input_mode {
                InputMode::User => {
                    let stick = self
                        .input_source
                        .as_ref()
                        .map_or(self.user_input, |source| source.movement());
                    ResolvedInput::from_user(stick, transform.forward(), camera_forward, dead_zone)
                }
                InputMode::TrackTransform => ResolvedInput::from_direction(
                    actor.velocity,
                    self.normalized_speed(actor.velocity),
                    reference,
                    camera_forward,
                    dead_zone,
                ),
            }
        };

        input.apply(&mut self.state);
    }

    /// Horizontal speed of `velocity` relative to `max_speed`, in `[0, 1]`.
    fn normalized_speed(&self, velocity: Vec3) -> f32 {
        let speed = horizontal_length(velocity);
        if self.settings.max_speed > 0.0 {
            (speed / self.settings.max_speed).min(1.0)
        } else {
            speed.min(1.0)
        }
    }

    fn consume_root_motion(&mut self, actor: &ActorState, delta_time: f32) -> RootMotion {
        let mut root_motion = self
            .animator
            .as_mut()
            .map(|animator| animator.root_motion())
            .unwrap_or_default();

        if let Some(first) = self.layers.first_mut() {
            let mut frame = LayerFrame {
                time: self.time,
                delta_time,
                actor,
                state: &mut self.state,
                previous: &self.previous,
                listeners: &mut self.listeners,
            };
            first.update_root_motion(&mut frame, &mut root_motion);
        }

        root_motion
    }

    fn update_layers(&mut self, actor: &ActorState, delta_time: f32) {
        let mut frame = LayerFrame {
            time: self.time,
            delta_time,
            actor,
            state: &mut self.state,
            previous: &self.previous,
            listeners: &mut self.listeners,
        };

        // Queues only ever resolve here, so anything queued below waits for the next tick.
        for layer in self.layers.iter_mut() {
            layer.resolve_queue(&mut frame);
        }

        let mut overridden = false;
        for index in 0..self.layers.len() {
            if index > 0 && self.layers[index - 1].overrides_layers() {
                overridden = true;
                for later in self.layers[index..].iter_mut() {
                    later.queue_idle();
                }
            }

            let layer = &mut self.layers[index];
            let suppressed = overridden && !layer.ignore_override;
            layer.step(&mut frame, suppressed);
        }
    }

    fn update_trend(&mut self, delta_time: f32) -> f32 {
        let current = self.state.input_magnitude.value();
        self.state.trend = Trend::classify(self.previous.input_magnitude.value(), current);
        self.gate
            .update(self.state.trend, current, self.settings.trend_delay, delta_time)
    }

    fn apply_rotation(&mut self, root_motion: &RootMotion, delta_time: f32) {
        let Some(actor) = self.actor.as_mut() else {
            return;
        };

        if let Some(target) = self.targets.rotation {
            actor.set_rotation(normalize_rotation_or_identity(target));
            return;
        }

        let mut angular = Vec3::ZERO;
        let mut rotation = Quat::IDENTITY;
        let mut tilt = Quat::IDENTITY;
        for layer in self.layers.iter() {
            angular += layer.angular_velocity() * delta_time;
            rotation *= layer.rotation();
            tilt *= layer.tilt();
        }

        let angular = Quat::from_euler(
            EulerRot::YXZ,
            angular.y.to_radians(),
            angular.x.to_radians(),
            angular.z.to_radians(),
        );

        actor.rotate(
            normalize_rotation_or_identity(angular * rotation * root_motion.rotation),
            normalize_rotation_or_identity(tilt),
        );
    }

    fn apply_movement(&mut self, actor_state: &ActorState, root_motion: &RootMotion, delta_time: f32) {
        let Some(actor) = self.actor.as_mut() else {
            return;
        };

        let mut movement = actor_state.transform.rotation * root_motion.translation;
        for layer in self.layers.iter() {
            movement += layer.velocity() * delta_time + layer.movement();
        }

        actor.move_by(movement);
    }

    fn write_parameters(&mut self, magnitude: f32) {
        let Some(animator) = self.animator.as_mut() else {
            return;
        };

        let state = &self.state;
        animator.set_bool(parameters::IS_GROUNDED, state.is_grounded);
        animator.set_integer(parameters::STANCE, state.stance);
        animator.set_float(parameters::INPUT_X, state.input_x);
        animator.set_float(parameters::INPUT_Y, state.input_y);
        animator.set_float(parameters::INPUT_MAGNITUDE, magnitude);
        animator.set_float(
            parameters::INPUT_MAGNITUDE_AVG,
            state.input_magnitude.average(),
        );
        animator.set_float(
            parameters::INPUT_ANGLE_FROM_AVATAR,
            state.input_from_avatar_angle,
        );
        animator.set_float(
            parameters::INPUT_ANGLE_FROM_CAMERA,
            state.input_from_camera_angle,
        );

        for ((layer, names), written) in state
            .layers
            .iter()
            .zip(self.parameter_names.iter())
            .zip(self.written_phases.iter_mut())
        {
            let holding = self.settings.phase_clear == PhaseClearType::Dwell
                && layer.phase == 0
                && *written != 0
                && self.time - layer.phase_set_time < self.settings.phase_dwell_time;

            if !holding {
                *written = layer.phase;
            }

            animator.set_integer(&names.phase, *written);
            animator.set_integer(&names.form, layer.form);
            animator.set_integer(&names.parameter, layer.parameter);
            animator.set_float(&names.state_time, layer.state_time);
        }
    }
}

#[inline]
fn horizontal_length(vector: Vec3) -> f32 {
    Vec2::new(vector.x, vector.z).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        motion::{
            message::MessageKind,
            motion::MotionFlags,
            motions::{Idle, Interact, Jump, Locomotion, PHASE_FALLING, PHASE_RISING},
            reach::{ReachData, ReachKey},
        },
        testing::{FakeActor, FakeAnimator, ScriptedMotion, init_tracing},
    };
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        task::Poll,
    };

    #[inline]
    fn approx_f(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[inline]
    fn approx_v3(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-4
    }

    fn controller_with_fakes() -> (MotionController, FakeActor, FakeAnimator) {
        init_tracing();

        let actor = FakeActor::default();
        let animator = FakeAnimator::with_layers(2);

        let mut controller = MotionController::default();
        controller.set_actor(Box::new(actor.clone()));
        controller.set_animator(Box::new(animator.clone()));

        (controller, actor, animator)
    }

    fn base_layer(controller: &mut MotionController) -> usize {
        let mut layer = MotionLayer::new("Base Layer", 0, 0);
        layer.add_motion(Box::new(Idle::new("Idle")));
        layer.add_motion(Box::new(Locomotion::new("Walk Run")));
        layer.add_motion(Box::new(Jump::new("Jump")));
        controller.add_layer(layer)
    }

    #[test]
    fn missing_animator_makes_the_tick_a_no_op() {
        let actor = FakeActor::default();
        let mut controller = MotionController::default();
        controller.set_actor(Box::new(actor.clone()));
        base_layer(&mut controller);

        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        controller.set_animator_source(Box::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
            None
        }));

        controller.update(0.1);

        assert_eq!(attempts.load(Ordering::Relaxed), 1);
        assert_eq!(controller.time(), 0.0);
        assert!(controller.active_motion(0).is_none());
        assert!(actor.moves().is_empty());
    }

    #[test]
    fn animator_is_reacquired_from_the_source() {
        let actor = FakeActor::default();
        let animator = FakeAnimator::with_layers(1);
        let mut controller = MotionController::default();
        controller.set_actor(Box::new(actor.clone()));
        base_layer(&mut controller);

        let source_animator = animator.clone();
        controller.set_animator_source(Box::new(move || {
            Some(Box::new(source_animator.clone()) as Box<dyn Animator>)
        }));

        controller.update(0.1);

        assert!(controller.has_animator());
        assert_eq!(actor.moves().len(), 1);
        assert_eq!(animator.bool(parameters::IS_GROUNDED), Some(true));
    }

    #[test]
    fn idle_then_locomotion_moves_the_actor() {
        let (mut controller, actor, animator) = controller_with_fakes();
        base_layer(&mut controller);

        controller.update(0.1);
        assert_eq!(controller.active_motion(0).unwrap().core().name, "Idle");

        controller.set_user_input(Vec2::new(0.0, 1.0));
        controller.update(0.1);

        let active = controller.active_motion(0).unwrap();
        assert_eq!(active.core().name, "Walk Run");
        assert!(approx_f(animator.float(parameters::INPUT_Y).unwrap(), 1.0));
        assert!(approx_f(animator.float(parameters::INPUT_MAGNITUDE).unwrap(), 1.0));

        // One displacement per tick, summed over every layer.
        assert_eq!(actor.moves().len(), 2);
        let moved = actor.moves().last().copied().unwrap();
        assert!(approx_v3(moved, Vec3::new(0.0, 0.0, 4.5 * 0.1)));
        assert_eq!(
            animator.integer(&parameters::layer_parameter(0)),
            Some(crate::motion::motions::PARAMETER_RUN)
        );
    }

    #[test]
    fn zero_input_writes_zero_magnitude_and_angles() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.trend_delay = 0.0;

        controller.set_user_input(Vec2::new(1.0, 0.0));
        controller.update(0.1);
        assert!(approx_f(controller.state().input_from_camera_angle, 90.0));

        controller.set_user_input(Vec2::ZERO);
        controller.update(0.1);

        assert_eq!(controller.state().input_magnitude.value(), 0.0);
        assert_eq!(controller.state().input_from_avatar_angle, 0.0);
        assert_eq!(controller.state().input_from_camera_angle, 0.0);
        assert_eq!(controller.state().trend, Trend::Decelerate);
        assert_eq!(animator.float(parameters::INPUT_MAGNITUDE), Some(0.0));
        assert_eq!(animator.float(parameters::INPUT_ANGLE_FROM_CAMERA), Some(0.0));
    }

    #[test]
    fn trend_delay_holds_magnitude_after_release() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);

        controller.set_user_input(Vec2::new(0.0, 0.5));
        controller.update(0.05);
        controller.set_user_input(Vec2::new(0.0, 1.0));
        controller.update(0.05);
        assert_eq!(controller.state().trend, Trend::Accelerate);

        controller.set_user_input(Vec2::ZERO);
        controller.update(0.05);
        assert_eq!(controller.state().trend, Trend::Decelerate);
        assert!(approx_f(animator.float(parameters::INPUT_MAGNITUDE).unwrap(), 1.0));

        for _ in 0..4 {
            controller.update(0.05);
        }
        assert_eq!(animator.float(parameters::INPUT_MAGNITUDE), Some(0.0));
    }

    #[test]
    fn override_queues_idle_on_later_layers() {
        let (mut controller, _actor, _animator) = controller_with_fakes();

        let mut base = MotionLayer::new("Base Layer", 0, 0);
        base.add_motion(Box::new(Idle::new("Idle")));
        let (vault, vault_script) = ScriptedMotion::new("Vault", 50.0);
        let vault_index = base.add_motion(Box::new(vault));
        base.motion_mut(vault_index)
            .unwrap()
            .core_mut()
            .flags
            .insert(MotionFlags::OVERRIDE_LAYERS);
        controller.add_layer(base);

        let mut upper = MotionLayer::new("Upper Body", 0, 1);
        let upper_idle = upper.add_motion(Box::new(Idle::new("Upper Idle")));
        let (wave, wave_script) = ScriptedMotion::new("Wave", 5.0);
        let wave_index = upper.add_motion(Box::new(wave));
        controller.add_layer(upper);

        let mut face = MotionLayer::new("Face", 0, 1);
        face.ignore_override = true;
        face.add_motion(Box::new(Idle::new("Face Idle")));
        let (smile, smile_script) = ScriptedMotion::new("Smile", 5.0);
        let smile_index = face.add_motion(Box::new(smile));
        controller.add_layer(face);

        wave_script.lock().unwrap().wants_start = true;
        smile_script.lock().unwrap().wants_start = true;
        controller.update(0.1);
        assert_eq!(controller.layers()[1].active_index(), Some(wave_index));
        assert_eq!(controller.layers()[2].active_index(), Some(smile_index));

        vault_script.lock().unwrap().wants_start = true;
        controller.update(0.1);

        // Queued this tick, started on the next one.
        assert_eq!(controller.layers()[0].active_index(), Some(vault_index));
        assert!(controller.motion(1, upper_idle).unwrap().core().is_queued());
        assert_eq!(controller.layers()[2].queued_index(), None);

        controller.update(0.1);
        assert_eq!(controller.layers()[1].active_index(), Some(upper_idle));
        assert_eq!(controller.layers()[2].active_index(), Some(smile_index));
    }

    #[test]
    fn every_layer_has_at_most_one_active_motion() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);

        let inputs = [
            Vec2::ZERO,
            Vec2::new(0.0, 1.0),
            Vec2::new(0.3, 0.2),
            Vec2::ZERO,
            Vec2::new(-1.0, 0.0),
        ];
        for (tick, input) in inputs.iter().cycle().take(20).enumerate() {
            controller.set_user_input(*input);
            if tick == 7 {
                controller.activate_motion("Jump");
            }
            controller.update(1.0 / 30.0);

            for layer in controller.layers() {
                let active = layer
                    .motions()
                    .iter()
                    .filter(|motion| motion.core().is_active())
                    .count();
                assert!(active <= 1, "tick {tick}: {active} active motions");
            }
        }
    }

    #[test]
    fn jump_runs_until_landing() {
        let (mut controller, actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        let phase_name = parameters::layer_phase(0);
        controller.update(0.1);

        let wait = controller.activate_motion_and_wait("Jump").unwrap();
        assert_eq!(wait.poll(&controller), Poll::Pending);

        actor.set_grounded(false);
        controller.update(0.1);
        assert!(controller.is_motion_active("Jump"));
        assert!(actor.moves().last().unwrap().y > 0.0);
        assert_eq!(wait.poll(&controller), Poll::Pending);
        assert_eq!(animator.integer(&phase_name), Some(PHASE_RISING));

        // Fall long enough for the vertical speed to turn negative, then land.
        for _ in 0..10 {
            controller.update(0.1);
        }
        assert_eq!(animator.integer(&phase_name), Some(PHASE_FALLING));

        actor.set_grounded(true);
        controller.update(0.1);

        assert!(!controller.is_motion_active("Jump"));
        assert_eq!(wait.poll(&controller), Poll::Ready(()));
        assert_eq!(animator.integer(&phase_name), Some(0));
    }

    #[test]
    fn motion_parameter_reaches_the_animator() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        let mut layer = MotionLayer::new("Base Layer", 0, 0);
        let (motion, script) = ScriptedMotion::new("Emote", 1.0);
        layer.add_motion(Box::new(motion));
        controller.add_layer(layer);
        {
            let mut script = script.lock().unwrap();
            script.wants_start = true;
            script.parameter = 5;
        }

        controller.update(0.1);
        assert_eq!(animator.integer(&parameters::layer_parameter(0)), Some(5));

        script.lock().unwrap().parameter = 7;
        controller.update(0.1);
        assert_eq!(animator.integer(&parameters::layer_parameter(0)), Some(7));
    }

    #[test]
    fn activation_and_deactivation_messages_reach_listeners() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        controller.add_listener(move |message: &mut MotionMessage| {
            let name = message.motion.as_ref().map(|m| m.name.clone());
            sink.lock().unwrap().push((message.id(), name));
        });

        controller.update(0.1);
        controller.set_user_input(Vec2::new(0.0, 1.0));
        controller.update(0.1);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (MessageKind::Activate.id(), Some("Idle".to_owned())),
                (MessageKind::Deactivate.id(), Some("Idle".to_owned())),
                (MessageKind::Activate.id(), Some("Walk Run".to_owned())),
            ]
        );
        // Only the last update's messages are still waiting to be drained.
        assert_eq!(controller.drain_messages().count(), 2);
    }

    #[test]
    fn undrained_messages_do_not_pile_up() {
        let (mut controller, actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.update(0.1);

        for _ in 0..50 {
            controller.activate_motion("Jump");
            actor.set_grounded(false);
            controller.update(0.1);
            assert!(controller.is_motion_active("Jump"));

            controller.deactivate_motion("Jump");
            actor.set_grounded(true);
            controller.update(0.1);
            assert!(controller.pending_messages().len() <= 2);
        }

        assert!(controller.pending_messages().len() <= 2);
    }

    #[test]
    fn animator_state_change_emits_message() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        let walk = controller.register_animator_name("Base Layer.Walk").unwrap();
        assert_eq!(controller.animator_name(walk), Some("Base Layer.Walk"));

        controller.update(0.1);
        controller.drain_messages().for_each(drop);

        animator.set_state(0, walk, 0.25);
        controller.update(0.1);

        let changed: Vec<_> = controller
            .drain_messages()
            .filter(|message| message.kind == MessageKind::AnimatorChanged)
            .collect();
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].state_id, walk);
        assert_eq!(changed[0].motion.as_ref().unwrap().name, "Idle");
        assert_eq!(
            animator.float(&parameters::layer_state_time(0)),
            Some(0.25)
        );
    }

    #[test]
    fn dwell_holds_phase_for_minimum_time() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.phase_clear = PhaseClearType::Dwell;
        controller.settings.phase_dwell_time = 0.25;
        let phase_name = parameters::layer_phase(0);

        controller.update(0.1);
        controller.set_animator_phase(0, 7, false);
        controller.update(0.1);
        assert_eq!(animator.integer(&phase_name), Some(7));

        controller.set_animator_phase(0, 0, false);
        controller.update(0.1);
        assert_eq!(controller.animator_phase(0), 0);
        assert_eq!(animator.integer(&phase_name), Some(7));

        controller.update(0.1);
        assert_eq!(animator.integer(&phase_name), Some(0));
    }

    #[test]
    fn immediate_phase_clear_writes_zero_at_once() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        let phase_name = parameters::layer_phase(0);

        controller.set_animator_phase(0, 7, false);
        controller.update(0.1);
        assert_eq!(animator.integer(&phase_name), Some(7));

        controller.set_animator_phase(0, 0, false);
        controller.update(0.1);
        assert_eq!(animator.integer(&phase_name), Some(0));
    }

    #[test]
    fn fixed_rate_skips_parameter_writes_without_a_step() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.fixed_update_fps = 10.0;

        controller.update(0.05);
        assert_eq!(controller.update_index(), 0);
        assert_eq!(animator.write_count(), 0);

        controller.update(0.06);
        assert_eq!(controller.update_index(), 1);
        assert!(animator.write_count() > 0);
    }

    #[test]
    fn position_target_walks_and_clears_at_stop_distance() {
        let (mut controller, actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);

        controller.set_target_position(Vec3::new(0.0, 0.0, 0.5), 1.0);
        controller.update(0.1);
        assert!(approx_f(controller.state().input_magnitude.value(), 1.0));
        assert!(approx_f(controller.state().input_from_avatar_angle, 0.0));

        // Move the actor next to the target.
        actor.teleport(Vec3::new(0.0, 0.0, 0.45));
        controller.update(0.1);
        assert!(controller.targets().position.is_none());
        assert_eq!(controller.state().input_magnitude.value(), 0.0);
    }

    #[test]
    fn rotation_target_snaps_then_clears() {
        let (mut controller, actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);

        let target = Quat::from_rotation_y(1.0);
        controller.set_target_rotation(target);
        controller.update(0.1);
        assert!(actor.state_snapshot().transform.rotation.angle_between(target) < 1e-3);
        assert!(controller.targets().rotation.is_some());

        controller.update(0.1);
        assert!(controller.targets().rotation.is_none());
        assert_eq!(actor.rotations().len(), 1);
    }

    #[test]
    fn transition_change_clears_auto_clear_phase() {
        let (mut controller, _actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        let phase_name = parameters::layer_phase(0);

        controller.update(0.1);
        controller.set_animator_phase(0, 5, true);
        controller.update(0.1);
        assert_eq!(animator.integer(&phase_name), Some(5));

        animator.set_transition(0, 12, 0.0);
        controller.update(0.1);
        assert_eq!(controller.animator_phase(0), 0);
        assert_eq!(animator.integer(&phase_name), Some(0));
    }

    #[test]
    fn track_transform_derives_input_from_velocity() {
        let (mut controller, actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.input_mode = InputMode::TrackTransform;
        controller.settings.max_speed = 4.0;

        actor.set_velocity(Vec3::new(2.0, 0.0, 0.0));
        controller.update(0.1);

        let state = controller.state();
        assert!(approx_f(state.input_from_avatar_angle, 90.0));
        assert!(approx_f(state.input_x, 0.5));
        assert!(approx_f(state.input_y, 0.0));
        assert!(approx_f(state.input_magnitude.value(), 0.5));
    }

    #[test]
    fn simulated_input_never_exceeds_full_stick() {
        let (mut controller, actor, animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.max_speed = 4.0;
        controller.settings.trend_delay = 0.0;

        controller.set_target_velocity(Vec3::new(0.0, 0.0, 3.0));
        controller.update(0.1);
        assert!(approx_f(animator.float(parameters::INPUT_Y).unwrap(), 0.75));
        assert!(approx_f(animator.float(parameters::INPUT_MAGNITUDE).unwrap(), 0.75));

        controller.clear_target();
        controller.settings.input_mode = InputMode::TrackTransform;
        actor.set_velocity(Vec3::new(0.0, 0.0, 6.0));
        controller.update(0.1);
        assert!(approx_f(animator.float(parameters::INPUT_Y).unwrap(), 1.0));
        assert!(approx_f(animator.float(parameters::INPUT_MAGNITUDE).unwrap(), 1.0));

        controller.settings.input_mode = InputMode::User;
        controller.set_target_position(Vec3::new(0.0, 0.0, 10.0), 0.4);
        controller.update(0.1);
        assert!(approx_f(controller.state().input_magnitude.value(), 0.4));
        assert!(approx_f(controller.targets().normalized_speed, 0.4));
    }

    #[test]
    fn root_motion_is_reoriented_into_actor_facing() {
        let (mut controller, actor, animator) = controller_with_fakes();
        controller.add_layer(MotionLayer::new("Empty", 0, 0));

        actor.turn_to(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        animator.set_root_motion(RootMotion {
            translation: Vec3::new(0.0, 0.0, 1.0),
            rotation: Quat::IDENTITY,
        });
        controller.update(0.1);

        assert!(approx_v3(actor.moves()[0], Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(controller.root_motion().translation, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn interaction_reaches_target_and_overrides() {
        let (mut controller, actor, animator) = controller_with_fakes();
        base_layer(&mut controller);

        let mut interact = Interact::new("Pick Up");
        interact.state_id = 99;
        interact.target_position = Vec3::new(1.0, 0.0, 0.0);
        interact.reach_start = 0.0;
        interact.reach_end = 0.5;
        controller.add_motion(0, Box::new(interact));

        controller.update(0.1);
        assert!(controller.activate_motion("Pick Up"));
        controller.update(0.1);
        assert!(controller.is_motion_active("Pick Up"));

        animator.set_state(0, 99, 0.6);
        controller.update(0.1);
        let moved: Vec3 = actor.moves().iter().copied().sum();
        assert!(approx_v3(moved, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn reach_is_dropped_on_deactivation() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.update(0.1);

        let walk = controller.find_motion("Walk Run").unwrap();
        let reach = ReachData::new(ReachKey::State(1), Vec3::ONE, 0.0, 1.0, 1.0).unwrap();
        controller
            .motion_mut(walk.layer, walk.index)
            .unwrap()
            .core_mut()
            .add_reach(reach)
            .unwrap();

        controller.set_user_input(Vec2::new(0.0, 1.0));
        controller.update(0.1);
        assert!(controller.is_motion_active("Walk Run"));
        assert!(controller.deactivate_motion("Walk Run"));
        assert!(controller.motion(walk.layer, walk.index).unwrap().core().reach.is_empty());
    }

    #[test]
    fn bad_indices_and_names_are_no_ops() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);

        assert!(controller.motion(5, 0).is_none());
        assert!(controller.motion(0, 50).is_none());
        assert!(controller.active_motion(3).is_none());
        assert!(!controller.activate_motion("Backflip"));
        assert!(!controller.deactivate_motion("Backflip"));
        assert!(controller.activate_motion_and_wait("Backflip").is_none());
        assert!(!controller.activate_motion_at(9, 0));
        assert_eq!(controller.animator_phase(4), 0);
        controller.set_animator_phase(4, 1, true);
        assert!(controller.add_motion(8, Box::new(Idle::new("Lost"))).is_none());
    }

    #[test]
    fn category_queries_cover_all_layers() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);
        let mut upper = MotionLayer::new("Upper", 0, 1);
        let mut wave = Idle::new("Wave");
        wave.core_mut().category = "Emote".into();
        upper.add_motion(Box::new(wave));
        controller.add_layer(upper);
        controller
            .motion_mut(0, 2)
            .unwrap()
            .core_mut()
            .category = "Traversal, Emote".into();

        let names: Vec<_> = controller
            .motions_with_category("emote")
            .into_iter()
            .map(|found| (found.layer, found.name))
            .collect();
        assert_eq!(names, vec![(0, "Jump".to_owned()), (1, "Wave".to_owned())]);
    }

    #[test]
    fn ik_is_routed_to_matching_layers() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        let mut layer = MotionLayer::new("Hands", 0, 1);
        let (motion, script) = ScriptedMotion::new("Grip", 1.0);
        layer.add_motion(Box::new(motion));
        controller.add_layer(layer);

        script.lock().unwrap().wants_start = true;
        controller.update(0.1);

        controller.on_animator_ik(0);
        controller.on_animator_ik(1);
        assert_eq!(script.lock().unwrap().ik_layers, vec![1]);
    }

    #[test]
    fn definitions_round_trip_through_the_registry() {
        let (mut controller, _actor, _animator) = controller_with_fakes();
        base_layer(&mut controller);
        controller.settings.trend_delay = 0.35;
        controller
            .motion_mut(0, 1)
            .unwrap()
            .core_mut()
            .priority = 3.5;

        let defs = controller.to_defs();
        let rebuilt = MotionController::from_defs(&defs, &MotionRegistry::default());

        assert_eq!(rebuilt.settings, controller.settings);
        assert_eq!(rebuilt.layers().len(), 1);
        let names: Vec<_> = rebuilt.layers()[0]
            .motions()
            .iter()
            .map(|motion| (motion.kind(), motion.core().name.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Idle", "Idle".to_owned()),
                ("Locomotion", "Walk Run".to_owned()),
                ("Jump", "Jump".to_owned()),
            ]
        );
        assert_eq!(rebuilt.motion(0, 1).unwrap().core().priority, 3.5);
    }
}
