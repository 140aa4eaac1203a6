use glam::{Quat, Vec3};

use super::{
    message::{MessageKind, MotionListeners, MotionMessage, MotionRef},
    motion::{
        AutoClear, Motion, MotionContext, MotionFlags, begin_activation, end_activation,
        update_motion,
    },
    motion_state::MotionState,
    services::{ActorState, AnimatorStateInfo, AnimatorTransitionInfo, RootMotion},
};

/// Borrowed controller state a layer needs while it runs.
pub(crate) struct LayerFrame<'a> {
    pub time: f32,
    pub delta_time: f32,
    pub actor: &'a ActorState,
    pub state: &'a mut MotionState,
    pub previous: &'a MotionState,
    pub listeners: &'a mut MotionListeners,
}

/// Build a [MotionContext] for a motion on `layer_index` out of the frame.
fn context<'b>(
    frame: &'b mut LayerFrame<'_>,
    layer_index: usize,
    animator_layer: usize,
    auto_clear: &'b mut AutoClear,
) -> MotionContext<'b> {
    MotionContext {
        time: frame.time,
        delta_time: frame.delta_time,
        actor: frame.actor,
        state: &mut *frame.state,
        previous: frame.previous,
        layer_index,
        animator_layer,
        auto_clear,
    }
}

/// Motions sharing one animator layer, of which at most one is active.
#[derive(Debug)]
pub struct MotionLayer {
    pub name: String,
    pub index: usize,
    pub animator_layer: usize,
    /// Keep running this layer's motions when an earlier layer overrides later layers.
    pub ignore_override: bool,

    motions: Vec<Box<dyn Motion>>,
    active: Option<usize>,
    queued: Option<usize>,

    /// Last animator state and transition seen on this layer.
    state_id: i32,
    transition_id: i32,
    auto_clear: AutoClear,
}

impl MotionLayer {
    pub fn new(name: impl Into<String>, index: usize, animator_layer: usize) -> Self {
        Self {
            name: name.into(),
            index,
            animator_layer,
            ignore_override: false,
            motions: Vec::new(),
            active: None,
            queued: None,
            state_id: 0,
            transition_id: 0,
            auto_clear: AutoClear::default(),
        }
    }

    /// Append a motion, returning its index in the layer.
    pub fn add_motion(&mut self, motion: Box<dyn Motion>) -> usize {
        self.motions.push(motion);
        self.motions.len() - 1
    }

    #[inline]
    pub fn motions(&self) -> &[Box<dyn Motion>] {
        &self.motions
    }

    #[inline]
    pub fn motion(&self, index: usize) -> Option<&dyn Motion> {
        self.motions.get(index).map(|motion| motion.as_ref())
    }

    #[inline]
    pub fn motion_mut(&mut self, index: usize) -> Option<&mut (dyn Motion + 'static)> {
        self.motions.get_mut(index).map(|motion| motion.as_mut())
    }

    /// Index of the first motion called `name`.
    pub fn find_motion(&self, name: &str) -> Option<usize> {
        self.motions
            .iter()
            .position(|motion| motion.core().name == name)
    }

    #[inline]
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn active_motion(&self) -> Option<&dyn Motion> {
        self.active.and_then(|index| self.motion(index))
    }

    #[inline]
    pub fn queued_index(&self) -> Option<usize> {
        self.queued
    }

    /// The motion flagged as this layer's idle.
    pub fn idle_index(&self) -> Option<usize> {
        self.motions
            .iter()
            .position(|motion| motion.core().has_flags(MotionFlags::IDLE))
    }

    #[inline]
    pub fn state_id(&self) -> i32 {
        self.state_id
    }

    #[inline]
    pub fn transition_id(&self) -> i32 {
        self.transition_id
    }

    #[inline]
    pub fn auto_clear(&self) -> AutoClear {
        self.auto_clear
    }

    pub fn motion_ref(&self, index: usize) -> Option<MotionRef> {
        self.motions.get(index).map(|motion| MotionRef {
            layer: self.index,
            index,
            name: motion.core().name.clone(),
        })
    }

    /// Return true when the active motion wants later layers to drop to their idle.
    pub fn overrides_layers(&self) -> bool {
        self.active_motion()
            .is_some_and(|motion| motion.core().has_flags(MotionFlags::OVERRIDE_LAYERS))
    }

    pub fn velocity(&self) -> Vec3 {
        self.active_motion()
            .map_or(Vec3::ZERO, |motion| motion.core().velocity)
    }

    pub fn movement(&self) -> Vec3 {
        self.active_motion()
            .map_or(Vec3::ZERO, |motion| motion.core().movement)
    }

    pub fn angular_velocity(&self) -> Vec3 {
        self.active_motion()
            .map_or(Vec3::ZERO, |motion| motion.core().angular_velocity)
    }

    pub fn rotation(&self) -> Quat {
        self.active_motion()
            .map_or(Quat::IDENTITY, |motion| motion.core().rotation)
    }

    pub fn tilt(&self) -> Quat {
        self.active_motion()
            .map_or(Quat::IDENTITY, |motion| motion.core().tilt)
    }

    /// Defer activating the motion at `index` until the start of the next tick.
    ///
    /// Queuing replaces any earlier queued motion. Returns false for a bad index.
    pub fn queue_motion(&mut self, index: usize) -> bool {
        if index >= self.motions.len() {
            tracing::warn!(layer = %self.name, index, "Can not queue unknown motion.");
            return false;
        }

        if let Some(previous) = self.queued.replace(index) {
            self.motions[previous].core_mut().set_queued(false);
        }
        self.motions[index].core_mut().set_queued(true);

        true
    }

    /// Drop the queued activation of `index`, if it is the queued motion.
    pub fn cancel_queued(&mut self, index: usize) -> bool {
        if self.queued != Some(index) {
            return false;
        }

        self.queued = None;
        self.motions[index].core_mut().set_queued(false);
        true
    }

    /// Queue the layer's idle motion unless this layer ignores overrides.
    pub fn queue_idle(&mut self) -> bool {
        if self.ignore_override {
            return false;
        }

        let Some(idle) = self.idle_index() else {
            return false;
        };

        if self.active == Some(idle) {
            return false;
        }

        self.queue_motion(idle)
    }

    /// Read this tick's animator state into the snapshot and resolve auto-clear phases.
    pub(crate) fn sync_animator(
        &mut self,
        frame: &mut LayerFrame,
        state: AnimatorStateInfo,
        transition: AnimatorTransitionInfo,
    ) {
        let Some(layer) = frame.state.layer_mut(self.index) else {
            return;
        };

        layer.state_id = state.id;
        layer.state_time = state.normalized_time;
        layer.transition_id = transition.id;
        layer.transition_time = transition.normalized_time;

        if self.auto_clear.pending {
            let confirmed = self.active.is_some_and(|active| {
                self.motions[active].is_in_motion_state(state.id, transition.id)
            });

            if confirmed || transition.id != self.auto_clear.transition_id {
                layer.phase = 0;
                self.auto_clear.pending = false;
            }
        }

        self.transition_id = transition.id;

        if state.id == self.state_id {
            return;
        }

        let previous = std::mem::replace(&mut self.state_id, state.id);

        if let Some(active) = self.active {
            let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            self.motions[active].on_animator_state_change(&mut ctx, previous, state.id);
        }

        let mut message = MotionMessage::new(
            MessageKind::AnimatorChanged,
            self.index,
            self.active.and_then(|active| self.motion_ref(active)),
        );
        message.state_id = state.id;
        frame.listeners.dispatch(message);
    }

    /// Let the active motion adjust the animator's root motion.
    pub(crate) fn update_root_motion(&mut self, frame: &mut LayerFrame, root_motion: &mut RootMotion) {
        let Some(active) = self.active else {
            return;
        };

        let ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
        self.motions[active].update_root_motion(&ctx, root_motion);
    }

    /// Arbitrate and update the active motion. While `overridden` no new motion may start.
    pub(crate) fn step(&mut self, frame: &mut LayerFrame, overridden: bool) {
        if !overridden {
            self.arbitrate(frame);
        }

        let Some(active) = self.active else {
            return;
        };

        if !self.motions[active].core().is_enabled {
            self.deactivate_index(active, frame);
            return;
        }

        let keep_running = {
            let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            let motion = self.motions[active].as_mut();
            update_motion(motion, &mut ctx);
            motion.test_update(&ctx)
        };

        self.write_outputs(frame);

        if !keep_running {
            self.deactivate_index(active, frame);
        }
    }

    pub(crate) fn resolve_queue(&mut self, frame: &mut LayerFrame) {
        let Some(index) = self.queued.take() else {
            return;
        };

        self.motions[index].core_mut().set_queued(false);

        if !self.motions[index].core().is_enabled {
            tracing::debug!(
                layer = %self.name,
                motion = %self.motions[index].core().name,
                "Dropping queued motion, it is disabled."
            );
            return;
        }

        if self.active == Some(index) {
            return;
        }

        self.activate_index(index, frame);
    }

    /// Pick the highest priority motion that wants to start and hand over to it if allowed.
    fn arbitrate(&mut self, frame: &mut LayerFrame) {
        let mut best: Option<(usize, f32)> = None;

        for (index, motion) in self.motions.iter_mut().enumerate() {
            if !motion.core().can_start(frame.time) {
                continue;
            }

            let ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            if !motion.test_activate(&ctx) {
                continue;
            }

            let priority = motion.core().priority;
            // Strictly greater keeps the earliest motion on equal priority.
            if best.is_none_or(|(_, best_priority)| priority > best_priority) {
                best = Some((index, priority));
            }
        }

        let Some((candidate, priority)) = best else {
            return;
        };

        if let Some(active) = self.active {
            if !self.allows_interruption(active, candidate, priority) {
                return;
            }

            tracing::debug!(
                layer = %self.name,
                active = %self.motions[active].core().name,
                candidate = %self.motions[candidate].core().name,
                "Interrupting active motion."
            );
        }

        self.activate_index(candidate, frame);
    }

    fn allows_interruption(&mut self, active: usize, candidate: usize, priority: f32) -> bool {
        let (active_motion, candidate_motion) = if active < candidate {
            let (left, right) = self.motions.split_at_mut(candidate);
            (&mut left[active], &right[0])
        } else {
            let (left, right) = self.motions.split_at_mut(active);
            (&mut right[0], &left[candidate])
        };

        let core = active_motion.core();
        priority > core.priority
            && core.is_interruptible
            && active_motion.test_interruption(candidate_motion.core())
    }

    /// Make `index` the active motion, stopping the current one first.
    pub(crate) fn activate_index(&mut self, index: usize, frame: &mut LayerFrame) -> bool {
        if index >= self.motions.len() {
            tracing::warn!(layer = %self.name, index, "Can not activate unknown motion.");
            return false;
        }

        let previous = self.active.and_then(|active| self.motion_ref(active));
        if let Some(active) = self.active {
            self.deactivate_index(active, frame);
        }

        {
            let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            if !begin_activation(self.motions[index].as_mut(), &mut ctx, previous.as_ref()) {
                tracing::debug!(
                    layer = %self.name,
                    motion = %self.motions[index].core().name,
                    "Motion refused to activate."
                );
                return false;
            }
        }

        self.active = Some(index);
        tracing::debug!(
            layer = %self.name,
            motion = %self.motions[index].core().name,
            "Activated motion."
        );

        let handled = frame.listeners.dispatch(MotionMessage::new(
            MessageKind::Activate,
            self.index,
            self.motion_ref(index),
        ));

        let core = self.motions[index].core();
        if !handled && !core.has_flags(MotionFlags::SILENT_ACTIVATION) && core.activation_phase != 0
        {
            let phase = core.activation_phase;
            let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            ctx.set_phase(phase, true);
        }

        self.write_outputs(frame);

        true
    }

    /// Stop the motion at `index` if it is the active one.
    pub(crate) fn deactivate_index(&mut self, index: usize, frame: &mut LayerFrame) -> bool {
        if self.active != Some(index) {
            return false;
        }

        {
            let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
            end_activation(self.motions[index].as_mut(), &mut ctx);
        }
        self.active = None;

        tracing::debug!(
            layer = %self.name,
            motion = %self.motions[index].core().name,
            "Deactivated motion."
        );

        frame.listeners.dispatch(MotionMessage::new(
            MessageKind::Deactivate,
            self.index,
            self.motion_ref(index),
        ));

        true
    }

    /// Copy the active motion's form and parameter into the snapshot.
    fn write_outputs(&self, frame: &mut LayerFrame) {
        let Some(motion) = self.active_motion() else {
            return;
        };
        let Some(layer) = frame.state.layer_mut(self.index) else {
            return;
        };

        layer.form = motion.core().form;
        layer.parameter = motion.core().parameter;
    }

    /// Request `phase` on this layer from outside any motion.
    pub(crate) fn set_phase(&mut self, frame: &mut LayerFrame, phase: i32, auto_clear: bool) {
        let mut ctx = context(frame, self.index, self.animator_layer, &mut self.auto_clear);
        ctx.set_phase(phase, auto_clear);
    }

    /// Route the animator's IK pass to the active motion.
    pub(crate) fn on_animator_ik(&mut self, animator_layer: usize) {
        if let Some(active) = self.active {
            self.motions[active].on_animator_ik(animator_layer);
        }
    }
}
