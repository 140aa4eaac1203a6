//! Fakes shared by the unit tests.

use std::sync::{Arc, Mutex};

use ahash::HashMap;
use glam::{Quat, Vec3};

use crate::motion::{
    motion::{Motion, MotionContext, MotionCore},
    services::{
        ActorDriver, ActorState, Animator, AnimatorStateInfo, AnimatorTransitionInfo, RootMotion,
    },
};

/// Route log output through the test harness so it shows up for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
pub struct ActorLog {
    pub state: ActorState,
    pub moves: Vec<Vec3>,
    pub rotations: Vec<(Quat, Quat)>,
}

/// Actor that applies every move to its own transform and records it.
#[derive(Clone, Debug, Default)]
pub struct FakeActor {
    log: Arc<Mutex<ActorLog>>,
}

impl FakeActor {
    pub fn moves(&self) -> Vec<Vec3> {
        self.log.lock().unwrap().moves.clone()
    }

    pub fn rotations(&self) -> Vec<(Quat, Quat)> {
        self.log.lock().unwrap().rotations.clone()
    }

    pub fn state_snapshot(&self) -> ActorState {
        self.log.lock().unwrap().state
    }

    pub fn set_grounded(&self, is_grounded: bool) {
        self.log.lock().unwrap().state.is_grounded = is_grounded;
    }

    pub fn set_velocity(&self, velocity: Vec3) {
        self.log.lock().unwrap().state.velocity = velocity;
    }

    pub fn teleport(&self, position: Vec3) {
        self.log.lock().unwrap().state.transform.translation = position;
    }

    pub fn turn_to(&self, rotation: Quat) {
        self.log.lock().unwrap().state.transform.rotation = rotation;
    }
}

impl ActorDriver for FakeActor {
    fn state(&self) -> ActorState {
        self.state_snapshot()
    }

    fn move_by(&mut self, movement: Vec3) {
        let mut log = self.log.lock().unwrap();
        log.state.transform.translation += movement;
        log.moves.push(movement);
    }

    fn rotate(&mut self, yaw: Quat, tilt: Quat) {
        let mut log = self.log.lock().unwrap();
        log.state.transform.rotation = (yaw * log.state.transform.rotation).normalize();
        log.rotations.push((yaw, tilt));
    }

    fn set_position(&mut self, position: Vec3) {
        self.teleport(position);
    }

    fn set_rotation(&mut self, rotation: Quat) {
        self.turn_to(rotation);
    }
}

#[derive(Debug, Default)]
struct AnimatorData {
    states: Vec<AnimatorStateInfo>,
    transitions: Vec<AnimatorTransitionInfo>,
    root_motion: RootMotion,
    integers: HashMap<String, i32>,
    floats: HashMap<String, f32>,
    bools: HashMap<String, bool>,
    writes: usize,
}

/// Animator whose states are set by the test and whose parameter writes can be inspected.
#[derive(Clone, Debug, Default)]
pub struct FakeAnimator {
    data: Arc<Mutex<AnimatorData>>,
}

impl FakeAnimator {
    pub fn with_layers(layer_count: usize) -> Self {
        let animator = Self::default();
        {
            let mut data = animator.data.lock().unwrap();
            data.states = vec![AnimatorStateInfo::default(); layer_count];
            data.transitions = vec![AnimatorTransitionInfo::default(); layer_count];
        }
        animator
    }

    pub fn set_state(&self, layer: usize, id: i32, normalized_time: f32) {
        self.data.lock().unwrap().states[layer] = AnimatorStateInfo {
            id,
            normalized_time,
        };
    }

    pub fn set_transition(&self, layer: usize, id: i32, normalized_time: f32) {
        self.data.lock().unwrap().transitions[layer] = AnimatorTransitionInfo {
            id,
            normalized_time,
        };
    }

    /// Root motion returned by the next `root_motion` call.
    pub fn set_root_motion(&self, root_motion: RootMotion) {
        self.data.lock().unwrap().root_motion = root_motion;
    }

    pub fn integer(&self, name: &str) -> Option<i32> {
        self.data.lock().unwrap().integers.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        self.data.lock().unwrap().floats.get(name).copied()
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.data.lock().unwrap().bools.get(name).copied()
    }

    /// Number of parameter writes so far.
    pub fn write_count(&self) -> usize {
        self.data.lock().unwrap().writes
    }
}

impl Animator for FakeAnimator {
    fn layer_count(&self) -> usize {
        self.data.lock().unwrap().states.len()
    }

    fn current_state(&self, layer: usize) -> AnimatorStateInfo {
        let data = self.data.lock().unwrap();
        data.states.get(layer).copied().unwrap_or_default()
    }

    fn current_transition(&self, layer: usize) -> AnimatorTransitionInfo {
        let data = self.data.lock().unwrap();
        data.transitions.get(layer).copied().unwrap_or_default()
    }

    fn root_motion(&mut self) -> RootMotion {
        std::mem::take(&mut self.data.lock().unwrap().root_motion)
    }

    fn set_integer(&mut self, name: &str, value: i32) {
        let mut data = self.data.lock().unwrap();
        data.writes += 1;
        data.integers.insert(name.to_owned(), value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        let mut data = self.data.lock().unwrap();
        data.writes += 1;
        data.floats.insert(name.to_owned(), value);
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        let mut data = self.data.lock().unwrap();
        data.writes += 1;
        data.bools.insert(name.to_owned(), value);
    }

    fn string_to_hash(&self, name: &str) -> i32 {
        ahash::RandomState::with_seeds(1, 2, 3, 4).hash_one(name) as i32
    }
}

/// Knobs a test turns to steer a [ScriptedMotion], plus what the motion observed.
#[derive(Debug)]
pub struct Script {
    pub wants_start: bool,
    pub keep_running: bool,
    pub allow_interruption: bool,
    /// Animator states that count as the motion's own.
    pub motion_states: Vec<i32>,
    /// Copied into the motion's parameter output every update.
    pub parameter: i32,
    pub state_changes: Vec<(i32, i32)>,
    pub ik_layers: Vec<usize>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            wants_start: false,
            keep_running: true,
            allow_interruption: true,
            motion_states: Vec::new(),
            parameter: 0,
            state_changes: Vec::new(),
            ik_layers: Vec::new(),
        }
    }
}

pub struct ScriptedMotion {
    core: MotionCore,
    script: Arc<Mutex<Script>>,
}

impl ScriptedMotion {
    pub fn new(name: &str, priority: f32) -> (Self, Arc<Mutex<Script>>) {
        let script = Arc::new(Mutex::new(Script::default()));
        let motion = Self {
            core: MotionCore::new(name).with_priority(priority),
            script: Arc::clone(&script),
        };
        (motion, script)
    }
}

impl Motion for ScriptedMotion {
    fn core(&self) -> &MotionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut MotionCore {
        &mut self.core
    }

    fn kind(&self) -> &'static str {
        "Scripted"
    }

    fn test_activate(&mut self, _ctx: &MotionContext) -> bool {
        self.script.lock().unwrap().wants_start
    }

    fn test_update(&mut self, _ctx: &MotionContext) -> bool {
        self.script.lock().unwrap().keep_running
    }

    fn test_interruption(&mut self, _candidate: &MotionCore) -> bool {
        self.script.lock().unwrap().allow_interruption
    }

    fn update(&mut self, _ctx: &mut MotionContext, _delta_time: f32, _update_index: u32) {
        self.core.parameter = self.script.lock().unwrap().parameter;
    }

    fn is_in_motion_state(&self, state_id: i32, _transition_id: i32) -> bool {
        self.script.lock().unwrap().motion_states.contains(&state_id)
    }

    fn on_animator_state_change(&mut self, _ctx: &mut MotionContext, previous: i32, state: i32) {
        self.script
            .lock()
            .unwrap()
            .state_changes
            .push((previous, state));
    }

    fn on_animator_ik(&mut self, animator_layer: usize) {
        self.script.lock().unwrap().ik_layers.push(animator_layer);
    }
}
