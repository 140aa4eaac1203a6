use glam::Vec3;

/// Number of magnitude samples averaged by [MagnitudeTrend].
pub const TREND_SAMPLES: usize = 10;

/// Differences smaller than this are treated as no change in magnitude.
const TREND_EPSILON: f32 = 1e-4;

/// Frame to frame classification of the input magnitude.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum::Display)]
pub enum Trend {
    #[default]
    Constant,
    Accelerate,
    Decelerate,
}

impl Trend {
    pub fn classify(previous: f32, current: f32) -> Self {
        let delta = current - previous;
        if delta > TREND_EPSILON {
            Self::Accelerate
        } else if delta < -TREND_EPSILON {
            Self::Decelerate
        } else {
            Self::Constant
        }
    }
}

/// Current input magnitude plus a rolling window used to smooth it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MagnitudeTrend {
    value: f32,
    samples: [f32; TREND_SAMPLES],
    count: usize,
    next: usize,
}

impl MagnitudeTrend {
    /// Record a new magnitude for this tick.
    pub fn push(&mut self, value: f32) {
        self.value = value;
        self.samples[self.next] = value;
        self.next = (self.next + 1) % TREND_SAMPLES;
        self.count = (self.count + 1).min(TREND_SAMPLES);
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Average of the recorded samples, `0.0` when nothing was recorded yet.
    pub fn average(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        self.samples[..self.count].iter().sum::<f32>() / self.count as f32
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Holds back magnitude writes for a short time after the input changes direction.
///
/// Single frame spikes (press, release, press) would otherwise make blend trees snap between
/// start and stop animations.
#[derive(Clone, Copy, Debug, Default)]
pub struct MagnitudeGate {
    direction: Trend,
    remaining: f32,
    written: f32,
}

impl MagnitudeGate {
    /// Feed this tick's trend and magnitude, returning the magnitude that should be written.
    pub fn update(&mut self, trend: Trend, value: f32, delay: f32, delta_time: f32) -> f32 {
        if trend != Trend::Constant && trend != self.direction {
            if self.direction != Trend::Constant {
                self.remaining = delay;
            }
            self.direction = trend;
        }

        if self.remaining > 0.0 {
            self.remaining -= delta_time;
            if self.remaining > 0.0 {
                return self.written;
            }
            self.remaining = 0.0;
        }

        self.written = value;
        self.written
    }

    #[inline]
    pub fn is_holding(&self) -> bool {
        self.remaining > 0.0
    }

    #[inline]
    pub fn direction(&self) -> Trend {
        self.direction
    }
}

/// What the controller knows about one animator layer during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnimatorLayerState {
    pub state_id: i32,
    pub state_time: f32,
    pub transition_id: i32,
    pub transition_time: f32,
    /// Values requested for the animator this tick.
    pub phase: i32,
    pub form: i32,
    pub parameter: i32,
    /// Controller time at which a non-zero phase was last requested.
    pub phase_set_time: f32,
}

/// Snapshot of the controller's view of the world for a single tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MotionState {
    pub input_x: f32,
    pub input_y: f32,
    /// World space direction the input points in, zero when there is no input.
    pub input_forward: Vec3,
    pub input_magnitude: MagnitudeTrend,
    /// Signed horizontal angle in degrees between the actor's forward and the input.
    pub input_from_avatar_angle: f32,
    /// Signed horizontal angle in degrees between the camera's forward and the input.
    pub input_from_camera_angle: f32,
    pub trend: Trend,
    pub is_grounded: bool,
    pub stance: i32,
    pub layers: Vec<AnimatorLayerState>,
}

impl MotionState {
    pub fn with_layers(layer_count: usize) -> Self {
        Self {
            layers: vec![AnimatorLayerState::default(); layer_count],
            ..Self::default()
        }
    }

    /// Reset the per-tick input values, keeping the trend window and layer values.
    pub fn clear_input(&mut self) {
        self.input_x = 0.0;
        self.input_y = 0.0;
        self.input_forward = Vec3::ZERO;
        self.input_from_avatar_angle = 0.0;
        self.input_from_camera_angle = 0.0;
    }

    #[inline]
    pub fn layer(&self, index: usize) -> Option<&AnimatorLayerState> {
        self.layers.get(index)
    }

    #[inline]
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut AnimatorLayerState> {
        self.layers.get_mut(index)
    }
}
