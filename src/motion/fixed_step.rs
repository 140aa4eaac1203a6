/// Most fixed steps run in a single tick. Anything beyond that is dropped so a long frame
/// does not snowball into an even longer one.
pub const MAX_CATCH_UP_STEPS: u32 = 5;

/// Accumulates variable frame time and hands it out in fixed-size steps.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    /// Add `delta_time` and return how many steps of `1 / rate` seconds are due.
    pub fn advance(&mut self, delta_time: f32, rate: f32) -> u32 {
        if !(rate > 0.0) {
            return 0;
        }

        let step = 1.0 / rate;
        self.accumulator += delta_time.max(0.0);

        let mut steps = 0;
        while self.accumulator >= step && steps < MAX_CATCH_UP_STEPS {
            self.accumulator -= step;
            steps += 1;
        }

        if self.accumulator >= step {
            tracing::debug!(
                dropped = self.accumulator,
                "Fixed step fell behind, dropping accumulated time"
            );
            self.accumulator = self.accumulator.rem_euclid(step);
        }

        steps
    }

    /// Time accumulated towards the next step.
    #[inline]
    pub fn pending(&self) -> f32 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
